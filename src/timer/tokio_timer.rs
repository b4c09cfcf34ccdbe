use super::{TimerFacility, TimerHandle};
use log::trace;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Timer backed by tokio tasks. Expired handles are posted on the channel
/// returned by `new`.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioTimer {
    next_id: u64,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
    expired_tx: mpsc::UnboundedSender<TimerHandle>,
}

impl TokioTimer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerHandle>) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let timer = Self {
            next_id: 0,
            tasks: HashMap::new(),
            expired_tx,
        };
        (timer, expired_rx)
    }
}

impl TimerFacility for TokioTimer {
    fn schedule(&mut self, after: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        let expired_tx = self.expired_tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Receiver gone means the watcher was dropped
            let _ = expired_tx.send(handle);
        });
        self.tasks.insert(handle, task);
        trace!("timer {handle} scheduled in {after:?}");
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
            trace!("timer {handle} cancelled");
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
