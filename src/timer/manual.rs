use super::{TimerFacility, TimerHandle};
use std::time::Duration;

/// Virtual clock. Time only moves when `advance` is called.
#[derive(Debug, Default)]
pub struct ManualTimer {
    now: Duration,
    next_id: u64,
    pending: Vec<(TimerHandle, Duration)>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of scheduled handles that have neither expired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock forward and returns the handles that expired, earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerHandle> {
        self.now += by;
        let now = self.now;

        let mut expired: Vec<(TimerHandle, Duration)> = Vec::new();
        self.pending.retain(|&(handle, deadline)| {
            if deadline <= now {
                expired.push((handle, deadline));
                false
            } else {
                true
            }
        });
        expired.sort_by_key(|&(handle, deadline)| (deadline, handle));
        expired.into_iter().map(|(handle, _)| handle).collect()
    }
}

impl TimerFacility for ManualTimer {
    fn schedule(&mut self, after: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        self.pending.push((handle, self.now + after));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|&(pending, _)| pending != handle);
    }
}
