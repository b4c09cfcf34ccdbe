use crate::config::Config;
use crate::input::InputSource;
use crate::matcher::{EventKind, FeedResult, Notification, SequenceMatcher};
use crate::sequence::Sequence;
use crate::timer::{TimerHandle, TokioTimer};
use anyhow::Result;
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::mpsc;

/// What a single `Watcher::step` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A key arrived. `None` when the matcher ignored it.
    Key(Option<FeedResult>),
    /// A timer expired. `false` when it had already been superseded.
    Expired(bool),
    /// The input source closed and the watcher stopped.
    Closed,
    /// The watcher is not started.
    Stopped,
}

#[derive(Debug, Default)]
pub struct WatcherBuilder {
    config: Option<Config>,
    sequence: Option<Sequence>,
    timeout: Option<Duration>,
}

impl WatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Takes precedence over the config.
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Takes precedence over the config.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build<S: InputSource>(self, source: S) -> Watcher<S> {
        let config = self.config.unwrap_or_default();
        let timeout = self.timeout.unwrap_or(config.timeout());
        let sequence = self.sequence.unwrap_or(config.sequence);

        let mut watcher = Watcher::new(source);
        watcher.matcher.set_sequence(sequence);
        watcher.matcher.set_timeout(timeout);
        watcher
    }
}

/// Feeds one matcher from one input source, and its own timer expiries, on
/// the current task.
pub struct Watcher<S: InputSource> {
    source: S,
    attached: bool,
    matcher: SequenceMatcher<TokioTimer, S::Raw>,
    expired: mpsc::UnboundedReceiver<TimerHandle>,
}

impl<S: InputSource> Watcher<S> {
    pub fn new(source: S) -> Self {
        let (timer, expired) = TokioTimer::new();
        Self {
            source,
            attached: false,
            matcher: SequenceMatcher::new(timer),
            expired,
        }
    }

    pub fn builder() -> WatcherBuilder {
        WatcherBuilder::new()
    }

    pub fn matcher(&self) -> &SequenceMatcher<TokioTimer, S::Raw> {
        &self.matcher
    }

    pub fn matcher_mut(&mut self) -> &mut SequenceMatcher<TokioTimer, S::Raw> {
        &mut self.matcher
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: FnMut(&Notification<S::Raw>) + 'static,
    {
        self.matcher.on(kind, callback);
    }

    pub fn off(&mut self, kind: EventKind) -> bool {
        self.matcher.off(kind)
    }

    /// Attaches the source (once) and arms a fresh attempt.
    pub fn start(&mut self) -> Result<()> {
        if !self.attached {
            self.source.attach()?;
            self.attached = true;
        }
        self.matcher.start();
        Ok(())
    }

    /// Disarms the matcher and detaches the source. Safe to call twice.
    pub fn stop(&mut self) -> Result<()> {
        self.matcher.stop();
        if self.attached {
            self.attached = false;
            self.source.detach()?;
        }
        Ok(())
    }

    /// Waits for the next key or timer expiry and hands it to the matcher.
    pub async fn step(&mut self) -> Result<Step> {
        if !self.matcher.is_armed() {
            return Ok(Step::Stopped);
        }

        tokio::select! {
            key = self.source.next_key() => match key? {
                Some(input) => Ok(Step::Key(self.matcher.feed(input))),
                None => {
                    debug!("input source closed");
                    self.stop()?;
                    Ok(Step::Closed)
                }
            },
            Some(handle) = self.expired.recv() => {
                Ok(Step::Expired(self.matcher.fire(handle)))
            }
        }
    }

    /// Steps until the source closes or the watcher is stopped.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.step().await? {
                Step::Closed | Step::Stopped => return Ok(()),
                Step::Key(_) | Step::Expired(_) => {}
            }
        }
    }
}

impl<S: InputSource> Drop for Watcher<S> {
    fn drop(&mut self) {
        if self.attached {
            if let Err(e) = self.source.detach() {
                warn!("Failed to detach input source: {e}");
            }
        }
    }
}
