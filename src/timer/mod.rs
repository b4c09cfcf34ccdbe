mod manual;
mod tokio_timer;

pub use self::manual::ManualTimer;
pub use self::tokio_timer::TokioTimer;

use std::fmt;
use std::time::Duration;

/// Identifies one scheduled single-shot expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Schedules single-shot expiries.
///
/// Expiry is not a callback: the owner of the facility is told which handle
/// expired and hands it back to the matcher (`SequenceMatcher::fire`), so the
/// reset runs on the same task that processes key input.
pub trait TimerFacility {
    fn schedule(&mut self, after: Duration) -> TimerHandle;

    /// Cancelling an unknown or already expired handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}
