mod events;
pub mod keys;
mod simulated;

pub use events::CrosstermSource;
pub use keys::KeyEncoder;
pub use simulated::SimulatedSource;

use anyhow::Result;
use async_trait::async_trait;

/// One key delivered by an input source, with the event it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput<E = ()> {
    pub key: String,
    pub raw: E,
}

impl<E> KeyInput<E> {
    pub fn new(key: impl Into<String>, raw: E) -> Self {
        Self {
            key: key.into(),
            raw,
        }
    }
}

impl From<&str> for KeyInput {
    fn from(key: &str) -> Self {
        Self::new(key, ())
    }
}

impl From<String> for KeyInput {
    fn from(key: String) -> Self {
        Self::new(key, ())
    }
}

/// Delivers discrete key events.
///
/// `next_key` must be cancel safe: the watcher races it against the timer.
#[async_trait]
pub trait InputSource: Send {
    type Raw: Send;

    /// Starts listening.
    fn attach(&mut self) -> Result<()>;

    /// Stops listening. Called at most once per `attach`.
    fn detach(&mut self) -> Result<()>;

    /// Waits for the next key. `None` means the source is closed.
    async fn next_key(&mut self) -> Result<Option<KeyInput<Self::Raw>>>;
}
