//! Watch keyboard input for a secret key sequence, such as the Konami code.
//!
//! [`SequenceMatcher`] is the state machine: it consumes one key identifier at
//! a time and reports progress through listeners. Each key must arrive within
//! the timeout of the previous one, otherwise progress is reset. [`Watcher`]
//! wires a matcher to an [`InputSource`] and a tokio timer.

pub mod config;
pub mod input;
pub mod matcher;
pub mod sequence;
pub mod timer;
pub mod watcher;

pub use config::Config;
pub use input::{InputSource, KeyInput};
pub use matcher::{EventKind, FeedResult, Notification, SequenceMatcher};
pub use sequence::{KONAMI_CODE, Sequence};
pub use watcher::{Step, Watcher, WatcherBuilder};
