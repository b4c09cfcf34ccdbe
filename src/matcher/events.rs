use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Input,
    Success,
    Timeout,
    Stop,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Start,
        EventKind::Input,
        EventKind::Success,
        EventKind::Timeout,
        EventKind::Stop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Input => "input",
            EventKind::Success => "success",
            EventKind::Timeout => "timeout",
            EventKind::Stop => "stop",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow!("Unknown event type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartPayload {
    pub position: isize,
}

/// `position` is the index of the last matched key, -1 when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct InputPayload<E> {
    pub key: String,
    #[serde(rename = "match")]
    pub matched: bool,
    pub position: isize,
    #[serde(skip)]
    pub raw: E,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessPayload {
    pub last_key: String,
    pub last_position: isize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutPayload {
    pub last_key: String,
    pub last_position: isize,
    pub last_match: bool,
}

/// Everything a matcher reports to its listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case", bound(serialize = ""))]
pub enum Notification<E> {
    Start(StartPayload),
    Input(InputPayload<E>),
    Success(SuccessPayload),
    Timeout(TimeoutPayload),
    Stop,
}

impl<E> Notification<E> {
    pub fn kind(&self) -> EventKind {
        match self {
            Notification::Start(_) => EventKind::Start,
            Notification::Input(_) => EventKind::Input,
            Notification::Success(_) => EventKind::Success,
            Notification::Timeout(_) => EventKind::Timeout,
            Notification::Stop => EventKind::Stop,
        }
    }
}

impl<E> fmt::Display for Notification<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Start(payload) => write!(f, "start position={}", payload.position),
            Notification::Input(payload) => write!(
                f,
                "input key={} match={} position={}",
                payload.key, payload.matched, payload.position
            ),
            Notification::Success(payload) => write!(
                f,
                "success last_key={} last_position={}",
                payload.last_key, payload.last_position
            ),
            Notification::Timeout(payload) => write!(
                f,
                "timeout last_key={} last_position={} last_match={}",
                payload.last_key, payload.last_position, payload.last_match
            ),
            Notification::Stop => f.write_str("stop"),
        }
    }
}

pub type Listener<E> = Box<dyn FnMut(&Notification<E>)>;

/// At most one callback per event kind. Registering again replaces it.
pub struct Listeners<E> {
    callbacks: HashMap<EventKind, Listener<E>>,
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: FnMut(&Notification<E>) + 'static,
    {
        self.callbacks.insert(kind, Box::new(callback));
    }

    /// Returns whether a callback was registered.
    pub fn off(&mut self, kind: EventKind) -> bool {
        self.callbacks.remove(&kind).is_some()
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.callbacks.contains_key(&kind)
    }

    pub fn emit(&mut self, notification: &Notification<E>) {
        if let Some(callback) = self.callbacks.get_mut(&notification.kind()) {
            callback(notification);
        }
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.callbacks.keys().map(EventKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("Listeners").field("registered", &kinds).finish()
    }
}
