mod events;

pub use events::{
    EventKind, InputPayload, Listener, Listeners, Notification, StartPayload, SuccessPayload,
    TimeoutPayload,
};

use crate::input::KeyInput;
use crate::sequence::Sequence;
use crate::timer::{ManualTimer, TimerFacility, TimerHandle};
use log::{debug, trace};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(800);

/// Bare modifier presses are not sequence steps.
pub const MODIFIER_KEYS: [&str; 2] = ["Shift", "Alt"];

/// Outcome of one key evaluated by `SequenceMatcher::feed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedResult {
    pub matched: bool,
    /// Index of the last matched key, -1 when nothing matched.
    pub position: isize,
    pub completed: bool,
}

/// State of one armed match attempt.
#[derive(Debug)]
struct Attempt {
    /// Snapshot taken when the attempt was armed
    sequence: Sequence,
    position: usize,
    last_match: bool,
    last_key: String,
    timer: Option<TimerHandle>,
}

impl Attempt {
    fn new(sequence: Sequence) -> Self {
        Self {
            sequence,
            position: 0,
            last_match: false,
            last_key: String::new(),
            timer: None,
        }
    }

    fn reported_position(&self) -> isize {
        self.position as isize - 1
    }
}

/// Watches a stream of key identifiers for one sequence.
///
/// Every key (re)schedules a reset on the timer facility. If the reset expires
/// before the next key arrives, progress goes back to the first key and a
/// `timeout` is emitted. A completed sequence emits `success` and arms a fresh
/// attempt right away.
///
/// `E` is the raw event type passed through untouched to `input` listeners.
#[derive(Debug)]
pub struct SequenceMatcher<T, E = ()> {
    sequence: Sequence,
    timeout: Duration,
    attempt: Option<Attempt>,
    timer: T,
    listeners: Listeners<E>,
}

impl<T: TimerFacility, E> SequenceMatcher<T, E> {
    /// Disarmed matcher for the Konami code with an 800ms timeout.
    pub fn new(timer: T) -> Self {
        Self {
            sequence: Sequence::default(),
            timeout: DEFAULT_TIMEOUT,
            attempt: None,
            timer,
            listeners: Listeners::new(),
        }
    }

    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.set_sequence(sequence);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.set_timeout(timeout);
        self
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_armed(&self) -> bool {
        self.attempt.is_some()
    }

    /// Number of keys matched so far in the current attempt.
    pub fn position(&self) -> usize {
        self.attempt.as_ref().map_or(0, |attempt| attempt.position)
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.attempt.as_ref().and_then(|attempt| attempt.timer)
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn listeners_mut(&mut self) -> &mut Listeners<E> {
        &mut self.listeners
    }

    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: FnMut(&Notification<E>) + 'static,
    {
        self.listeners.on(kind, callback);
    }

    pub fn off(&mut self, kind: EventKind) -> bool {
        self.listeners.off(kind)
    }

    /// Empty sequences are ignored. Takes effect from the next attempt.
    ///
    /// `Shift` and `Alt` never reach the comparison, so a sequence containing
    /// them cannot complete.
    pub fn set_sequence(&mut self, sequence: Sequence) {
        if sequence.is_empty() {
            debug!("ignoring empty sequence");
            return;
        }
        self.sequence = sequence;
    }

    /// A zero duration is ignored. Takes effect from the next key.
    pub fn set_timeout(&mut self, timeout: Duration) {
        if timeout.is_zero() {
            debug!("ignoring zero timeout");
            return;
        }
        self.timeout = timeout;
    }

    /// Arms a fresh attempt, discarding any progress and pending reset.
    pub fn start(&mut self) {
        if let Some(handle) = self.attempt.take().and_then(|attempt| attempt.timer) {
            self.timer.cancel(handle);
        }
        self.attempt = Some(Attempt::new(self.sequence.clone()));
        debug!("armed for {}", self.sequence);
        self.listeners
            .emit(&Notification::Start(StartPayload { position: 0 }));
    }

    /// Disarms the matcher. Does nothing when already disarmed.
    pub fn stop(&mut self) {
        let Some(attempt) = self.attempt.take() else {
            return;
        };
        if let Some(handle) = attempt.timer {
            self.timer.cancel(handle);
        }
        debug!("disarmed");
        self.listeners.emit(&Notification::Stop);
    }

    /// Evaluates one key. Returns `None` when the key was ignored, either
    /// because the matcher is disarmed or because it is a bare modifier.
    pub fn feed(&mut self, input: KeyInput<E>) -> Option<FeedResult> {
        if MODIFIER_KEYS.contains(&input.key.as_str()) {
            trace!("skipping modifier {}", input.key);
            return None;
        }
        let Some(attempt) = self.attempt.as_mut() else {
            trace!("disarmed, dropping {}", input.key);
            return None;
        };

        if let Some(handle) = attempt.timer.take() {
            self.timer.cancel(handle);
        }
        attempt.timer = Some(self.timer.schedule(self.timeout));

        let expected = attempt.sequence.get(attempt.position);
        let matched = expected == Some(input.key.as_str());
        if matched {
            attempt.position += 1;
        } else {
            attempt.position = 0;
        }
        attempt.last_match = matched;
        attempt.last_key.clone_from(&input.key);

        let position = attempt.reported_position();
        let completed = attempt.position == attempt.sequence.len();
        trace!(
            "key {} expected {:?} matched={} position={}",
            input.key, expected, matched, position
        );

        let KeyInput { key, raw } = input;
        self.listeners.emit(&Notification::Input(InputPayload {
            key: key.clone(),
            matched,
            position,
            raw,
        }));

        if completed {
            debug!("sequence completed");
            self.listeners.emit(&Notification::Success(SuccessPayload {
                last_key: key,
                last_position: position,
            }));
            self.start();
        }

        Some(FeedResult {
            matched,
            position,
            completed,
        })
    }

    /// Delivers an expired timer. Returns whether it reset the attempt; handles
    /// that were superseded by a later key are ignored.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        let Some(attempt) = self.attempt.as_mut() else {
            return false;
        };
        if attempt.timer != Some(handle) {
            trace!("stale timer {handle}");
            return false;
        }
        attempt.timer = None;
        self.timer.cancel(handle);

        let payload = TimeoutPayload {
            last_key: attempt.last_key.clone(),
            last_position: attempt.reported_position(),
            last_match: attempt.last_match,
        };
        attempt.position = 0;
        debug!("timed out after {}", payload.last_key);
        self.listeners.emit(&Notification::Timeout(payload));
        true
    }
}

impl<E> SequenceMatcher<ManualTimer, E> {
    /// Moves the virtual clock and fires whatever expired.
    pub fn advance(&mut self, by: Duration) -> usize {
        let expired = self.timer.advance(by);
        expired
            .into_iter()
            .filter(|&handle| self.fire(handle))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<Notification<()>>>>;

    fn recorded() -> (SequenceMatcher<ManualTimer>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut matcher = SequenceMatcher::new(ManualTimer::new());
        for kind in EventKind::ALL {
            let log = log.clone();
            matcher.on(kind, move |notification| {
                log.borrow_mut().push(notification.clone())
            });
        }
        (matcher, log)
    }

    fn feed_all(matcher: &mut SequenceMatcher<ManualTimer>, keys: &[&str]) -> Vec<FeedResult> {
        keys.iter()
            .filter_map(|&key| {
                let result = matcher.feed(key.into());
                matcher.advance(Duration::from_millis(100));
                result
            })
            .collect()
    }

    fn input(key: &str, matched: bool, position: isize) -> Notification<()> {
        Notification::Input(InputPayload {
            key: key.to_string(),
            matched,
            position,
            raw: (),
        })
    }

    fn start() -> Notification<()> {
        Notification::Start(StartPayload { position: 0 })
    }

    #[test]
    fn test_konami_code_completes() {
        let (mut matcher, log) = recorded();
        matcher.start();

        let results = feed_all(&mut matcher, &crate::sequence::KONAMI_CODE);
        assert_eq!(results.len(), 10);
        assert!(results[..9].iter().all(|result| result.matched && !result.completed));
        assert_eq!(
            results[9],
            FeedResult {
                matched: true,
                position: 9,
                completed: true
            }
        );

        let log = log.borrow();
        assert_eq!(log.len(), 13);
        assert_eq!(log[0], start());
        assert_eq!(log[10], input("a", true, 9));
        assert_eq!(
            log[11],
            Notification::Success(SuccessPayload {
                last_key: "a".to_string(),
                last_position: 9
            })
        );
        assert_eq!(log[12], start());
    }

    #[test]
    fn test_rearms_after_success() {
        let (mut matcher, _log) = recorded();
        matcher.start();
        feed_all(&mut matcher, &crate::sequence::KONAMI_CODE);

        assert!(matcher.is_armed());
        assert_eq!(matcher.position(), 0);
        assert_eq!(matcher.pending_timer(), None);
        assert_eq!(matcher.timer().pending(), 0);

        let result = matcher.feed("ArrowUp".into()).unwrap();
        assert!(result.matched);
        assert_eq!(result.position, 0);
    }

    #[test]
    fn test_wrong_key_resets() {
        let (mut matcher, log) = recorded();
        matcher.start();

        let results = feed_all(&mut matcher, &["ArrowUp", "ArrowUp", "ArrowLeft"]);
        assert_eq!(
            results[2],
            FeedResult {
                matched: false,
                position: -1,
                completed: false
            }
        );
        assert_eq!(log.borrow()[3], input("ArrowLeft", false, -1));
        assert_eq!(matcher.position(), 0);
    }

    #[test]
    fn test_wrong_key_equal_to_first_key_still_resets() {
        let (mut matcher, log) = recorded();
        matcher.start();

        let results = feed_all(&mut matcher, &["ArrowUp", "ArrowUp", "ArrowUp"]);
        assert_eq!(
            results[2],
            FeedResult {
                matched: false,
                position: -1,
                completed: false
            }
        );
        assert_eq!(log.borrow()[3], input("ArrowUp", false, -1));
        assert_eq!(matcher.position(), 0);
    }

    #[test]
    fn test_timeout_after_mismatch() {
        let (mut matcher, log) = recorded();
        matcher.start();

        let result = matcher.feed("q".into()).unwrap();
        assert!(!result.matched);
        assert_eq!(matcher.advance(Duration::from_millis(900)), 1);
        assert_eq!(
            log.borrow().last(),
            Some(&Notification::Timeout(TimeoutPayload {
                last_key: "q".to_string(),
                last_position: -1,
                last_match: false
            }))
        );
    }

    #[test]
    fn test_timeout_resets_progress() {
        let (mut matcher, log) = recorded();
        matcher.start();

        matcher.feed("ArrowUp".into());
        assert_eq!(matcher.advance(Duration::from_millis(900)), 1);
        assert_eq!(
            log.borrow().last(),
            Some(&Notification::Timeout(TimeoutPayload {
                last_key: "ArrowUp".to_string(),
                last_position: 0,
                last_match: true
            }))
        );

        // Second ArrowUp is compared with the first step again
        let result = matcher.feed("ArrowUp".into()).unwrap();
        assert_eq!(result.position, 0);
        assert_eq!(matcher.position(), 1);
    }

    #[test]
    fn test_timeout_fires_once() {
        let (mut matcher, log) = recorded();
        matcher.start();
        matcher.feed("ArrowUp".into());
        matcher.feed("ArrowUp".into());

        assert_eq!(matcher.advance(Duration::from_millis(800)), 1);
        assert_eq!(matcher.advance(Duration::from_secs(5)), 0);
        let timeouts = log
            .borrow()
            .iter()
            .filter(|notification| notification.kind() == EventKind::Timeout)
            .count();
        assert_eq!(timeouts, 1);
        assert_eq!(matcher.position(), 0);
    }

    #[test]
    fn test_key_before_deadline_supersedes_timer() {
        let (mut matcher, log) = recorded();
        matcher.start();

        matcher.feed("ArrowUp".into());
        let first = matcher.pending_timer().unwrap();
        matcher.advance(Duration::from_millis(799));
        matcher.feed("ArrowUp".into());
        let second = matcher.pending_timer().unwrap();

        assert_ne!(first, second);
        assert_eq!(matcher.timer().pending(), 1);
        assert!(!matcher.fire(first));
        assert_eq!(matcher.advance(Duration::from_millis(798)), 0);
        assert_eq!(matcher.position(), 2);
        assert!(log
            .borrow()
            .iter()
            .all(|notification| notification.kind() != EventKind::Timeout));
    }

    #[test]
    fn test_stop_ignores_input_until_started() {
        let (mut matcher, log) = recorded();
        matcher.start();
        matcher.feed("ArrowUp".into());
        matcher.stop();

        assert!(!matcher.is_armed());
        assert_eq!(matcher.timer().pending(), 0);
        assert_eq!(log.borrow().last(), Some(&Notification::Stop));

        let emitted = log.borrow().len();
        assert_eq!(matcher.feed("ArrowUp".into()), None);
        matcher.stop();
        matcher.advance(Duration::from_secs(1));
        assert_eq!(log.borrow().len(), emitted);
        assert_eq!(matcher.position(), 0);

        matcher.start();
        assert!(matcher.feed("ArrowUp".into()).is_some());
    }

    #[test]
    fn test_start_while_armed_discards_progress() {
        let (mut matcher, log) = recorded();
        matcher.start();
        feed_all(&mut matcher, &["ArrowUp", "ArrowUp", "ArrowDown"]);
        assert_eq!(matcher.position(), 3);

        matcher.start();
        assert_eq!(matcher.position(), 0);
        assert_eq!(matcher.timer().pending(), 0);
        assert_eq!(log.borrow().last(), Some(&start()));
    }

    #[test]
    fn test_modifiers_are_skipped() {
        let (mut matcher, log) = recorded();
        matcher.start();
        matcher.feed("ArrowUp".into());
        let emitted = log.borrow().len();

        assert_eq!(matcher.feed("Shift".into()), None);
        assert_eq!(matcher.feed("Alt".into()), None);
        assert_eq!(log.borrow().len(), emitted);
        assert_eq!(matcher.position(), 1);
    }

    #[test]
    fn test_control_and_meta_are_sequence_steps() {
        let (mut matcher, _log) = recorded();
        matcher.set_sequence(Sequence::new(["Control", "Meta"]));
        matcher.start();

        let results = feed_all(&mut matcher, &["Control", "Meta"]);
        assert_eq!(results.len(), 2);
        assert!(results[1].completed);
    }

    #[test]
    fn test_invalid_configuration_is_ignored() {
        let mut matcher: SequenceMatcher<ManualTimer> = SequenceMatcher::new(ManualTimer::new())
            .with_sequence(Sequence::new(Vec::<String>::new()))
            .with_timeout(Duration::ZERO);

        assert_eq!(matcher.sequence(), &Sequence::konami());
        assert_eq!(matcher.timeout(), DEFAULT_TIMEOUT);

        matcher.set_timeout(Duration::from_millis(300));
        assert_eq!(matcher.timeout(), Duration::from_millis(300));
    }

    #[test]
    fn test_new_sequence_applies_to_next_attempt() {
        let (mut matcher, _log) = recorded();
        matcher.start();
        matcher.feed("ArrowUp".into());
        matcher.set_sequence(Sequence::new(["x", "y"]));

        // Current attempt still follows the old sequence
        assert!(matcher.feed("ArrowUp".into()).unwrap().matched);
        assert_eq!(matcher.position(), 2);

        matcher.start();
        feed_all(&mut matcher, &["x"]);
        assert!(feed_all(&mut matcher, &["y"])[0].completed);
    }

    #[test]
    fn test_new_timeout_applies_to_next_key() {
        let (mut matcher, _log) = recorded();
        matcher.start();
        matcher.set_timeout(Duration::from_millis(300));
        matcher.feed("ArrowUp".into());

        assert_eq!(matcher.advance(Duration::from_millis(300)), 1);
    }

    #[test]
    fn test_single_key_sequence() {
        let (mut matcher, log) = recorded();
        matcher.set_sequence(Sequence::new(["Enter"]));
        matcher.start();

        let result = matcher.feed("Enter".into()).unwrap();
        assert!(result.completed);
        assert_eq!(result.position, 0);
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn test_raw_event_passes_through() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut matcher: SequenceMatcher<ManualTimer, u32> =
            SequenceMatcher::new(ManualTimer::new());
        let sink = seen.clone();
        matcher.on(EventKind::Input, move |notification| {
            if let Notification::Input(payload) = notification {
                sink.borrow_mut().push(payload.raw);
            }
        });
        matcher.start();

        matcher.feed(KeyInput::new("ArrowUp", 7));
        matcher.feed(KeyInput::new("q", 8));
        assert_eq!(*seen.borrow(), vec![7, 8]);
    }
}
