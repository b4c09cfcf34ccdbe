use super::{InputSource, KeyEncoder, KeyInput};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use futures::StreamExt;
use log::{debug, warn};
use std::io::stdout;

// Handle key events from the terminal
pub struct CrosstermSource {
    event_stream: Option<EventStream>,
    enhanced: bool,
}

impl CrosstermSource {
    pub fn new() -> Self {
        Self {
            event_stream: None,
            enhanced: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.event_stream.is_some()
    }

    /// `Esc` and `Ctrl-C` close the source.
    fn is_exit(key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => true,
            KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        }
    }
}

impl Default for CrosstermSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for CrosstermSource {
    type Raw = KeyEvent;

    fn attach(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;

        // Without the enhancement flags, bare modifier presses are never reported
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            )?;
            self.enhanced = true;
        }

        self.event_stream = Some(EventStream::new());
        debug!("terminal source attached (enhanced={})", self.enhanced);
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        self.event_stream = None;
        if self.enhanced {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
            self.enhanced = false;
        }
        terminal::disable_raw_mode()?;
        debug!("terminal source detached");
        Ok(())
    }

    async fn next_key(&mut self) -> Result<Option<KeyInput<KeyEvent>>> {
        let Some(event_stream) = self.event_stream.as_mut() else {
            return Ok(None);
        };

        loop {
            let key = match event_stream.next().await {
                Some(Ok(Event::Key(key))) => key,
                Some(Ok(_)) => continue, // Ignore other events
                Some(Err(e)) => return Err(anyhow!("Error reading event: {}", e)),
                None => return Ok(None), // Stream closed
            };

            if key.kind == KeyEventKind::Release {
                continue;
            }
            if Self::is_exit(&key) {
                return Ok(None);
            }

            match key.encode() {
                Ok(identifier) => return Ok(Some(KeyInput::new(identifier, key))),
                Err(e) => warn!("{e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_keys() {
        assert!(CrosstermSource::is_exit(&KeyEvent::new(
            KeyCode::Esc,
            KeyModifiers::NONE
        )));
        assert!(CrosstermSource::is_exit(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!CrosstermSource::is_exit(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::NONE
        )));
    }

    #[tokio::test]
    async fn test_detached_source_is_closed() {
        let mut source = CrosstermSource::new();
        assert!(!source.is_attached());
        assert!(source.next_key().await.unwrap().is_none());
    }
}
