use anyhow::{Result, anyhow};
use crossterm::event::{KeyCode, KeyEvent, ModifierKeyCode};

/// Turns terminal keys into key identifiers, using the names browsers report
/// in `KeyboardEvent.key`.
pub trait KeyEncoder {
    fn encode(&self) -> Result<String>;
}

impl KeyEncoder for ModifierKeyCode {
    fn encode(&self) -> Result<String> {
        let encoded = match self {
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => "Shift",
            ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => "Control",
            ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => "Alt",
            ModifierKeyCode::LeftSuper
            | ModifierKeyCode::RightSuper
            | ModifierKeyCode::LeftMeta
            | ModifierKeyCode::RightMeta => "Meta",
            ModifierKeyCode::LeftHyper | ModifierKeyCode::RightHyper => "Hyper",
            ModifierKeyCode::IsoLevel3Shift => "AltGraph",
            ModifierKeyCode::IsoLevel5Shift => "Level5Shift",
        };
        Ok(encoded.to_string())
    }
}

impl KeyEncoder for KeyCode {
    fn encode(&self) -> Result<String> {
        let encoded = match self {
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Left => "ArrowLeft".to_string(),
            KeyCode::Right => "ArrowRight".to_string(),
            KeyCode::Up => "ArrowUp".to_string(),
            KeyCode::Down => "ArrowDown".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            // Shift is already implied by BackTab
            KeyCode::Tab | KeyCode::BackTab => "Tab".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            KeyCode::Insert => "Insert".to_string(),
            KeyCode::Esc => "Escape".to_string(),
            KeyCode::CapsLock => "CapsLock".to_string(),
            KeyCode::ScrollLock => "ScrollLock".to_string(),
            KeyCode::NumLock => "NumLock".to_string(),
            KeyCode::PrintScreen => "PrintScreen".to_string(),
            KeyCode::Pause => "Pause".to_string(),
            KeyCode::Menu => "ContextMenu".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Modifier(modifier) => modifier.encode()?,
            _ => {
                return Err(anyhow!("Unsupported key code: {:?}", self));
            }
        };
        Ok(encoded)
    }
}

impl KeyEncoder for KeyEvent {
    /// Modifiers held with a key are not part of its identifier: crossterm
    /// already reports `Shift+b` as `B`.
    fn encode(&self) -> Result<String> {
        self.code.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyModifiers, MediaKeyCode};

    #[test]
    fn test_encode_konami_keys() {
        let codes = [
            KeyCode::Up,
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::Down,
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Char('b'),
            KeyCode::Char('a'),
        ];
        let encoded: Vec<String> = codes.iter().map(|code| code.encode().unwrap()).collect();
        assert_eq!(encoded, crate::sequence::KONAMI_CODE);
    }

    #[test]
    fn test_encode_named_keys() {
        assert_eq!(KeyCode::Esc.encode().unwrap(), "Escape");
        assert_eq!(KeyCode::F(5).encode().unwrap(), "F5");
        assert_eq!(KeyCode::Char(' ').encode().unwrap(), " ");
        assert_eq!(
            KeyCode::Modifier(ModifierKeyCode::RightShift).encode().unwrap(),
            "Shift"
        );
        assert!(KeyCode::Media(MediaKeyCode::Play).encode().is_err());
    }

    #[test]
    fn test_encode_ignores_held_modifiers() {
        let event = KeyEvent::new(KeyCode::Char('B'), KeyModifiers::SHIFT);
        assert_eq!(event.encode().unwrap(), "B");
    }
}
