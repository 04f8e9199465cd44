use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::{App, AsyncAction};
use crate::handlers::async_actions::perform_effects;
use crate::input::InputEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Quit,
}

/// Translate a terminal key into a remote-control event
pub fn map_key(key: &KeyEvent) -> Option<InputEvent> {
    match key.code {
        KeyCode::Up => Some(InputEvent::Up),
        KeyCode::Down => Some(InputEvent::Down),
        KeyCode::Left => Some(InputEvent::Left),
        KeyCode::Right => Some(InputEvent::Right),
        KeyCode::Enter => Some(InputEvent::Activate),
        KeyCode::Esc => Some(InputEvent::Back),
        KeyCode::Backspace => Some(InputEvent::Backspace),
        KeyCode::F(2) => Some(InputEvent::FavoriteKey),
        KeyCode::Char(c) if c.is_ascii_digit() => Some(InputEvent::Digit(c)),
        KeyCode::Char(c) => Some(InputEvent::Char(c)),
        _ => None,
    }
}

pub fn handle_key_event(
    app: &mut App,
    key: KeyEvent,
    tx: &mpsc::Sender<AsyncAction>,
    now: Instant,
) -> InputResult {
    // Only process key press events, not release (Windows sends both)
    if key.kind != KeyEventKind::Press {
        return InputResult::Continue;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return InputResult::Quit;
    }

    let Some(event) = map_key(&key) else {
        return InputResult::Continue;
    };
    let effects = app.dispatch(event, now);
    if perform_effects(app, effects, tx, now) {
        InputResult::Quit
    } else {
        InputResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digits_and_letters_are_distinct() {
        assert_eq!(map_key(&key(KeyCode::Char('7'))), Some(InputEvent::Digit('7')));
        assert_eq!(map_key(&key(KeyCode::Char('m'))), Some(InputEvent::Char('m')));
    }

    #[test]
    fn remote_keys() {
        assert_eq!(map_key(&key(KeyCode::Enter)), Some(InputEvent::Activate));
        assert_eq!(map_key(&key(KeyCode::Esc)), Some(InputEvent::Back));
        assert_eq!(map_key(&key(KeyCode::F(2))), Some(InputEvent::FavoriteKey));
        assert_eq!(map_key(&key(KeyCode::Tab)), None);
    }
}
