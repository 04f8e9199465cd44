//! Remote-control style input, independent of the terminal backend.

use crate::focus::Direction;
use crate::item_id::ItemId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Up,
    Down,
    Left,
    Right,
    Activate,
    Back,
    /// Digit key; PIN entry, or the favorite hot-key `0` on the live screen
    Digit(char),
    /// Any other printable character, consumed only by the search box
    Char(char),
    Backspace,
    FavoriteKey,
    /// Pointer pressed / released / moved off an item
    PressStart(ItemId),
    PressEnd(ItemId),
    PressLeave(ItemId),
}

impl InputEvent {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            InputEvent::Up => Some(Direction::Up),
            InputEvent::Down => Some(Direction::Down),
            InputEvent::Left => Some(Direction::Left),
            InputEvent::Right => Some(Direction::Right),
            _ => None,
        }
    }
}
