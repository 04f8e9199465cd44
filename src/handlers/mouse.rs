use std::time::Instant;

use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use crate::app::{App, AsyncAction};
use crate::handlers::async_actions::perform_effects;
use crate::input::InputEvent;

/// Pointer presses on channels and posters feed the gesture detector;
/// the wheel scrolls like Up/Down.
pub fn handle_mouse_event(
    app: &mut App,
    mouse: MouseEvent,
    tx: &mpsc::Sender<AsyncAction>,
    now: Instant,
) -> bool {
    let events = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let mut events = Vec::new();
            if let Some(stale) = app.pressed.take() {
                events.push(InputEvent::PressLeave(stale));
            }
            if let Some(id) = app.item_at(mouse.column, mouse.row) {
                app.pressed = Some(id.clone());
                events.push(InputEvent::PressStart(id));
            }
            events
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let still_over = app.item_at(mouse.column, mouse.row);
            match app.pressed.take() {
                Some(id) if still_over.as_ref() != Some(&id) => vec![InputEvent::PressLeave(id)],
                other => {
                    app.pressed = other;
                    Vec::new()
                }
            }
        }
        MouseEventKind::Up(MouseButton::Left) => match app.pressed.take() {
            Some(id) if app.item_at(mouse.column, mouse.row).as_ref() == Some(&id) => {
                vec![InputEvent::PressEnd(id)]
            }
            Some(id) => vec![InputEvent::PressLeave(id)],
            None => Vec::new(),
        },
        MouseEventKind::ScrollDown => vec![InputEvent::Down],
        MouseEventKind::ScrollUp => vec![InputEvent::Up],
        _ => Vec::new(),
    };

    let mut leave = false;
    for event in events {
        let effects = app.dispatch(event, now);
        leave |= perform_effects(app, effects, tx, now);
    }
    leave
}
