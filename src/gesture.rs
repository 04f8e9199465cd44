//! Tap vs long-press disambiguation for grid items.

use std::time::{Duration, Instant};

use crate::timer::CancellableTimer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureAction<T> {
    Select(T),
    FavoriteToggle(T),
}

#[derive(Debug)]
struct PendingPress<T> {
    item: T,
    timer: CancellableTimer,
    /// Long press already fired; the release must stay silent
    consumed: bool,
}

/// At most one press is tracked. A new press, a release or a pointer leave
/// always resolves or cancels the previous one.
#[derive(Debug)]
pub struct GestureDetector<T> {
    long_press: Duration,
    pending: Option<PendingPress<T>>,
}

impl<T: Clone + PartialEq> GestureDetector<T> {
    pub fn new(long_press: Duration) -> Self {
        Self {
            long_press,
            pending: None,
        }
    }

    pub fn is_pressing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn press_start(&mut self, item: T, now: Instant) {
        if let Some(mut stale) = self.pending.take() {
            stale.timer.cancel();
            tracing::debug!("gesture: stale press superseded");
        }
        let mut timer = CancellableTimer::new();
        timer.arm(now, self.long_press);
        self.pending = Some(PendingPress {
            item,
            timer,
            consumed: false,
        });
    }

    pub fn press_end(&mut self, item: &T, now: Instant) -> Option<GestureAction<T>> {
        let mut press = self.pending.take()?;
        if press.item != *item {
            // Released over a different item: treat as leaving the original
            press.timer.cancel();
            return None;
        }
        if press.consumed {
            return None;
        }
        if press.timer.poll(now) {
            // Deadline passed but no tick observed it yet
            return Some(GestureAction::FavoriteToggle(press.item));
        }
        press.timer.cancel();
        Some(GestureAction::Select(press.item))
    }

    pub fn press_leave(&mut self, item: &T) {
        let matches = self
            .pending
            .as_ref()
            .map(|p| p.item == *item)
            .unwrap_or(false);
        if matches {
            if let Some(mut press) = self.pending.take() {
                press.timer.cancel();
            }
        }
    }

    /// Fire the long press once its deadline has passed
    pub fn tick(&mut self, now: Instant) -> Option<GestureAction<T>> {
        let press = self.pending.as_mut()?;
        if !press.consumed && press.timer.poll(now) {
            press.consumed = true;
            return Some(GestureAction::FavoriteToggle(press.item.clone()));
        }
        None
    }
}
