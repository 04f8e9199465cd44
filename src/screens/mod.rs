//! Screens compose the navigation components and report what the host must do.
//!
//! A screen never performs I/O or routing itself. Every input turn returns a
//! list of [`Effect`]s; fetch results come back through `apply_*` calls that
//! carry the [`RequestTag`] they were issued with.

pub mod live;
pub mod vod;

pub use live::LiveScreen;
pub use vod::VodScreen;

use crate::item_id::ItemId;

/// Identifies the selection an async request was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag(pub u64);

/// Monotonic tag generator; each screen owns one
#[derive(Debug, Default)]
pub struct TagSource {
    last: u64,
}

impl TagSource {
    pub fn next(&mut self) -> RequestTag {
        self.last += 1;
        RequestTag(self.last)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Leave the screen
    NavigateBack,
    FetchEpg { tag: RequestTag, stream_id: ItemId },
    FetchMovieInfo { tag: RequestTag, vod_id: ItemId },
    Notify(String),
}

pub(crate) fn favorite_notice(added: bool) -> Effect {
    if added {
        Effect::Notify("Added to favorites".to_string())
    } else {
        Effect::Notify("Removed from favorites".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_unique_and_increasing() {
        let mut tags = TagSource::default();
        let a = tags.next();
        let b = tags.next();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }
}
