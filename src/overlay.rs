//! Movie info overlay, playback and pause menu for the VOD screen.
//!
//! One tagged state at a time; the controller owns the VOD [`MediaSession`]
//! and detaches it on every transition that ends in [`OverlayState::Closed`].

use std::time::Instant;

use crate::api::{Movie, VodInfo};
use crate::engine::MediaSource;
use crate::favorites::{FavoriteKind, FavoritesStore};
use crate::focus::Direction;
use crate::media::MediaSession;
use crate::screens::{favorite_notice, Effect, RequestTag, TagSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoFocus {
    Back,
    Watch,
    Fav,
}

impl InfoFocus {
    /// Ring order Back -> Watch -> Fav -> Back
    pub fn next(self) -> Self {
        match self {
            InfoFocus::Back => InfoFocus::Watch,
            InfoFocus::Watch => InfoFocus::Fav,
            InfoFocus::Fav => InfoFocus::Back,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            InfoFocus::Back => InfoFocus::Fav,
            InfoFocus::Watch => InfoFocus::Back,
            InfoFocus::Fav => InfoFocus::Watch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseFocus {
    Continue,
    Close,
}

impl PauseFocus {
    fn toggle(self) -> Self {
        match self {
            PauseFocus::Continue => PauseFocus::Close,
            PauseFocus::Close => PauseFocus::Continue,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState {
    Closed,
    Info {
        movie: Movie,
        focus: InfoFocus,
        info: Option<VodInfo>,
        tag: RequestTag,
    },
    Playing {
        movie: Movie,
        info: Option<VodInfo>,
        tag: RequestTag,
        pause_menu: Option<PauseFocus>,
    },
}

pub struct OverlayController {
    state: OverlayState,
    session: MediaSession,
    tags: TagSource,
}

impl OverlayController {
    pub fn new(session: MediaSession) -> Self {
        Self {
            state: OverlayState::Closed,
            session,
            tags: TagSource::default(),
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, OverlayState::Closed)
    }

    pub fn session(&self) -> &MediaSession {
        &self.session
    }

    pub fn movie(&self) -> Option<&Movie> {
        match &self.state {
            OverlayState::Info { movie, .. } | OverlayState::Playing { movie, .. } => Some(movie),
            OverlayState::Closed => None,
        }
    }

    pub fn info(&self) -> Option<&VodInfo> {
        match &self.state {
            OverlayState::Info { info, .. } | OverlayState::Playing { info, .. } => info.as_ref(),
            OverlayState::Closed => None,
        }
    }

    /// Show the info panel for `movie`; the returned tag guards its metadata fetch
    pub fn open(&mut self, movie: Movie) -> RequestTag {
        self.session.detach();
        let tag = self.tags.next();
        tracing::debug!(movie = %movie.stream_id, "overlay opened");
        self.state = OverlayState::Info {
            movie,
            focus: InfoFocus::Back,
            info: None,
            tag,
        };
        tag
    }

    /// Accept metadata only for the movie currently shown
    pub fn apply_info(&mut self, response_tag: RequestTag, fetched: VodInfo) -> bool {
        match &mut self.state {
            OverlayState::Info { tag, info, .. } | OverlayState::Playing { tag, info, .. }
                if *tag == response_tag =>
            {
                *info = Some(fetched);
                true
            }
            _ => {
                tracing::debug!(?response_tag, "stale movie info dropped");
                false
            }
        }
    }

    pub fn navigate(&mut self, direction: Direction) {
        match &mut self.state {
            OverlayState::Info { focus, .. } => {
                *focus = match direction {
                    Direction::Right | Direction::Down => focus.next(),
                    Direction::Left | Direction::Up => focus.prev(),
                };
            }
            OverlayState::Playing {
                pause_menu: Some(pause),
                ..
            } => {
                if matches!(direction, Direction::Left | Direction::Right) {
                    *pause = pause.toggle();
                }
            }
            _ => {}
        }
    }

    /// `resolve` builds the playable source when Watch is activated
    pub fn activate<F>(&mut self, now: Instant, favorites: &FavoritesStore, resolve: F) -> Vec<Effect>
    where
        F: FnOnce(&Movie, Option<&VodInfo>) -> MediaSource,
    {
        let state = std::mem::replace(&mut self.state, OverlayState::Closed);
        match state {
            OverlayState::Closed => Vec::new(),
            OverlayState::Info {
                focus: InfoFocus::Back,
                ..
            } => {
                self.close();
                Vec::new()
            }
            OverlayState::Info {
                movie,
                focus: InfoFocus::Watch,
                info,
                tag,
            } => {
                let source = resolve(&movie, info.as_ref());
                self.session.attach(source, now);
                self.state = OverlayState::Playing {
                    movie,
                    info,
                    tag,
                    pause_menu: None,
                };
                Vec::new()
            }
            OverlayState::Info {
                movie,
                focus: InfoFocus::Fav,
                info,
                tag,
            } => {
                let added = favorites.toggle(FavoriteKind::Movie, &movie.stream_id);
                self.state = OverlayState::Info {
                    movie,
                    focus: InfoFocus::Fav,
                    info,
                    tag,
                };
                vec![favorite_notice(added)]
            }
            OverlayState::Playing {
                movie,
                info,
                tag,
                pause_menu: None,
            } => {
                self.session.pause();
                self.state = OverlayState::Playing {
                    movie,
                    info,
                    tag,
                    pause_menu: Some(PauseFocus::Continue),
                };
                Vec::new()
            }
            OverlayState::Playing {
                movie,
                info,
                tag,
                pause_menu: Some(PauseFocus::Continue),
            } => {
                self.session.resume();
                self.state = OverlayState::Playing {
                    movie,
                    info,
                    tag,
                    pause_menu: None,
                };
                Vec::new()
            }
            OverlayState::Playing {
                pause_menu: Some(PauseFocus::Close),
                ..
            } => {
                self.close();
                Vec::new()
            }
        }
    }

    /// Leaving playback returns to the info panel; leaving the info panel closes
    pub fn back(&mut self) {
        let state = std::mem::replace(&mut self.state, OverlayState::Closed);
        match state {
            OverlayState::Playing {
                movie, info, tag, ..
            } => {
                self.session.detach();
                self.state = OverlayState::Info {
                    movie,
                    focus: InfoFocus::Back,
                    info,
                    tag,
                };
            }
            OverlayState::Info { .. } | OverlayState::Closed => self.close(),
        }
    }

    pub fn close(&mut self) {
        self.session.detach();
        if self.is_open() {
            tracing::debug!("overlay closed");
        }
        self.state = OverlayState::Closed;
    }

    pub fn tick(&mut self, now: Instant) {
        self.session.tick(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEvent, EngineLog, RecordingFactory};
    use crate::item_id::ItemId;
    use crate::store::MemoryStore;

    fn movie(id: i64) -> Movie {
        Movie {
            stream_id: ItemId::Number(id),
            name: format!("Movie {}", id),
            ..Default::default()
        }
    }

    fn controller() -> (OverlayController, EngineLog, FavoritesStore) {
        let factory = RecordingFactory::new();
        let log = factory.log();
        let favorites = FavoritesStore::new(MemoryStore::shared());
        (
            OverlayController::new(MediaSession::vod(Box::new(factory))),
            log,
            favorites,
        )
    }

    fn source(m: &Movie, _info: Option<&VodInfo>) -> MediaSource {
        MediaSource::from_url(format!("http://tv/movie/u/p/{}.mp4", m.stream_id))
    }

    fn watch(ctl: &mut OverlayController, favs: &FavoritesStore) {
        ctl.navigate(Direction::Right);
        ctl.activate(Instant::now(), favs, source);
    }

    fn destroyed(log: &EngineLog) -> usize {
        log.lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, EngineEvent::Destroyed { .. }))
            .count()
    }

    #[test]
    fn focus_ring_cycles_both_ways() {
        let (mut ctl, _, _) = controller();
        ctl.open(movie(1));
        let focus = |c: &OverlayController| match c.state() {
            OverlayState::Info { focus, .. } => *focus,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(focus(&ctl), InfoFocus::Back);
        ctl.navigate(Direction::Right);
        ctl.navigate(Direction::Right);
        assert_eq!(focus(&ctl), InfoFocus::Fav);
        ctl.navigate(Direction::Right);
        assert_eq!(focus(&ctl), InfoFocus::Back);
        ctl.navigate(Direction::Left);
        assert_eq!(focus(&ctl), InfoFocus::Fav);
    }

    #[test]
    fn watch_then_pause_menu_close_detaches() {
        let (mut ctl, log, favs) = controller();
        ctl.open(movie(7));
        watch(&mut ctl, &favs);
        assert!(ctl.session().is_attached());
        assert!(matches!(ctl.state(), OverlayState::Playing { pause_menu: None, .. }));

        ctl.activate(Instant::now(), &favs, source);
        assert!(ctl.session().is_paused());
        assert!(matches!(
            ctl.state(),
            OverlayState::Playing { pause_menu: Some(PauseFocus::Continue), .. }
        ));

        ctl.navigate(Direction::Right);
        ctl.activate(Instant::now(), &favs, source);
        assert_eq!(ctl.state(), &OverlayState::Closed);
        assert!(!ctl.session().is_attached());
        assert_eq!(destroyed(&log), 1);
    }

    #[test]
    fn pause_menu_continue_resumes() {
        let (mut ctl, _, favs) = controller();
        ctl.open(movie(7));
        watch(&mut ctl, &favs);
        ctl.activate(Instant::now(), &favs, source);
        ctl.activate(Instant::now(), &favs, source);
        assert!(!ctl.session().is_paused());
        assert!(matches!(ctl.state(), OverlayState::Playing { pause_menu: None, .. }));
    }

    #[test]
    fn fav_toggles_without_leaving_info() {
        let (mut ctl, _, favs) = controller();
        ctl.open(movie(3));
        ctl.navigate(Direction::Left);
        let effects = ctl.activate(Instant::now(), &favs, source);
        assert_eq!(effects, vec![Effect::Notify("Added to favorites".into())]);
        assert!(favs.is_favorite(FavoriteKind::Movie, &ItemId::Number(3)));
        assert!(matches!(ctl.state(), OverlayState::Info { focus: InfoFocus::Fav, .. }));
    }

    #[test]
    fn back_from_playing_returns_to_info_then_closes() {
        let (mut ctl, log, favs) = controller();
        ctl.open(movie(7));
        watch(&mut ctl, &favs);
        ctl.back();
        assert!(matches!(ctl.state(), OverlayState::Info { focus: InfoFocus::Back, .. }));
        assert!(!ctl.session().is_attached());
        ctl.back();
        assert_eq!(ctl.state(), &OverlayState::Closed);
        assert_eq!(destroyed(&log), 1);
    }

    #[test]
    fn stale_info_is_dropped() {
        let (mut ctl, _, _) = controller();
        let first = ctl.open(movie(1));
        let second = ctl.open(movie(2));
        assert!(!ctl.apply_info(first, VodInfo::default()));
        assert!(ctl.info().is_none());
        assert!(ctl.apply_info(second, VodInfo::default()));
        assert!(ctl.info().is_some());
    }

    #[test]
    fn reopening_while_playing_detaches_first() {
        let (mut ctl, log, favs) = controller();
        ctl.open(movie(7));
        watch(&mut ctl, &favs);
        ctl.open(movie(8));
        assert!(!ctl.session().is_attached());
        assert_eq!(destroyed(&log), 1);
        assert_eq!(ctl.movie().map(|m| m.stream_id.clone()), Some(ItemId::Number(8)));
    }
}
