//! Live TV: category list, channel list and the EPG of the playing channel.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::api::{Category, Channel, EpgListing, XtreamClient};
use crate::catalog::{CategoryFilter, ListItem, LiveCatalog};
use crate::config::Tuning;
use crate::engine::EngineFactory;
use crate::epg::{current_and_upcoming, EpgProgram, EpgSchedule, VISIBLE_PROGRAMS};
use crate::errors::IptvError;
use crate::favorites::{FavoriteKind, FavoritesStore};
use crate::focus::{Direction, FocusModel, Panel};
use crate::gate::{AccessGate, GateOutcome};
use crate::gesture::{GestureAction, GestureDetector};
use crate::input::InputEvent;
use crate::item_id::ItemId;
use crate::media::MediaSession;
use crate::screens::{favorite_notice, Effect, RequestTag, TagSource};
use crate::store::SharedStore;

pub const LIVE_PANELS: [Panel; 3] = [Panel::Categories, Panel::Channels, Panel::Epg];

#[derive(Debug, Default)]
struct EpgState {
    tag: Option<RequestTag>,
    programs: Vec<EpgProgram>,
    loading: bool,
}

pub struct LiveScreen {
    catalog: LiveCatalog,
    favorites: FavoritesStore,
    gate: AccessGate,
    session: MediaSession,
    gesture: GestureDetector<ItemId>,
    focus: FocusModel,
    client: XtreamClient,
    tags: TagSource,
    current_category: usize,
    channels: Vec<Channel>,
    playing: Option<Channel>,
    /// Hidden while the video runs fullscreen
    menu_visible: bool,
    epg: EpgState,
}

impl LiveScreen {
    pub fn new(
        catalog: LiveCatalog,
        store: SharedStore,
        tuning: &Tuning,
        client: XtreamClient,
        factory: Box<dyn EngineFactory>,
    ) -> Self {
        let favorites = FavoritesStore::new(store.clone());
        let channels = catalog.channels_for(&CategoryFilter::All, &BTreeSet::new());
        Self {
            catalog,
            favorites,
            gate: AccessGate::new(store, &tuning.restricted_keywords, &tuning.default_pin),
            session: MediaSession::live(factory, tuning.unmute_delay()),
            gesture: GestureDetector::new(tuning.long_press()),
            focus: FocusModel::new(LIVE_PANELS.to_vec(), Panel::Categories),
            client,
            tags: TagSource::default(),
            current_category: 0,
            channels,
            playing: None,
            menu_visible: true,
            epg: EpgState::default(),
        }
    }

    /// Build the screen from cached listings; fails when they were never fetched
    pub fn mount(
        store: SharedStore,
        tuning: &Tuning,
        client: XtreamClient,
        factory: Box<dyn EngineFactory>,
    ) -> Result<Self, IptvError> {
        let catalog = LiveCatalog::load(&store)?;
        Ok(Self::new(catalog, store, tuning, client, factory))
    }

    pub fn focus(&self) -> &FocusModel {
        &self.focus
    }

    pub fn categories(&self) -> &[Category] {
        self.catalog.categories()
    }

    pub fn current_category(&self) -> usize {
        self.current_category
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn playing(&self) -> Option<&Channel> {
        self.playing.as_ref()
    }

    pub fn is_menu_visible(&self) -> bool {
        self.menu_visible
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn session(&self) -> &MediaSession {
        &self.session
    }

    pub fn is_favorite(&self, id: &ItemId) -> bool {
        self.favorites.is_favorite(FavoriteKind::Channel, id)
    }

    /// One store read; renderers check rows against this set
    pub fn favorite_ids(&self) -> BTreeSet<ItemId> {
        self.favorites.list_favorites(FavoriteKind::Channel)
    }

    pub fn epg_loading(&self) -> bool {
        self.epg.loading
    }

    pub fn schedule(&self, now: DateTime<Utc>) -> EpgSchedule {
        current_and_upcoming(&self.epg.programs, now)
    }

    /// Rows of `panel` in display order
    pub fn panel_items(&self, panel: Panel) -> Vec<ListItem> {
        match panel {
            Panel::Categories => self
                .catalog
                .categories()
                .iter()
                .cloned()
                .map(ListItem::Category)
                .collect(),
            Panel::Channels => self.channels.iter().cloned().map(ListItem::Channel).collect(),
            _ => Vec::new(),
        }
    }

    pub fn handle(&mut self, event: InputEvent, now: Instant) -> Vec<Effect> {
        if self.gate.is_open() {
            return self.handle_gate(event);
        }

        match event {
            InputEvent::PressStart(id) => {
                if self.channel_index(&id).is_some() {
                    self.gesture.press_start(id, now);
                }
                return Vec::new();
            }
            InputEvent::PressEnd(id) => {
                return match self.gesture.press_end(&id, now) {
                    Some(action) => self.apply_gesture(action, now),
                    None => Vec::new(),
                };
            }
            InputEvent::PressLeave(id) => {
                self.gesture.press_leave(&id);
                return Vec::new();
            }
            _ => {}
        }

        if !self.menu_visible {
            if matches!(
                event,
                InputEvent::Activate | InputEvent::Back | InputEvent::Backspace
            ) {
                self.menu_visible = true;
            }
            return Vec::new();
        }

        match event {
            InputEvent::Up => {
                self.move_in_panel(-1);
                Vec::new()
            }
            InputEvent::Down => {
                self.move_in_panel(1);
                Vec::new()
            }
            InputEvent::Left | InputEvent::Right => {
                let direction = if event == InputEvent::Left {
                    Direction::Left
                } else {
                    Direction::Right
                };
                let category = self.current_category;
                let playing = self.playing_index();
                self.focus.cross_panel(direction, |panel| match panel {
                    Panel::Categories => Some(category),
                    Panel::Channels => playing,
                    _ => None,
                });
                Vec::new()
            }
            InputEvent::Activate => self.activate(now),
            InputEvent::Back | InputEvent::Backspace => {
                self.session.detach();
                self.playing = None;
                self.epg = EpgState::default();
                vec![Effect::NavigateBack]
            }
            InputEvent::FavoriteKey | InputEvent::Digit('0') => {
                if self.focus.panel() != Panel::Channels {
                    return Vec::new();
                }
                match self.focus.activate(&self.channels) {
                    Some(channel) => {
                        let id = channel.stream_id.clone();
                        self.toggle_favorite(&id)
                    }
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    /// Drive the unmute timer and long presses
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        self.session.tick(now);
        match self.gesture.tick(now) {
            Some(action) => self.apply_gesture(action, now),
            None => Vec::new(),
        }
    }

    pub fn apply_epg(&mut self, tag: RequestTag, listings: &[EpgListing]) -> bool {
        if self.epg.tag != Some(tag) {
            tracing::debug!(?tag, "stale EPG dropped");
            return false;
        }
        self.epg.programs = listings.iter().filter_map(EpgProgram::from_listing).collect();
        self.epg.loading = false;
        if self.focus.panel() == Panel::Epg {
            self.focus.clamp_to(self.epg.programs.len().min(VISIBLE_PROGRAMS));
        }
        true
    }

    /// A failed fetch leaves the guide empty
    pub fn epg_failed(&mut self, tag: RequestTag) {
        if self.epg.tag == Some(tag) {
            self.epg.programs.clear();
            self.epg.loading = false;
        }
    }

    fn handle_gate(&mut self, event: InputEvent) -> Vec<Effect> {
        match event {
            InputEvent::Digit(d) => {
                if let GateOutcome::Granted(category) = self.gate.submit_digit(d) {
                    self.apply_category(&category);
                }
            }
            InputEvent::Back | InputEvent::Backspace => self.gate.cancel(),
            _ => {}
        }
        Vec::new()
    }

    fn move_in_panel(&mut self, delta: isize) {
        let len = match self.focus.panel() {
            Panel::Categories => self.catalog.categories().len(),
            Panel::Channels => self.channels.len(),
            Panel::Epg => self.epg.programs.len().min(VISIBLE_PROGRAMS),
            _ => 0,
        };
        self.focus.move_linear(delta, len);
    }

    fn activate(&mut self, now: Instant) -> Vec<Effect> {
        let items = self.panel_items(self.focus.panel());
        let item = self.focus.activate(&items).cloned();
        if let Some(item) = &item {
            tracing::debug!(item = item.name(), "activate");
        }
        match item {
            Some(ListItem::Category(category)) => {
                if self.gate.should_gate(&category) {
                    self.gate.open(category);
                } else {
                    self.apply_category(&category);
                }
                Vec::new()
            }
            Some(ListItem::Channel(channel)) => self.select_channel(channel, now),
            _ => Vec::new(),
        }
    }

    fn apply_category(&mut self, category: &Category) {
        let Some(index) = self
            .catalog
            .categories()
            .iter()
            .position(|c| c.category_id == category.category_id)
        else {
            return;
        };
        self.current_category = index;
        self.refresh_channels();
        self.focus.focus(Panel::Channels, 0);
        tracing::debug!(category = %category.category_name, count = self.channels.len(), "category selected");
    }

    fn refresh_channels(&mut self) {
        let filter = self
            .catalog
            .categories()
            .get(self.current_category)
            .map(CategoryFilter::for_category)
            .unwrap_or(CategoryFilter::All);
        let favorites = self.favorites.list_favorites(FavoriteKind::Channel);
        self.channels = self.catalog.channels_for(&filter, &favorites);
        if self.focus.panel() == Panel::Channels {
            self.focus.clamp_to(self.channels.len());
        }
    }

    fn select_channel(&mut self, channel: Channel, now: Instant) -> Vec<Effect> {
        if self.playing.as_ref().map(|c| &c.stream_id) == Some(&channel.stream_id) {
            self.menu_visible = false;
            return Vec::new();
        }

        self.session.attach(self.client.live_source(&channel), now);
        let tag = self.tags.next();
        self.epg = EpgState {
            tag: Some(tag),
            programs: Vec::new(),
            loading: true,
        };
        let stream_id = channel.stream_id.clone();
        tracing::info!(channel = %channel.name, "tuning");
        self.playing = Some(channel);
        vec![Effect::FetchEpg { tag, stream_id }]
    }

    fn apply_gesture(&mut self, action: GestureAction<ItemId>, now: Instant) -> Vec<Effect> {
        match action {
            GestureAction::Select(id) => {
                let Some(index) = self.channel_index(&id) else {
                    return Vec::new();
                };
                self.focus.focus(Panel::Channels, index);
                let channel = self.channels[index].clone();
                self.select_channel(channel, now)
            }
            GestureAction::FavoriteToggle(id) => self.toggle_favorite(&id),
        }
    }

    fn toggle_favorite(&mut self, id: &ItemId) -> Vec<Effect> {
        let added = self.favorites.toggle(FavoriteKind::Channel, id);
        let showing_favorites = self
            .catalog
            .categories()
            .get(self.current_category)
            .map(|c| CategoryFilter::for_category(c) == CategoryFilter::Favorites)
            .unwrap_or(false);
        if showing_favorites {
            self.refresh_channels();
        }
        vec![favorite_notice(added)]
    }

    fn channel_index(&self, id: &ItemId) -> Option<usize> {
        self.channels.iter().position(|c| &c.stream_id == id)
    }

    fn playing_index(&self) -> Option<usize> {
        self.playing
            .as_ref()
            .and_then(|p| self.channel_index(&p.stream_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerProfile;
    use crate::engine::{EngineEvent, RecordingFactory};
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn client() -> XtreamClient {
        XtreamClient::new(&ServerProfile {
            protocol: "http".into(),
            host: "tv.example".into(),
            port: None,
            username: "u".into(),
            password: "p".into(),
        })
    }

    fn screen() -> (LiveScreen, crate::engine::EngineLog) {
        let catalog = LiveCatalog::new(
            vec![Category::new(1, "News"), Category::new(2, "Adult Night")],
            (1..=3)
                .map(|i| Channel {
                    stream_id: ItemId::Number(i),
                    name: format!("Ch {}", i),
                    category_id: Some(ItemId::Number(1)),
                    ..Default::default()
                })
                .collect(),
        );
        let factory = RecordingFactory::new();
        let log = factory.log();
        let screen = LiveScreen::new(
            catalog,
            MemoryStore::shared(),
            &Tuning::default(),
            client(),
            Box::new(factory),
        );
        (screen, log)
    }

    #[test]
    fn selecting_channel_attaches_and_requests_epg() {
        let (mut s, log) = screen();
        let now = Instant::now();
        s.handle(InputEvent::Right, now);
        let effects = s.handle(InputEvent::Activate, now);
        assert!(matches!(
            effects.as_slice(),
            [Effect::FetchEpg { stream_id: ItemId::Number(1), .. }]
        ));
        assert!(s.session().is_attached());
        assert!(log
            .lock()
            .unwrap()
            .contains(&EngineEvent::Loaded { engine: 1, url: "http://tv.example/live/u/p/1.m3u8".into() }));
    }

    #[test]
    fn reselecting_playing_channel_hides_menu() {
        let (mut s, _) = screen();
        let now = Instant::now();
        s.handle(InputEvent::Right, now);
        s.handle(InputEvent::Activate, now);
        assert!(s.handle(InputEvent::Activate, now).is_empty());
        assert!(!s.is_menu_visible());
        // Any directional key is swallowed until the menu is back
        s.handle(InputEvent::Down, now);
        assert_eq!(s.focus().index(), 0);
        s.handle(InputEvent::Back, now);
        assert!(s.is_menu_visible());
    }

    #[test]
    fn stale_epg_is_ignored() {
        let (mut s, _) = screen();
        let now = Instant::now();
        s.handle(InputEvent::Right, now);
        let first = match s.handle(InputEvent::Activate, now).pop() {
            Some(Effect::FetchEpg { tag, .. }) => tag,
            other => panic!("unexpected {:?}", other),
        };
        s.handle(InputEvent::Down, now);
        s.handle(InputEvent::Activate, now);
        let listing = EpgListing {
            title: "TmV3cw==".into(),
            start_timestamp: Some(serde_json::json!(0)),
            stop_timestamp: Some(serde_json::json!(60)),
            ..Default::default()
        };
        assert!(!s.apply_epg(first, &[listing]));
        assert!(s.epg_loading());
        assert_eq!(s.schedule(Utc::now()), EpgSchedule::NoProgramming);
    }

    #[test]
    fn restricted_category_needs_pin() {
        let (mut s, _) = screen();
        let now = Instant::now();
        s.handle(InputEvent::Down, now);
        s.handle(InputEvent::Down, now);
        s.handle(InputEvent::Down, now);
        s.handle(InputEvent::Activate, now);
        assert!(s.gate().is_open());
        for d in "0000".chars() {
            s.handle(InputEvent::Digit(d), now);
        }
        assert!(!s.gate().is_open());
        assert_eq!(s.current_category(), 3);
        assert!(s.channels().is_empty());
    }

    #[test]
    fn back_cancels_pin_challenge() {
        let (mut s, _) = screen();
        let now = Instant::now();
        for _ in 0..3 {
            s.handle(InputEvent::Down, now);
        }
        s.handle(InputEvent::Activate, now);
        assert!(s.handle(InputEvent::Back, now).is_empty());
        assert!(!s.gate().is_open());
        assert_eq!(s.current_category(), 0);
    }

    #[test]
    fn long_press_toggles_favorite_without_tuning() {
        let (mut s, _) = screen();
        let t0 = Instant::now();
        s.handle(InputEvent::PressStart(ItemId::Number(2)), t0);
        let effects = s.tick(t0 + Duration::from_millis(800));
        assert_eq!(effects, vec![Effect::Notify("Added to favorites".into())]);
        assert!(s.handle(InputEvent::PressEnd(ItemId::Number(2)), t0 + Duration::from_millis(900)).is_empty());
        assert!(s.is_favorite(&ItemId::Number(2)));
        assert!(!s.session().is_attached());
    }

    #[test]
    fn tap_selects_channel() {
        let (mut s, _) = screen();
        let t0 = Instant::now();
        s.handle(InputEvent::PressStart(ItemId::Number(3)), t0);
        let effects = s.handle(InputEvent::PressEnd(ItemId::Number(3)), t0 + Duration::from_millis(300));
        assert_eq!(effects.len(), 1);
        assert_eq!(s.focus().state().index, 2);
        assert_eq!(s.playing().map(|c| c.stream_id.clone()), Some(ItemId::Number(3)));
    }

    #[test]
    fn back_with_menu_visible_leaves_and_detaches() {
        let (mut s, _) = screen();
        let now = Instant::now();
        s.handle(InputEvent::Right, now);
        s.handle(InputEvent::Activate, now);
        assert_eq!(s.handle(InputEvent::Back, now), vec![Effect::NavigateBack]);
        assert!(!s.session().is_attached());
        assert!(s.playing().is_none());
        assert!(!s.epg_loading());

        // Coming back to the same channel tunes it again instead of going fullscreen
        let effects = s.handle(InputEvent::Activate, now);
        assert!(matches!(
            effects.as_slice(),
            [Effect::FetchEpg { stream_id: ItemId::Number(1), .. }]
        ));
        assert!(s.session().is_attached());
        assert!(s.is_menu_visible());
    }
}
