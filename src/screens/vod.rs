//! Video on demand: search box, category list and the poster grid, with the
//! movie overlay on top.

use std::collections::BTreeSet;
use std::time::Instant;

use tui_input::{Input, InputRequest};

use crate::api::{Category, Movie, VodInfo, XtreamClient};
use crate::catalog::{CategoryFilter, ListItem, VodCatalog};
use crate::config::Tuning;
use crate::engine::EngineFactory;
use crate::errors::IptvError;
use crate::favorites::{FavoriteKind, FavoritesStore};
use crate::focus::{Direction, FocusModel, GridMove, Panel};
use crate::gate::{AccessGate, GateOutcome};
use crate::gesture::{GestureAction, GestureDetector};
use crate::input::InputEvent;
use crate::item_id::ItemId;
use crate::media::MediaSession;
use crate::overlay::OverlayController;
use crate::screens::{favorite_notice, Effect, RequestTag};
use crate::store::SharedStore;

pub const VOD_PANELS: [Panel; 3] = [Panel::Search, Panel::Categories, Panel::Grid];

pub struct VodScreen {
    catalog: VodCatalog,
    favorites: FavoritesStore,
    gate: AccessGate,
    overlay: OverlayController,
    gesture: GestureDetector<ItemId>,
    focus: FocusModel,
    client: XtreamClient,
    columns: usize,
    current_category: usize,
    movies: Vec<Movie>,
    search: Input,
    typing: bool,
}

impl VodScreen {
    pub fn new(
        catalog: VodCatalog,
        store: SharedStore,
        tuning: &Tuning,
        client: XtreamClient,
        factory: Box<dyn EngineFactory>,
    ) -> Self {
        let favorites = FavoritesStore::new(store.clone());
        let start = catalog.start_category(&favorites.list_favorites(FavoriteKind::Movie));
        let mut focus = FocusModel::new(VOD_PANELS.to_vec(), Panel::Categories);
        focus.focus(Panel::Categories, start);

        let mut screen = Self {
            catalog,
            favorites,
            gate: AccessGate::new(store, &tuning.restricted_keywords, &tuning.default_pin),
            overlay: OverlayController::new(MediaSession::vod(factory)),
            gesture: GestureDetector::new(tuning.long_press()),
            focus,
            client,
            columns: tuning.columns(),
            current_category: start,
            movies: Vec::new(),
            search: Input::default(),
            typing: false,
        };
        screen.refresh_movies();
        screen
    }

    pub fn mount(
        store: SharedStore,
        tuning: &Tuning,
        client: XtreamClient,
        factory: Box<dyn EngineFactory>,
    ) -> Result<Self, IptvError> {
        let catalog = VodCatalog::load(&store)?;
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

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn search_term(&self) -> &str {
        self.search.value()
    }

    pub fn search_cursor(&self) -> usize {
        self.search.visual_cursor()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn overlay(&self) -> &OverlayController {
        &self.overlay
    }

    pub fn is_favorite(&self, id: &ItemId) -> bool {
        self.favorites.is_favorite(FavoriteKind::Movie, id)
    }

    pub fn favorite_ids(&self) -> BTreeSet<ItemId> {
        self.favorites.list_favorites(FavoriteKind::Movie)
    }

    pub fn panel_items(&self, panel: Panel) -> Vec<ListItem> {
        match panel {
            Panel::Categories => self
                .catalog
                .categories()
                .iter()
                .cloned()
                .map(ListItem::Category)
                .collect(),
            Panel::Grid => self.movies.iter().cloned().map(ListItem::Movie).collect(),
            _ => Vec::new(),
        }
    }

    pub fn handle(&mut self, event: InputEvent, now: Instant) -> Vec<Effect> {
        if self.gate.is_open() {
            return self.handle_gate(event);
        }
        if self.overlay.is_open() {
            return self.handle_overlay(event, now);
        }

        match event {
            InputEvent::PressStart(id) => {
                if self.movie_index(&id).is_some() {
                    self.gesture.press_start(id, now);
                }
                return Vec::new();
            }
            InputEvent::PressEnd(id) => {
                return match self.gesture.press_end(&id, now) {
                    Some(action) => self.apply_gesture(action),
                    None => Vec::new(),
                };
            }
            InputEvent::PressLeave(id) => {
                self.gesture.press_leave(&id);
                return Vec::new();
            }
            _ => {}
        }

        if self.typing {
            self.handle_typing(event);
            return Vec::new();
        }

        match self.focus.panel() {
            Panel::Search => self.handle_search_panel(event),
            Panel::Categories => self.handle_categories(event),
            Panel::Grid => self.handle_grid(event),
            _ => Vec::new(),
        }
    }

    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        self.overlay.tick(now);
        match self.gesture.tick(now) {
            Some(action) => self.apply_gesture(action),
            None => Vec::new(),
        }
    }

    pub fn apply_movie_info(&mut self, tag: RequestTag, info: VodInfo) -> bool {
        self.overlay.apply_info(tag, info)
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

    fn handle_overlay(&mut self, event: InputEvent, now: Instant) -> Vec<Effect> {
        if let Some(direction) = event.direction() {
            self.overlay.navigate(direction);
            return Vec::new();
        }
        match event {
            InputEvent::Activate => {
                let client = &self.client;
                let effects = self
                    .overlay
                    .activate(now, &self.favorites, |movie, info| client.vod_source(movie, info));
                if !effects.is_empty() && self.showing_favorites() {
                    self.refresh_movies();
                }
                effects
            }
            InputEvent::Back | InputEvent::Backspace => {
                self.overlay.back();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_typing(&mut self, event: InputEvent) {
        match event {
            InputEvent::Char(c) | InputEvent::Digit(c) => {
                self.search.handle(InputRequest::InsertChar(c));
                self.apply_search();
            }
            InputEvent::Backspace => {
                self.search.handle(InputRequest::DeletePrevChar);
                self.apply_search();
            }
            InputEvent::Activate | InputEvent::Back => self.typing = false,
            _ => {}
        }
    }

    fn handle_search_panel(&mut self, event: InputEvent) -> Vec<Effect> {
        match event {
            InputEvent::Activate => self.typing = true,
            InputEvent::Back | InputEvent::Backspace => {
                self.search.reset();
                self.refresh_movies();
                self.focus.focus(Panel::Categories, self.current_category);
            }
            InputEvent::Down => {
                let category = self.current_category;
                self.focus.cross_panel(Direction::Down, |panel| {
                    (panel == Panel::Categories).then_some(category)
                });
            }
            InputEvent::Right => self.focus.focus(Panel::Grid, 0),
            _ => {}
        }
        Vec::new()
    }

    fn handle_categories(&mut self, event: InputEvent) -> Vec<Effect> {
        let len = self.catalog.categories().len();
        match event {
            InputEvent::Up if self.focus.index() == 0 => {
                self.focus.cross_panel(Direction::Up, |_| None);
            }
            InputEvent::Up => self.focus.move_linear(-1, len),
            InputEvent::Down => self.focus.move_linear(1, len),
            InputEvent::Left => {
                self.focus.cross_panel(Direction::Left, |_| None);
            }
            InputEvent::Right => {
                self.focus.cross_panel(Direction::Right, |_| None);
            }
            InputEvent::Activate => {
                let items = self.panel_items(Panel::Categories);
                if let Some(ListItem::Category(category)) = self.focus.activate(&items).cloned() {
                    if self.gate.should_gate(&category) {
                        self.gate.open(category);
                    } else {
                        self.apply_category(&category);
                    }
                }
            }
            InputEvent::Back | InputEvent::Backspace => {
                self.overlay.close();
                return vec![Effect::NavigateBack];
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_grid(&mut self, event: InputEvent) -> Vec<Effect> {
        if let Some(direction) = event.direction() {
            if let GridMove::Boundary(edge) = self.focus.move_grid(direction, self.columns, self.movies.len()) {
                let category = self.current_category;
                self.focus.cross_panel(edge, |panel| {
                    (panel == Panel::Categories).then_some(category)
                });
            }
            return Vec::new();
        }
        match event {
            InputEvent::Activate => {
                let items = self.panel_items(Panel::Grid);
                match self.focus.activate(&items).cloned() {
                    Some(ListItem::Movie(movie)) => self.open_movie(movie),
                    _ => Vec::new(),
                }
            }
            InputEvent::Back | InputEvent::Backspace => {
                self.focus.focus(Panel::Categories, self.current_category);
                Vec::new()
            }
            InputEvent::FavoriteKey => match self.focus.activate(&self.movies) {
                Some(movie) => {
                    let id = movie.stream_id.clone();
                    self.toggle_favorite(&id)
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn open_movie(&mut self, movie: Movie) -> Vec<Effect> {
        let vod_id = movie.stream_id.clone();
        let tag = self.overlay.open(movie);
        vec![Effect::FetchMovieInfo { tag, vod_id }]
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
        self.search.reset();
        self.refresh_movies();
        self.focus.focus(Panel::Grid, 0);
        tracing::debug!(category = %category.category_name, count = self.movies.len(), "category selected");
    }

    fn apply_search(&mut self) {
        self.refresh_movies();
        if self.focus.panel() == Panel::Grid {
            self.focus.focus(Panel::Grid, 0);
        }
    }

    /// Search results when a term is set, otherwise the current category
    fn refresh_movies(&mut self) {
        self.movies = if self.search.value().trim().is_empty() {
            let filter = self
                .catalog
                .categories()
                .get(self.current_category)
                .map(CategoryFilter::for_category)
                .unwrap_or(CategoryFilter::All);
            let favorites = self.favorites.list_favorites(FavoriteKind::Movie);
            self.catalog.movies_for(&filter, &favorites)
        } else {
            self.catalog.search(self.search.value())
        };
        if self.focus.panel() == Panel::Grid {
            self.focus.clamp_to(self.movies.len());
        }
    }

    fn apply_gesture(&mut self, action: GestureAction<ItemId>) -> Vec<Effect> {
        match action {
            GestureAction::Select(id) => {
                let Some(index) = self.movie_index(&id) else {
                    return Vec::new();
                };
                self.focus.focus(Panel::Grid, index);
                let movie = self.movies[index].clone();
                self.open_movie(movie)
            }
            GestureAction::FavoriteToggle(id) => self.toggle_favorite(&id),
        }
    }

    fn toggle_favorite(&mut self, id: &ItemId) -> Vec<Effect> {
        let added = self.favorites.toggle(FavoriteKind::Movie, id);
        if self.showing_favorites() {
            self.refresh_movies();
        }
        vec![favorite_notice(added)]
    }

    fn showing_favorites(&self) -> bool {
        self.search.value().trim().is_empty()
            && self
                .catalog
                .categories()
                .get(self.current_category)
                .map(|c| CategoryFilter::for_category(c) == CategoryFilter::Favorites)
                .unwrap_or(false)
    }

    fn movie_index(&self, id: &ItemId) -> Option<usize> {
        self.movies.iter().position(|m| &m.stream_id == id)
    }
}
