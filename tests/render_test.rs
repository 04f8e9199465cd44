use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ratatui::{backend::TestBackend, Terminal};

use tenfoot_iptv_lib::api::{Category, Channel, Movie, XtreamClient};
use tenfoot_iptv_lib::app::{ActiveScreen, App};
use tenfoot_iptv_lib::catalog::{LiveCatalog, VodCatalog};
use tenfoot_iptv_lib::config::{ServerProfile, Tuning};
use tenfoot_iptv_lib::engine::RecordingFactory;
use tenfoot_iptv_lib::input::InputEvent;
use tenfoot_iptv_lib::item_id::ItemId;
use tenfoot_iptv_lib::screens::{LiveScreen, VodScreen};
use tenfoot_iptv_lib::errors::IptvError;
use tenfoot_iptv_lib::store::{KeyValueStore, MemoryStore};
use tenfoot_iptv_lib::ui;

fn client() -> XtreamClient {
    XtreamClient::new(&ServerProfile {
        protocol: "http".into(),
        host: "tv.example".into(),
        port: None,
        username: "u".into(),
        password: "p".into(),
    })
}

fn rendered_text(app: &mut App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|f| ui::ui(f, app)).unwrap();
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

#[test]
fn test_live_screen_renders_panels() {
    let tuning = Tuning::default();
    let catalog = LiveCatalog::new(
        vec![Category::new(1, "News")],
        vec![Channel {
            stream_id: ItemId::Number(1),
            name: "World News".into(),
            category_id: Some(ItemId::Number(1)),
            ..Default::default()
        }],
    );
    let screen = LiveScreen::new(
        catalog,
        MemoryStore::shared(),
        &tuning,
        client(),
        Box::new(RecordingFactory::new()),
    );
    let mut app = App::new(ActiveScreen::Live(Box::new(screen)), client(), tuning);

    let text = rendered_text(&mut app);
    assert!(text.contains("CATEGORIES"));
    assert!(text.contains("World News"));
    assert!(text.contains("Select a channel"));
    assert_ne!(app.area_channels.width, 0);
}

#[test]
fn test_vod_screen_renders_grid_and_overlay() {
    let tuning = Tuning::default();
    let catalog = VodCatalog::new(
        vec![Category::new(1, "Drama")],
        vec![Movie {
            stream_id: ItemId::Number(1),
            name: "Night Train".into(),
            category_id: Some(ItemId::Number(1)),
            rating: Some(7.5),
            ..Default::default()
        }],
    );
    let screen = VodScreen::new(
        catalog,
        MemoryStore::shared(),
        &tuning,
        client(),
        Box::new(RecordingFactory::new()),
    );
    let mut app = App::new(ActiveScreen::Vod(Box::new(screen)), client(), tuning);

    let text = rendered_text(&mut app);
    assert!(text.contains("SEARCH"));
    assert!(text.contains("Night Train"));

    let now = Instant::now();
    app.dispatch(InputEvent::Right, now);
    app.dispatch(InputEvent::Activate, now);
    let text = rendered_text(&mut app);
    assert!(text.contains("MOVIE"));
    assert!(text.contains("Watch"));
}

/// Counts reads so tests can bound store traffic per frame
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), IptvError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), IptvError> {
        self.inner.remove(key)
    }
}

#[test]
fn test_large_channel_list_reads_favorites_once_per_frame() {
    let tuning = Tuning::default();
    let channels = (1..=2000)
        .map(|i| Channel {
            stream_id: ItemId::Number(i),
            name: format!("Channel {}", i),
            category_id: Some(ItemId::Number(1)),
            ..Default::default()
        })
        .collect();
    let catalog = LiveCatalog::new(vec![Category::new(1, "News")], channels);
    let store = Arc::new(CountingStore::default());
    let screen = LiveScreen::new(
        catalog,
        store.clone(),
        &tuning,
        client(),
        Box::new(RecordingFactory::new()),
    );
    let mut app = App::new(ActiveScreen::Live(Box::new(screen)), client(), tuning);

    let before = store.reads.load(Ordering::SeqCst);
    let text = rendered_text(&mut app);
    let reads = store.reads.load(Ordering::SeqCst) - before;
    assert!(text.contains("CHANNELS (2000)"));
    assert!(reads <= 2, "{} store reads for one frame", reads);
}

#[test]
fn test_large_movie_grid_reads_favorites_once_per_frame() {
    let tuning = Tuning::default();
    let movies = (1..=2000)
        .map(|i| Movie {
            stream_id: ItemId::Number(i),
            name: format!("Movie {}", i),
            category_id: Some(ItemId::Number(1)),
            ..Default::default()
        })
        .collect();
    let catalog = VodCatalog::new(vec![Category::new(1, "Drama")], movies);
    let store = Arc::new(CountingStore::default());
    let screen = VodScreen::new(
        catalog,
        store.clone(),
        &tuning,
        client(),
        Box::new(RecordingFactory::new()),
    );
    let mut app = App::new(ActiveScreen::Vod(Box::new(screen)), client(), tuning);

    let before = store.reads.load(Ordering::SeqCst);
    rendered_text(&mut app);
    let reads = store.reads.load(Ordering::SeqCst) - before;
    assert!(reads <= 2, "{} store reads for one frame", reads);
}
