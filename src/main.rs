use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use tenfoot_iptv_lib::api::XtreamClient;
use tenfoot_iptv_lib::app::{ActiveScreen, App, AsyncAction, ScreenKind};
use tenfoot_iptv_lib::catalog::{
    write_cached, LIVE_CATEGORIES_KEY, LIVE_STREAMS_KEY, VOD_CATEGORIES_KEY, VOD_STREAMS_KEY,
};
use tenfoot_iptv_lib::config::AppConfig;
use tenfoot_iptv_lib::engine::{EngineFactory, MpvFactory, RecordingFactory};
use tenfoot_iptv_lib::errors::IptvError;
use tenfoot_iptv_lib::handlers::async_actions::{handle_async_action, perform_effects};
use tenfoot_iptv_lib::handlers::input::{handle_key_event, InputResult};
use tenfoot_iptv_lib::handlers::mouse::handle_mouse_event;
use tenfoot_iptv_lib::screens::{LiveScreen, VodScreen};
use tenfoot_iptv_lib::store::{JsonFileStore, KeyValueStore, MemoryStore, SharedStore};
use tenfoot_iptv_lib::ui;

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Screen to open
    #[arg(long, value_enum, default_value_t = ScreenKind::Live)]
    screen: ScreenKind,

    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Download listings into the local cache and exit
    #[arg(long)]
    refresh: bool,

    /// Check configuration and cached listings, then exit
    #[arg(long)]
    check: bool,

    /// Do not start a player; engine calls are only logged
    #[arg(long)]
    dry_run: bool,
}

fn init_logging() -> Result<(), anyhow::Error> {
    let Some(dir) = AppConfig::data_dir() else {
        return Ok(());
    };
    std::fs::create_dir_all(&dir)?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("tenfoot.log"))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tenfoot_iptv_lib=debug")),
        )
        .init();
    Ok(())
}

fn open_store() -> SharedStore {
    let opened = JsonFileStore::default_path().map(JsonFileStore::open);
    match opened {
        Some(Ok(store)) => {
            tracing::debug!(path = %store.path().display(), "store opened");
            Arc::new(store)
        }
        Some(Err(e)) => {
            tracing::warn!("store unavailable, favorites will not persist: {}", e);
            MemoryStore::shared()
        }
        None => MemoryStore::shared(),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    init_logging()?;
    tracing::info!("tenfoot starting");

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let store = open_store();

    // -- CLI MODE --
    if args.check {
        return check(&config, &store);
    }
    if args.refresh {
        return refresh(&config, &store).await;
    }

    // -- TUI MODE (Default) --
    let profile = config.require_server().map_err(report)?;
    let client = XtreamClient::new(profile);
    let factory: Box<dyn EngineFactory> = if args.dry_run {
        Box::new(RecordingFactory::new())
    } else {
        Box::new(MpvFactory::new())
    };

    let screen = match args.screen {
        ScreenKind::Live => LiveScreen::mount(store, &config.tuning, client.clone(), factory)
            .map(|s| ActiveScreen::Live(Box::new(s))),
        ScreenKind::Vod => VodScreen::mount(store, &config.tuning, client.clone(), factory)
            .map(|s| ActiveScreen::Vod(Box::new(s))),
    }
    .map_err(report)?;
    let mut app = App::new(screen, client, config.tuning.clone());

    // Setup Terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, mut rx) = mpsc::channel::<AsyncAction>(32);
    let res = run_app(&mut terminal, &mut app, tx, &mut rx).await;

    // Restore Terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Stop playback before the process exits
    drop(app);
    tracing::info!("tenfoot stopped");

    if let Err(err) = res {
        println!("{:?}", err);
    }
    Ok(())
}

/// Print the redirect hint for errors the user fixes outside the TUI
fn report(err: IptvError) -> anyhow::Error {
    if err.is_redirect() {
        eprintln!("{}", err.diagnostics());
    }
    anyhow::Error::new(err)
}

fn check(config: &AppConfig, store: &SharedStore) -> Result<(), anyhow::Error> {
    println!("Checking configuration...");
    match &config.server {
        Some(server) => println!("Server: {} (user {})", server.base_url(), server.username),
        None => {
            println!("Server: not configured");
            if let Some(path) = AppConfig::default_path().filter(|p| !p.exists()) {
                config.save()?;
                println!("Wrote a config template to {}", path.display());
            }
        }
    }
    for key in [LIVE_CATEGORIES_KEY, LIVE_STREAMS_KEY, VOD_CATEGORIES_KEY, VOD_STREAMS_KEY] {
        let state = match store.get(key) {
            Some(raw) => match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
                Ok(items) => format!("{} entries", items.len()),
                Err(_) => "unreadable".to_string(),
            },
            None => "missing (run --refresh)".to_string(),
        };
        println!("{:>16}: {}", key, state);
    }
    Ok(())
}

async fn refresh(config: &AppConfig, store: &SharedStore) -> Result<(), anyhow::Error> {
    let profile = config.require_server().map_err(report)?;
    let client = XtreamClient::new(profile);
    println!("Refreshing listings from {}...", profile.base_url());

    let live_categories = client.get_live_categories().await?;
    let live_streams = client.get_live_streams().await?;
    let vod_categories = client.get_vod_categories().await?;
    let vod_streams = client.get_vod_streams().await?;

    write_cached(store.as_ref(), LIVE_CATEGORIES_KEY, &live_categories)?;
    write_cached(store.as_ref(), LIVE_STREAMS_KEY, &live_streams)?;
    write_cached(store.as_ref(), VOD_CATEGORIES_KEY, &vod_categories)?;
    write_cached(store.as_ref(), VOD_STREAMS_KEY, &vod_streams)?;

    println!(
        "{} channels in {} categories, {} movies in {} categories",
        live_streams.len(),
        live_categories.len(),
        vod_streams.len(),
        vod_categories.len()
    );
    tracing::info!(channels = live_streams.len(), movies = vod_streams.len(), "listings refreshed");
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tx: mpsc::Sender<AsyncAction>,
    rx: &mut mpsc::Receiver<AsyncAction>,
) -> Result<(), anyhow::Error> {
    loop {
        terminal
            .draw(|f| ui::ui(f, app))
            .map_err(|e| anyhow::anyhow!("draw failed: {}", e))?;

        // 1. Fetch results (non-blocking)
        while let Ok(action) = rx.try_recv() {
            handle_async_action(app, action);
        }

        // 2. Timers
        let now = Instant::now();
        let effects = app.tick(now);
        if perform_effects(app, effects, &tx, now) {
            app.should_quit = true;
        }

        // 3. Poll inputs
        if event::poll(Duration::from_millis(50))? {
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) => {
                    if handle_key_event(app, key, &tx, now) == InputResult::Quit {
                        app.should_quit = true;
                    }
                }
                Event::Mouse(mouse) => {
                    if handle_mouse_event(app, mouse, &tx, now) {
                        app.should_quit = true;
                    }
                }
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
