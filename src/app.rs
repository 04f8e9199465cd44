use std::time::{Duration, Instant};

use ratatui::layout::{Position, Rect};

use crate::api::{EpgListing, VodInfo, XtreamClient};
use crate::config::Tuning;
use crate::errors::IptvError;
use crate::input::InputEvent;
use crate::item_id::ItemId;
use crate::screens::{Effect, LiveScreen, RequestTag, VodScreen};

const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Rows one poster card takes in the VOD grid
pub const GRID_CELL_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScreenKind {
    Live,
    Vod,
}

pub enum ActiveScreen {
    Live(Box<LiveScreen>),
    Vod(Box<VodScreen>),
}

/// Results of the fetches spawned for screen effects
#[derive(Debug)]
pub enum AsyncAction {
    EpgLoaded {
        tag: RequestTag,
        listings: Vec<EpgListing>,
    },
    MovieInfoLoaded {
        tag: RequestTag,
        info: VodInfo,
    },
    FetchFailed {
        tag: RequestTag,
        error: IptvError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub expires: Instant,
}

pub struct App {
    pub screen: ActiveScreen,
    pub client: XtreamClient,
    pub tuning: Tuning,
    pub notification: Option<Notification>,
    pub should_quit: bool,
    /// Item under the pointer since the last button press
    pub pressed: Option<ItemId>,

    // Layout captured during render, used for mouse hit tests
    pub area_categories: Rect,
    pub area_channels: Rect,
    pub area_grid: Rect,
    pub channel_offset: usize,
    pub grid_row_offset: usize,
}

impl App {
    pub fn new(screen: ActiveScreen, client: XtreamClient, tuning: Tuning) -> App {
        App {
            screen,
            client,
            tuning,
            notification: None,
            should_quit: false,
            pressed: None,
            area_categories: Rect::default(),
            area_channels: Rect::default(),
            area_grid: Rect::default(),
            channel_offset: 0,
            grid_row_offset: 0,
        }
    }

    pub fn dispatch(&mut self, event: InputEvent, now: Instant) -> Vec<Effect> {
        match &mut self.screen {
            ActiveScreen::Live(screen) => screen.handle(event, now),
            ActiveScreen::Vod(screen) => screen.handle(event, now),
        }
    }

    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        if self
            .notification
            .as_ref()
            .map(|n| now >= n.expires)
            .unwrap_or(false)
        {
            self.notification = None;
        }
        match &mut self.screen {
            ActiveScreen::Live(screen) => screen.tick(now),
            ActiveScreen::Vod(screen) => screen.tick(now),
        }
    }

    pub fn notify(&mut self, message: String, now: Instant) {
        self.notification = Some(Notification {
            message,
            expires: now + NOTIFICATION_TTL,
        });
    }

    /// Channel row or poster card under the terminal cell `(x, y)`
    pub fn item_at(&self, x: u16, y: u16) -> Option<ItemId> {
        let pos = Position::new(x, y);
        match &self.screen {
            ActiveScreen::Live(screen) => {
                let area = self.area_channels;
                // Skip the block border
                if !area.contains(pos) || y == area.y || y + 1 >= area.y + area.height {
                    return None;
                }
                let row = (y - area.y - 1) as usize + self.channel_offset;
                screen.channels().get(row).map(|c| c.stream_id.clone())
            }
            ActiveScreen::Vod(screen) => {
                let area = self.area_grid;
                if !area.contains(pos) || area.width < 2 {
                    return None;
                }
                let columns = screen.columns().max(1);
                let cell_width = (area.width / columns as u16).max(1);
                let col = ((x - area.x) / cell_width) as usize;
                if col >= columns {
                    return None;
                }
                let row = ((y - area.y) / GRID_CELL_HEIGHT) as usize + self.grid_row_offset;
                screen
                    .movies()
                    .get(row * columns + col)
                    .map(|m| m.stream_id.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Category, Channel};
    use crate::catalog::LiveCatalog;
    use crate::config::ServerProfile;
    use crate::engine::RecordingFactory;
    use crate::store::MemoryStore;

    fn live_app() -> App {
        let client = XtreamClient::new(&ServerProfile {
            protocol: "http".into(),
            host: "tv.example".into(),
            port: None,
            username: "u".into(),
            password: "p".into(),
        });
        let catalog = LiveCatalog::new(
            vec![Category::new(1, "News")],
            (1..=3)
                .map(|i| Channel {
                    stream_id: ItemId::Number(i),
                    name: format!("Ch {}", i),
                    ..Default::default()
                })
                .collect(),
        );
        let tuning = Tuning::default();
        let screen = LiveScreen::new(
            catalog,
            MemoryStore::shared(),
            &tuning,
            client.clone(),
            Box::new(RecordingFactory::new()),
        );
        App::new(ActiveScreen::Live(Box::new(screen)), client, tuning)
    }

    #[test]
    fn notification_expires_on_tick() {
        let mut app = live_app();
        let t0 = Instant::now();
        app.notify("Added to favorites".into(), t0);
        app.tick(t0 + Duration::from_secs(1));
        assert!(app.notification.is_some());
        app.tick(t0 + NOTIFICATION_TTL);
        assert!(app.notification.is_none());
    }

    #[test]
    fn channel_hit_test_skips_border() {
        let mut app = live_app();
        app.area_channels = Rect::new(10, 0, 30, 10);
        assert_eq!(app.item_at(12, 0), None);
        assert_eq!(app.item_at(12, 1), Some(ItemId::Number(1)));
        assert_eq!(app.item_at(12, 3), Some(ItemId::Number(3)));
        assert_eq!(app.item_at(12, 4), None);
        assert_eq!(app.item_at(5, 1), None);
    }
}
