use std::time::Instant;

use tokio::sync::mpsc;

use crate::app::{ActiveScreen, App, AsyncAction};
use crate::errors::{FetchStage, IptvError};
use crate::screens::Effect;

/// Carry out what a screen asked for. Returns true when the screen wants to
/// be left, which for a single-screen host means quitting.
pub fn perform_effects(
    app: &mut App,
    effects: Vec<Effect>,
    tx: &mpsc::Sender<AsyncAction>,
    now: Instant,
) -> bool {
    let mut leave = false;
    for effect in effects {
        match effect {
            Effect::NavigateBack => leave = true,
            Effect::Notify(message) => app.notify(message, now),
            Effect::FetchEpg { tag, stream_id } => {
                let client = app.client.clone();
                let limit = app.tuning.epg_fetch_limit;
                let tx = tx.clone();
                tokio::spawn(async move {
                    let action = match client.get_short_epg(&stream_id, limit).await {
                        Ok(listings) => AsyncAction::EpgLoaded { tag, listings },
                        Err(e) => AsyncAction::FetchFailed {
                            tag,
                            error: IptvError::Network(FetchStage::Epg, e.to_string()),
                        },
                    };
                    let _ = tx.send(action).await;
                });
            }
            Effect::FetchMovieInfo { tag, vod_id } => {
                let client = app.client.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let action = match client.get_vod_info(&vod_id).await {
                        Ok(info) => AsyncAction::MovieInfoLoaded { tag, info },
                        Err(e) => AsyncAction::FetchFailed {
                            tag,
                            error: IptvError::Network(FetchStage::MovieInfo, e.to_string()),
                        },
                    };
                    let _ = tx.send(action).await;
                });
            }
        }
    }
    leave
}

pub fn handle_async_action(app: &mut App, action: AsyncAction) {
    match (&mut app.screen, action) {
        (ActiveScreen::Live(screen), AsyncAction::EpgLoaded { tag, listings }) => {
            screen.apply_epg(tag, &listings);
        }
        (ActiveScreen::Vod(screen), AsyncAction::MovieInfoLoaded { tag, info }) => {
            screen.apply_movie_info(tag, info);
        }
        (ActiveScreen::Live(screen), AsyncAction::FetchFailed { tag, error }) => {
            tracing::warn!("{}", error);
            screen.epg_failed(tag);
        }
        (_, AsyncAction::FetchFailed { error, .. }) => {
            // Overlay keeps the listing fields it already has
            tracing::warn!("{}", error);
        }
        (_, action) => {
            tracing::debug!(?action, "response for another screen dropped");
        }
    }
}
