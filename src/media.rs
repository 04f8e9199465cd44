//! Exclusive attach/detach of a streaming engine to a source.
//!
//! A session owns at most one engine. `attach` always runs a full `detach`
//! first, so there is never a window with two live decoders. Playback start
//! is best-effort: engine failures are logged and swallowed.

use std::time::{Duration, Instant};

use crate::engine::{EngineFactory, MediaSource, StreamEngine, VideoSink};
use crate::timer::CancellableTimer;

/// Wait between unmute attempts while the engine's control channel comes up
const UNMUTE_RETRY: Duration = Duration::from_millis(250);
const MAX_UNMUTE_ATTEMPTS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPolicy {
    /// Start muted and unmute after the delay; masks autoplay rejections on live TV
    MutedThenUnmute(Duration),
    Direct,
}

pub struct MediaSession {
    factory: Box<dyn EngineFactory>,
    policy: StartPolicy,
    sink: VideoSink,
    engine: Option<Box<dyn StreamEngine>>,
    source: Option<MediaSource>,
    unmute: CancellableTimer,
    unmute_attempts: u32,
    paused: bool,
}

impl MediaSession {
    pub fn new(factory: Box<dyn EngineFactory>, policy: StartPolicy, sink: VideoSink) -> Self {
        Self {
            factory,
            policy,
            sink,
            engine: None,
            source: None,
            unmute: CancellableTimer::new(),
            unmute_attempts: 0,
            paused: false,
        }
    }

    /// Live channels: muted start, delayed unmute
    pub fn live(factory: Box<dyn EngineFactory>, unmute_delay: Duration) -> Self {
        Self::new(
            factory,
            StartPolicy::MutedThenUnmute(unmute_delay),
            VideoSink::default(),
        )
    }

    pub fn vod(factory: Box<dyn EngineFactory>) -> Self {
        Self::new(factory, StartPolicy::Direct, VideoSink::default())
    }

    pub fn is_attached(&self) -> bool {
        self.engine.is_some()
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn unmute_pending(&self) -> bool {
        self.unmute.is_armed()
    }

    pub fn attach(&mut self, source: MediaSource, now: Instant) {
        self.detach();

        let mut engine = self.factory.create(source.kind);
        let prepared = engine
            .load(&source.url)
            .and_then(|_| engine.attach(&self.sink));
        if let Err(e) = prepared {
            tracing::warn!("engine rejected {}: {}", source.url, e);
            engine.destroy();
            return;
        }

        if let StartPolicy::MutedThenUnmute(delay) = self.policy {
            if let Err(e) = engine.set_muted(true) {
                tracing::warn!("muted start unavailable: {}", e);
            }
            self.unmute.arm(now, delay);
            self.unmute_attempts = 0;
        }
        if let Err(e) = engine.play() {
            tracing::warn!("playback start failed for {}: {}", source.url, e);
        }

        tracing::info!(kind = ?source.kind, "attached {}", source.url);
        self.engine = Some(engine);
        self.source = Some(source);
        self.paused = false;
    }

    /// Idempotent; safe when nothing was ever attached
    pub fn detach(&mut self) {
        self.unmute.cancel();
        self.paused = false;
        if let Some(mut engine) = self.engine.take() {
            let _ = engine.pause();
            engine.destroy();
            if let Some(source) = self.source.take() {
                tracing::info!("detached {}", source.url);
            }
        }
        self.source = None;
    }

    pub fn pause(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.pause() {
                tracing::warn!("pause failed: {}", e);
            }
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.play() {
                tracing::warn!("resume failed: {}", e);
            }
            self.paused = false;
        }
    }

    /// Drive the delayed unmute. A failed unmute is retried a bounded number
    /// of times so a slow engine start does not leave live audio muted.
    pub fn tick(&mut self, now: Instant) {
        if !self.unmute.poll(now) {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        self.unmute_attempts += 1;
        match engine.set_muted(false) {
            Ok(()) => self.unmute_attempts = 0,
            Err(e) if self.unmute_attempts < MAX_UNMUTE_ATTEMPTS => {
                tracing::debug!(attempt = self.unmute_attempts, "unmute failed, retrying: {}", e);
                self.unmute.arm(now, UNMUTE_RETRY);
            }
            Err(e) => {
                tracing::warn!("unmute failed after {} attempts: {}", self.unmute_attempts, e);
                self.unmute_attempts = 0;
            }
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.detach();
    }
}
