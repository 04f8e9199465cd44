//! Streaming engine seam.
//!
//! `MediaSession` only talks to [`StreamEngine`]; the concrete engine is picked
//! per [`SourceKind`] by an [`EngineFactory`]. The production adapter drives an
//! external mpv process and reaches it through mpv's JSON IPC socket.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Manifest plus chunked segments (HLS)
    Segmented,
    /// Single file played directly
    Progressive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub url: String,
    pub kind: SourceKind,
}

impl MediaSource {
    pub fn new(url: String, kind: SourceKind) -> Self {
        Self { url, kind }
    }

    /// Infer the kind from the URL: `.m3u8` is segmented
    pub fn from_url(url: String) -> Self {
        let kind = if url.to_ascii_lowercase().ends_with(".m3u8") {
            SourceKind::Segmented
        } else {
            SourceKind::Progressive
        };
        Self { url, kind }
    }
}

/// Where decoded video goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSink {
    pub title: String,
    pub fullscreen: bool,
}

impl Default for VideoSink {
    fn default() -> Self {
        Self {
            title: "tenfoot".to_string(),
            fullscreen: true,
        }
    }
}

pub trait StreamEngine {
    fn load(&mut self, url: &str) -> Result<(), anyhow::Error>;
    fn attach(&mut self, sink: &VideoSink) -> Result<(), anyhow::Error>;
    fn play(&mut self) -> Result<(), anyhow::Error>;
    fn pause(&mut self) -> Result<(), anyhow::Error>;
    fn set_muted(&mut self, muted: bool) -> Result<(), anyhow::Error>;
    /// Release every resource. Must tolerate repeated calls.
    fn destroy(&mut self);
}

pub trait EngineFactory {
    fn create(&mut self, kind: SourceKind) -> Box<dyn StreamEngine>;
}

/// Per-kind mpv configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MpvProfile {
    /// Low-latency adaptive streaming with a demuxer worker thread
    Adaptive,
    /// Plain file playback
    Direct,
}

impl MpvProfile {
    fn args(&self) -> &'static [&'static str] {
        match self {
            MpvProfile::Adaptive => &[
                "--profile=low-latency",
                "--cache=yes",
                "--demuxer-thread=yes",
                "--demuxer-max-bytes=64MiB",
                "--hls-bitrate=max",
            ],
            MpvProfile::Direct => &[
                "--cache=yes",
                "--demuxer-max-bytes=128MiB",
                "--demuxer-max-back-bytes=32MiB",
            ],
        }
    }
}

pub struct MpvEngine {
    profile: MpvProfile,
    url: Option<String>,
    sink: Option<VideoSink>,
    muted: bool,
    process: Option<Child>,
    ipc_path: PathBuf,
}

impl MpvEngine {
    fn new(profile: MpvProfile, ipc_path: PathBuf) -> Self {
        Self {
            profile,
            url: None,
            sink: None,
            muted: false,
            process: None,
            ipc_path,
        }
    }

    fn is_running(&mut self) -> bool {
        match self.process.as_mut() {
            // try_wait returns Ok(None) while the process is alive
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn spawn(&mut self) -> Result<(), anyhow::Error> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("play requested before load"))?;
        let sink = self.sink.clone().unwrap_or_default();

        let mut cmd = Command::new("mpv");
        cmd.arg(&url)
            .arg("--force-window")
            .arg("--msg-level=all=no")
            .arg("--term-status-msg=no")
            .arg("--hwdec=auto")
            .arg(format!("--title={}", sink.title))
            .arg(format!("--mute={}", if self.muted { "yes" } else { "no" }))
            .arg(format!("--input-ipc-server={}", self.ipc_path.display()))
            .args(self.profile.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if sink.fullscreen {
            cmd.arg("--fs");
        }

        let child = cmd.spawn().map_err(|e| {
            anyhow::anyhow!("Failed to start mpv: {}. Make sure mpv is installed and in PATH.", e)
        })?;
        self.process = Some(child);
        Ok(())
    }

    fn send_ipc(&self, command: serde_json::Value) -> Result<(), anyhow::Error> {
        let mut line = serde_json::to_string(&serde_json::json!({ "command": command }))?;
        line.push('\n');
        write_ipc(&self.ipc_path, line.as_bytes())
    }
}

#[cfg(unix)]
fn write_ipc(path: &std::path::Path, payload: &[u8]) -> Result<(), anyhow::Error> {
    use std::io::Write;
    // mpv creates the socket some time after the process starts
    if !path.exists() {
        anyhow::bail!("mpv IPC socket {} not ready", path.display());
    }
    let mut stream = std::os::unix::net::UnixStream::connect(path)?;
    stream.write_all(payload)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_ipc(path: &std::path::Path, payload: &[u8]) -> Result<(), anyhow::Error> {
    use std::io::Write;
    let mut pipe = std::fs::OpenOptions::new().write(true).open(path)?;
    pipe.write_all(payload)?;
    Ok(())
}

impl StreamEngine for MpvEngine {
    fn load(&mut self, url: &str) -> Result<(), anyhow::Error> {
        self.url = Some(url.to_string());
        Ok(())
    }

    fn attach(&mut self, sink: &VideoSink) -> Result<(), anyhow::Error> {
        self.sink = Some(sink.clone());
        Ok(())
    }

    fn play(&mut self) -> Result<(), anyhow::Error> {
        if self.is_running() {
            return self.send_ipc(serde_json::json!(["set_property", "pause", false]));
        }
        self.spawn()
    }

    fn pause(&mut self) -> Result<(), anyhow::Error> {
        if !self.is_running() {
            return Ok(());
        }
        self.send_ipc(serde_json::json!(["set_property", "pause", true]))
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), anyhow::Error> {
        self.muted = muted;
        if !self.is_running() {
            return Ok(());
        }
        self.send_ipc(serde_json::json!(["set_property", "mute", muted]))
    }

    fn destroy(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        #[cfg(unix)]
        {
            let _ = std::fs::remove_file(&self.ipc_path);
        }
        self.url = None;
        self.sink = None;
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Creates mpv engines; each instance gets its own IPC endpoint
#[derive(Debug, Default)]
pub struct MpvFactory {
    created: u64,
}

impl MpvFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_ipc_path(&mut self) -> PathBuf {
        self.created += 1;
        let name = format!("tenfoot_mpv_{}_{}", std::process::id(), self.created);
        if cfg!(windows) {
            PathBuf::from(format!("\\\\.\\pipe\\{}", name))
        } else {
            std::env::temp_dir().join(format!("{}.sock", name))
        }
    }
}

impl EngineFactory for MpvFactory {
    fn create(&mut self, kind: SourceKind) -> Box<dyn StreamEngine> {
        let profile = match kind {
            SourceKind::Segmented => MpvProfile::Adaptive,
            SourceKind::Progressive => MpvProfile::Direct,
        };
        Box::new(MpvEngine::new(profile, self.next_ipc_path()))
    }
}

/// What a [`RecordingEngine`] was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Created { engine: u64, kind: SourceKind },
    Loaded { engine: u64, url: String },
    Attached { engine: u64 },
    Played { engine: u64 },
    Paused { engine: u64 },
    Muted { engine: u64, muted: bool },
    Destroyed { engine: u64 },
}

pub type EngineLog = Arc<Mutex<Vec<EngineEvent>>>;

/// Engine that decodes nothing and records every call. Backs `--dry-run`
/// and lets tests observe the session protocol.
pub struct RecordingEngine {
    id: u64,
    log: EngineLog,
    destroyed: bool,
    fail_play: bool,
    unmute_failures: Arc<AtomicU32>,
}

impl RecordingEngine {
    fn record(&self, event: EngineEvent) {
        tracing::debug!(?event, "engine");
        if let Ok(mut log) = self.log.lock() {
            log.push(event);
        }
    }
}

impl StreamEngine for RecordingEngine {
    fn load(&mut self, url: &str) -> Result<(), anyhow::Error> {
        self.record(EngineEvent::Loaded { engine: self.id, url: url.to_string() });
        Ok(())
    }

    fn attach(&mut self, _sink: &VideoSink) -> Result<(), anyhow::Error> {
        self.record(EngineEvent::Attached { engine: self.id });
        Ok(())
    }

    fn play(&mut self) -> Result<(), anyhow::Error> {
        self.record(EngineEvent::Played { engine: self.id });
        if self.fail_play {
            anyhow::bail!("autoplay rejected");
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), anyhow::Error> {
        self.record(EngineEvent::Paused { engine: self.id });
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), anyhow::Error> {
        let fail = !muted
            && self
                .unmute_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if fail {
            anyhow::bail!("control channel not ready");
        }
        self.record(EngineEvent::Muted { engine: self.id, muted });
        Ok(())
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.record(EngineEvent::Destroyed { engine: self.id });
        }
    }
}

#[derive(Default)]
pub struct RecordingFactory {
    log: EngineLog,
    created: u64,
    fail_play: bool,
    unmute_failures: Arc<AtomicU32>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every engine created by this factory rejects `play`
    pub fn failing_play() -> Self {
        Self {
            fail_play: true,
            ..Self::default()
        }
    }

    /// The next `count` unmute requests fail, across all engines of this factory
    pub fn failing_unmutes(count: u32) -> Self {
        Self {
            unmute_failures: Arc::new(AtomicU32::new(count)),
            ..Self::default()
        }
    }

    pub fn log(&self) -> EngineLog {
        self.log.clone()
    }
}

impl EngineFactory for RecordingFactory {
    fn create(&mut self, kind: SourceKind) -> Box<dyn StreamEngine> {
        self.created += 1;
        let engine = RecordingEngine {
            id: self.created,
            log: self.log.clone(),
            destroyed: false,
            fail_play: self.fail_play,
            unmute_failures: self.unmute_failures.clone(),
        };
        engine.record(EngineEvent::Created { engine: self.created, kind });
        Box::new(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_inferred_from_extension() {
        assert_eq!(
            MediaSource::from_url("http://x/live/1.M3U8".into()).kind,
            SourceKind::Segmented
        );
        assert_eq!(
            MediaSource::from_url("http://x/movie/1.mkv".into()).kind,
            SourceKind::Progressive
        );
    }

    #[test]
    fn factory_picks_profile_per_kind() {
        let mut factory = MpvFactory::new();
        let a = factory.next_ipc_path();
        let b = factory.next_ipc_path();
        assert_ne!(a, b);
        assert!(MpvProfile::Adaptive.args().contains(&"--demuxer-thread=yes"));
        assert!(!MpvProfile::Direct.args().contains(&"--profile=low-latency"));
    }

    #[test]
    fn unspawned_engine_is_inert() {
        let mut engine = MpvEngine::new(MpvProfile::Direct, std::env::temp_dir().join("unused.sock"));
        engine.load("http://x/movie/1.mp4").unwrap();
        engine.attach(&VideoSink::default()).unwrap();
        assert!(engine.pause().is_ok());
        assert!(engine.set_muted(true).is_ok());
        engine.destroy();
        engine.destroy();
    }
}
