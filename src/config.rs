use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::IptvError;

/// Connection details for the provider, written by the setup flow
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerProfile {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
}

fn default_protocol() -> String {
    "http".to_string()
}

impl ServerProfile {
    /// `protocol://host[:port]` with no trailing slash
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        match self.port {
            Some(port) => format!("{}://{}:{}", self.protocol, host, port),
            None => format!("{}://{}", self.protocol, host),
        }
    }
}

/// Timing and policy knobs for the navigation core
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Tuning {
    /// Hold time before a press becomes a favorite toggle
    pub long_press_ms: u64,
    /// Delay before live playback is unmuted
    pub unmute_delay_ms: u64,
    /// Columns of the VOD poster grid
    pub grid_columns: usize,
    /// Programs requested per short-EPG call
    pub epg_fetch_limit: usize,
    /// Category names containing any of these (case-insensitive) require the PIN
    pub restricted_keywords: Vec<String>,
    /// PIN used when the store has none
    pub default_pin: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            long_press_ms: 800,
            unmute_delay_ms: 800,
            grid_columns: 4,
            epg_fetch_limit: 6,
            restricted_keywords: vec!["adult".to_string()],
            default_pin: "0000".to_string(),
        }
    }
}

impl Tuning {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn unmute_delay(&self) -> Duration {
        Duration::from_millis(self.unmute_delay_ms)
    }

    /// Zero columns would make every grid move a boundary; treat it as one column
    pub fn columns(&self) -> usize {
        self.grid_columns.max(1)
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: Option<ServerProfile>,
    #[serde(default)]
    pub tuning: Tuning,
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tenfoot", "tenfoot-iptv")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "tenfoot", "tenfoot-iptv").map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Load from the platform config dir; a missing file yields defaults
    pub fn load() -> Result<Self, anyhow::Error> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(AppConfig::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, anyhow::Error> {
        if !path.exists() {
            tracing::info!("no config at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), anyhow::Error> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        if let Some(path) = Self::default_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    /// The server profile, or the redirect signal the host must act on
    pub fn require_server(&self) -> Result<&ServerProfile, IptvError> {
        match &self.server {
            Some(profile) if !profile.host.is_empty() && !profile.username.is_empty() => Ok(profile),
            _ => Err(IptvError::MissingSession(
                "server profile or username missing".to_string(),
            )),
        }
    }
}
