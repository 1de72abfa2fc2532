use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use jobdeck_core::UndoPolicy;
use jobdeck_engine::FetchSettings;
use serde::{Deserialize, Serialize};

use super::logging::LogSettings;

pub const CONFIG_FILENAME: &str = "jobdeck.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory for the persisted overlay; `None` keeps actions in memory only.
    pub state_dir: Option<PathBuf>,
    /// Snapshot endpoint; `None` runs local-only.
    pub server_url: Option<String>,
    /// Present when the identity provider has signed the user in.
    pub auth_token: Option<String>,
    pub login_url: String,
    /// `None` keeps undo available until dismissed.
    pub grace_window_ms: Option<u64>,
    pub log: LogSettings,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_snapshot_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            state_dir: Some(PathBuf::from(".jobdeck")),
            server_url: None,
            auth_token: None,
            login_url: "https://example.com/login".to_string(),
            grace_window_ms: Some(5_000),
            log: LogSettings::default(),
            connect_timeout_ms: fetch.connect_timeout.as_millis() as u64,
            request_timeout_ms: fetch.request_timeout.as_millis() as u64,
            max_snapshot_bytes: fetch.max_bytes,
        }
    }
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn undo_policy(&self) -> UndoPolicy {
        match self.grace_window_ms {
            Some(ms) => UndoPolicy::After(Duration::from_millis(ms)),
            None => UndoPolicy::UntilDismissed,
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_bytes: self.max_snapshot_bytes,
        }
    }
}
