use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ChatError;

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";
pub const BACKEND_URL_ENV: &str = "CHAT_BACKEND_URL";

const DEFAULT_BACKEND_URL: &str = "http://localhost:3105";
/// Plain WebSocket STOMP endpoint. A Spring backend that registers `/chat`
/// with SockJS only serves the raw socket at `/chat/websocket`, so point
/// `realtime_path` there for such a backend.
const DEFAULT_REALTIME_PATH: &str = "/chat";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: String,
    /// Path of the STOMP WebSocket endpoint, relative to `backend_url`.
    pub realtime_path: String,
    /// How long a typing indicator stays up without a new signal.
    pub typing_expiry_ms: u64,
    /// Minimum gap between two published typing frames; 0 publishes on
    /// every keystroke.
    pub typing_throttle_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            realtime_path: DEFAULT_REALTIME_PATH.to_string(),
            typing_expiry_ms: 2000,
            typing_throttle_ms: 0,
            request_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn typing_expiry(&self) -> Duration {
        Duration::from_millis(self.typing_expiry_ms)
    }

    pub fn typing_throttle(&self) -> Duration {
        Duration::from_millis(self.typing_throttle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backend_base(&self) -> Result<Url, ChatError> {
        Ok(Url::parse(&self.backend_url)?)
    }

    pub fn websocket_url(&self) -> Result<Url, ChatError> {
        let mut url = self.backend_base()?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| ChatError::Network(format!("cannot use {scheme} for {url}")))?;

        let base_path = url.path().trim_end_matches('/').to_string();
        let realtime_path = self.realtime_path.trim_start_matches('/');
        url.set_path(&format!("{base_path}/{realtime_path}"));
        Ok(url)
    }

    /// Applies `CHAT_BACKEND_URL` when it is set and not blank.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                log::info!("Using backend url from {BACKEND_URL_ENV}");
                self.backend_url = url.trim().to_string();
            }
        }
        self
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
