use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::scroll::ScrollConfig;

/// Environment variable that overrides [`ApiConfig::base_url`].
pub const API_URL_ENV: &str = "POKEDEX_API_URL";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub tui: TuiConfig,
    pub scroll: ScrollSettings,
    pub data: DataConfig,
}

/// Remote catalog API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
    /// Enable mouse support in the terminal.
    pub mouse_enabled: bool,
    /// Search input debounce in milliseconds.
    pub search_debounce_ms: u64,
}

/// Infinite-scroll timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Visibility signals are ignored for this long after startup.
    pub warmup_ms: u64,
    /// The sentinel must stay visible this long before a page is requested.
    pub debounce_ms: u64,
}

/// Data directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            tui: TuiConfig::default(),
            scroll: ScrollSettings::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 50,
            mouse_enabled: false,
            search_debounce_ms: 300,
        }
    }
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            warmup_ms: 1000,
            debounce_ms: 500,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TuiConfig {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl ScrollSettings {
    pub fn trigger_config(&self) -> ScrollConfig {
        ScrollConfig {
            warmup: Duration::from_millis(self.warmup_ms),
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/pokedex/config.toml`, then apply
    /// the [`API_URL_ENV`] override.
    ///
    /// Runs before logging is initialized, so a parse failure is handed back
    /// as a warning for the caller to log once the subscriber is up.
    pub fn load() -> (Self, Option<String>) {
        let (mut config, warning) = Self::load_from(&Self::config_path());

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.apply_api_url_override(&url);
        }

        (config, warning)
    }

    /// Read a config file. Falls back to `Default` if the file is missing or
    /// unparseable; only the latter produces a warning.
    pub fn load_from(path: &Path) -> (Self, Option<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml(&contents) {
                Ok(config) => (config, None),
                Err(e) => (
                    Self::default(),
                    Some(format!(
                        "Failed to parse config at {}: {e}, using defaults",
                        path.display()
                    )),
                ),
            },
            Err(_) => (Self::default(), None),
        }
    }

    /// Parse a config document.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Replace the API base URL, ignoring blank values.
    pub fn apply_api_url_override(&mut self, url: &str) {
        let url = url.trim().trim_end_matches('/');
        if !url.is_empty() {
            self.api.base_url = url.to_string();
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("pokedex"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// File that holds the last persisted query string.
    pub fn session_path(&self) -> PathBuf {
        self.data_dir().join("session.query")
    }

    /// File that holds the persisted theme preference.
    pub fn theme_path(&self) -> PathBuf {
        self.data_dir().join("theme")
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("pokedex").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
