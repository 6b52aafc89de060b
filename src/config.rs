//! Configuration management using the prefer crate.
//!
//! A `Config` file is optional; every field it sets overrides the
//! corresponding `Settings` default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::{DetailSelectors, TileSelectors};
use crate::pagination::PaginationConfig;
use crate::scrapers::BrowserEngineConfig;

/// Environment variable holding the listing URL.
pub const START_URL_ENV: &str = "START_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Listing page to harvest.
    pub start_url: Option<String>,
    pub browser: BrowserEngineConfig,
    pub pagination: PaginationConfig,
    pub tiles: TileSelectors,
    pub detail: DetailSelectors,
    /// User agent for HTTP requests; `None` sends the built-in browser identity.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    pub enrich_workers: usize,
    pub asset_workers: usize,
    /// Pause after opening the listing, before pagination starts.
    pub initial_settle_ms: u64,
    pub output_path: PathBuf,
    pub assets_dir: PathBuf,
    pub download_assets: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_url: None,
            browser: BrowserEngineConfig::default(),
            pagination: PaginationConfig::default(),
            tiles: TileSelectors::default(),
            detail: DetailSelectors::default(),
            user_agent: None,
            request_timeout: 12,
            enrich_workers: 12,
            asset_workers: 8,
            initial_settle_ms: 1200,
            output_path: PathBuf::from("products.json"),
            assets_dir: PathBuf::from("images"),
            download_assets: true,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    /// Browser options for a run whose HTTP requests identify as
    /// `user_agent`. A tab agent set under `[browser]` is kept.
    pub fn browser_config(&self, user_agent: &str) -> BrowserEngineConfig {
        let mut browser = self.browser.clone();
        if browser.user_agent.is_none() {
            browser.user_agent = Some(user_agent.to_string());
        }
        browser
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrich_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_settle_ms: Option<u64>,
    /// Output JSON path (relative to the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Asset directory (relative to the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_assets: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserEngineConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<TileSelectors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailSelectors>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a `tilecrawl` config file in the standard locations.
    /// Missing or unreadable files fall back to defaults.
    pub async fn load() -> Self {
        let Ok(pref_config) = prefer::load("tilecrawl").await else {
            return Self::default();
        };
        let Some(path) = pref_config.source_path() else {
            return Self::default();
        };
        match Self::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// TOML and YAML are chosen by extension; anything else is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, if one was loaded.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Expand `~` and resolve relative paths against `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref browser) = self.browser {
            settings.browser = browser.clone();
        }
        if let Some(headless) = self.headless {
            settings.browser.headless = headless;
        }
        if let Some(ref url) = self.start_url {
            settings.start_url = Some(url.clone());
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(workers) = self.enrich_workers {
            settings.enrich_workers = workers;
        }
        if let Some(workers) = self.asset_workers {
            settings.asset_workers = workers;
        }
        if let Some(settle) = self.initial_settle_ms {
            settings.initial_settle_ms = settle;
        }
        if let Some(ref output) = self.output {
            settings.output_path = self.resolve_path(output, base_dir);
        }
        if let Some(ref dir) = self.assets_dir {
            settings.assets_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(download) = self.download_assets {
            settings.download_assets = download;
        }
        if let Some(ref pagination) = self.pagination {
            settings.pagination = pagination.clone();
        }
        if let Some(ref tiles) = self.tiles {
            settings.tiles = tiles.clone();
        }
        if let Some(ref detail) = self.detail {
            settings.detail = detail.clone();
        }
    }
}

/// Load settings from an explicit config file or by discovery, then apply
/// the `START_URL` environment variable on top.
pub async fn load_settings(config_path: Option<&Path>) -> Result<(Settings, Config), ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Ok(url) = std::env::var(START_URL_ENV) {
        if !url.trim().is_empty() {
            settings.start_url = Some(url);
        }
    }
    Ok((settings, config))
}
