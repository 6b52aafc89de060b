//! Asset download types and events.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::scrapers::FetchError;

/// Events emitted while materializing assets.
#[derive(Debug, Clone)]
pub enum AssetEvent {
    /// Download started for an asset URL
    Started { url: String },
    /// Asset written to disk
    Completed {
        url: String,
        path: PathBuf,
        bytes: u64,
    },
    /// Download or write failed; the record keeps no local path
    Failed { url: String, error: String },
}

/// Why a single asset could not be stored.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for the asset materializer.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub assets_dir: PathBuf,
    pub workers: usize,
    pub request_timeout: Duration,
}

impl AssetConfig {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            workers: 8,
            request_timeout: Duration::from_secs(12),
        }
    }
}
