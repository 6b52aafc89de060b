//! Asset materialization.
//!
//! Downloads each record's effective asset into a local directory on a
//! bounded pool. Separated from UI concerns - emits events for progress
//! tracking.

mod types;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::models::{EnrichedRecord, MaterializedRecord};
use crate::scrapers::{FetchResponse, PageFetcher};
use crate::utils::unique_file_names;

pub use types::{AssetConfig, AssetError, AssetEvent};

/// Service for storing record assets on disk.
pub struct AssetService {
    fetcher: Arc<dyn PageFetcher>,
    config: AssetConfig,
}

impl AssetService {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: AssetConfig) -> Self {
        Self { fetcher, config }
    }

    /// Materialize `records`, returning them in the same order.
    ///
    /// Records without an asset URL pass through with no local path and
    /// no download. A failed download only clears that record's path.
    pub async fn materialize(
        &self,
        records: Vec<EnrichedRecord>,
        event_tx: Option<mpsc::Sender<AssetEvent>>,
    ) -> Vec<MaterializedRecord> {
        let workers = self.config.workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));

        let jobs: Vec<(String, String)> = records
            .iter()
            .filter_map(|r| {
                r.effective_asset_url()
                    .map(|url| (r.dedup_key().to_string(), url.to_string()))
            })
            .collect();
        info!(
            "Downloading {} assets into {} with {} workers",
            jobs.len(),
            self.config.assets_dir.display(),
            workers
        );

        // Names are fixed before dispatch so no two workers share a file.
        let names = unique_file_names(jobs.iter().map(|(_, url)| url.as_str()));

        let handles: Vec<_> = jobs
            .iter()
            .zip(names)
            .map(|((_, url), name)| {
                let fetcher = self.fetcher.clone();
                let semaphore = semaphore.clone();
                let event_tx = event_tx.clone();
                let url = url.clone();
                let path = self.config.assets_dir.join(name);
                let timeout = self.config.request_timeout;

                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    if let Some(tx) = &event_tx {
                        let _ = tx.send(AssetEvent::Started { url: url.clone() }).await;
                    }

                    match download_asset(fetcher.as_ref(), &url, &path, timeout).await {
                        Ok(bytes) => {
                            debug!("Saved {} to {}", url, path.display());
                            if let Some(tx) = &event_tx {
                                let _ = tx
                                    .send(AssetEvent::Completed {
                                        url,
                                        path: path.clone(),
                                        bytes,
                                    })
                                    .await;
                            }
                            Some(path)
                        }
                        Err(e) => {
                            warn!("Asset download failed for {}: {}", url, e);
                            if let Some(tx) = &event_tx {
                                let _ = tx
                                    .send(AssetEvent::Failed {
                                        url,
                                        error: e.to_string(),
                                    })
                                    .await;
                            }
                            None
                        }
                    }
                })
            })
            .collect();

        let outcomes = join_all(handles).await;

        let mut paths: HashMap<String, Option<PathBuf>> = HashMap::with_capacity(jobs.len());
        for ((key, url), outcome) in jobs.into_iter().zip(outcomes) {
            let path = outcome.unwrap_or_else(|e| {
                warn!("Asset worker for {} failed: {}", url, e);
                None
            });
            paths.insert(key, path);
        }

        let stored = paths.values().filter(|p| p.is_some()).count();
        info!("Stored {} of {} assets", stored, paths.len());

        records
            .into_iter()
            .map(|record| {
                let path = paths.get(record.dedup_key()).cloned().flatten();
                MaterializedRecord::new(record, path)
            })
            .collect()
    }
}

/// Fetch `url` and write it to `path`, creating the parent directory.
/// Returns the number of bytes written.
pub async fn download_asset(
    fetcher: &dyn PageFetcher,
    url: &str,
    path: &Path,
    timeout: Duration,
) -> Result<u64, AssetError> {
    let response = fetcher
        .get(url, timeout)
        .await
        .and_then(FetchResponse::error_for_status)?;

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| AssetError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(path, &response.body)
        .await
        .map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(response.body.len() as u64)
}
