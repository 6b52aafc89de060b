//! Enrichment service types and events.

use std::time::Duration;

/// Events emitted while enriching candidates.
#[derive(Debug, Clone)]
pub enum EnrichEvent {
    /// Worker picked up the candidate at `index` (discovery order).
    Started { index: usize, url: String },
    /// Record produced; `errors` counts the entries on its error list.
    Completed {
        index: usize,
        url: String,
        errors: usize,
    },
    /// Worker died before producing a record.
    Failed {
        index: usize,
        url: String,
        error: String,
    },
}

/// Configuration for the enrichment pool.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub workers: usize,
    pub request_timeout: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            workers: 12,
            request_timeout: Duration::from_secs(12),
        }
    }
}
