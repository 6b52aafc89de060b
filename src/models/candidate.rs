//! Items discovered on the listing page.

use serde::{Deserialize, Serialize};

/// A listing tile that has been discovered but not yet enriched.
///
/// Identity is `dedup_key`: the canonical (fragment-free) detail URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub dedup_key: String,
    pub detail_url: String,
    pub preview_title: Option<String>,
    pub preview_asset_url: Option<String>,
}

impl CandidateItem {
    /// Create a candidate keyed by its detail URL with the fragment removed.
    pub fn new(detail_url: impl Into<String>) -> Self {
        let detail_url = detail_url.into();
        Self {
            dedup_key: canonical_key(&detail_url),
            detail_url,
            preview_title: None,
            preview_asset_url: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.preview_title = title;
        self
    }

    pub fn with_preview_asset(mut self, asset_url: Option<String>) -> Self {
        self.preview_asset_url = asset_url;
        self
    }
}

fn canonical_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.split('#').next().unwrap_or(url).to_string(),
    }
}
