//! Enriched and materialized records.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::CandidateItem;

/// A candidate plus the fields parsed from its detail page.
///
/// Every enrichment field is optional; a field the page did not provide
/// stays `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub candidate: CandidateItem,
    pub price: Option<String>,
    pub discount_price: Option<String>,
    pub rating: Option<String>,
    pub attributes: BTreeMap<String, String>,
    /// Asset found on the detail page; takes precedence over the preview.
    pub asset_url: Option<String>,
    pub errors: Vec<String>,
}

impl EnrichedRecord {
    /// Fresh, unenriched record owned by whoever enriches `candidate`.
    pub fn from_candidate(candidate: CandidateItem) -> Self {
        Self {
            candidate,
            price: None,
            discount_price: None,
            rating: None,
            attributes: BTreeMap::new(),
            asset_url: None,
            errors: Vec::new(),
        }
    }

    /// Unenriched record carrying a single error.
    pub fn failed(candidate: CandidateItem, error: impl Into<String>) -> Self {
        let mut record = Self::from_candidate(candidate);
        record.errors.push(error.into());
        record
    }

    pub fn dedup_key(&self) -> &str {
        &self.candidate.dedup_key
    }

    /// Asset to download: the detail page's, else the listing preview.
    pub fn effective_asset_url(&self) -> Option<&str> {
        self.asset_url
            .as_deref()
            .or(self.candidate.preview_asset_url.as_deref())
    }
}

/// An enriched record after its asset has (or has not) been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedRecord {
    #[serde(flatten)]
    pub record: EnrichedRecord,
    pub local_asset_path: Option<PathBuf>,
}

impl MaterializedRecord {
    pub fn new(record: EnrichedRecord, local_asset_path: Option<PathBuf>) -> Self {
        Self {
            record,
            local_asset_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_asset_prefers_detail_page() {
        let candidate = CandidateItem::new("https://shop.test/p/1")
            .with_preview_asset(Some("https://shop.test/thumb.jpg".to_string()));
        let mut record = EnrichedRecord::from_candidate(candidate);
        assert_eq!(
            record.effective_asset_url(),
            Some("https://shop.test/thumb.jpg")
        );

        record.asset_url = Some("https://shop.test/full.jpg".to_string());
        assert_eq!(record.effective_asset_url(), Some("https://shop.test/full.jpg"));
    }

    #[test]
    fn test_failed_record_is_unenriched() {
        let record = EnrichedRecord::failed(CandidateItem::new("https://shop.test/p/1"), "boom");
        assert_eq!(record.errors, vec!["boom".to_string()]);
        assert!(record.price.is_none());
        assert!(record.attributes.is_empty());
        assert!(record.asset_url.is_none());
    }
}
