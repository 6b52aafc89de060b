//! JSON output for harvested records.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::models::MaterializedRecord;

/// One record as written to the output file.
///
/// `asset_url` is the asset that was (or would be) downloaded: the
/// detail-page image when there is one, else the listing preview.
#[derive(Debug, Serialize)]
pub struct OutputRecord<'a> {
    pub title: Option<&'a str>,
    pub detail_url: &'a str,
    pub price: Option<&'a str>,
    pub discount_price: Option<&'a str>,
    pub rating: Option<&'a str>,
    pub attributes: &'a BTreeMap<String, String>,
    pub asset_url: Option<&'a str>,
    pub local_asset_path: Option<String>,
    pub errors: &'a [String],
}

impl<'a> From<&'a MaterializedRecord> for OutputRecord<'a> {
    fn from(item: &'a MaterializedRecord) -> Self {
        let record = &item.record;
        Self {
            title: record.candidate.preview_title.as_deref(),
            detail_url: &record.candidate.detail_url,
            price: record.price.as_deref(),
            discount_price: record.discount_price.as_deref(),
            rating: record.rating.as_deref(),
            attributes: &record.attributes,
            asset_url: record.effective_asset_url(),
            local_asset_path: item
                .local_asset_path
                .as_ref()
                .map(|p| p.display().to_string()),
            errors: &record.errors,
        }
    }
}

/// Render records as a pretty-printed JSON array.
pub fn to_json(records: &[MaterializedRecord]) -> serde_json::Result<String> {
    let rows: Vec<OutputRecord<'_>> = records.iter().map(OutputRecord::from).collect();
    serde_json::to_string_pretty(&rows)
}

/// Write records to `path`, creating parent directories as needed.
pub async fn write_records(path: &Path, records: &[MaterializedRecord]) -> anyhow::Result<()> {
    let json = to_json(records).context("Failed to serialize records")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
