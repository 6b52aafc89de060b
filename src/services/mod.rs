//! Service layer: enrichment and asset materialization.
//!
//! Services are separated from UI concerns and report progress through
//! optional event channels.

pub mod download;
pub mod enrich;

pub use download::{AssetConfig, AssetError, AssetEvent, AssetService};
pub use enrich::{dedup_candidates, EnrichConfig, EnrichEvent, EnrichService, Enricher};
