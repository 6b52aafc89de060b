//! Data models for discovered and enriched listing items.

mod candidate;
mod record;

pub use candidate::CandidateItem;
pub use record::{EnrichedRecord, MaterializedRecord};
