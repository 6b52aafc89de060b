//! Shared utility functions.
//!
//! - `html`: text and attribute helpers over parsed markup
//! - `filename`: safe on-disk names for downloaded assets

mod filename;
mod html;

pub use filename::{asset_file_name, unique_file_names};
pub use html::{first_asset_url, non_empty, resolve_url, text_of};
