//! tilecrawl - harvest a "load more" product listing.
//!
//! A browser tab drives the listing until every tile is rendered, the tiles
//! are extracted from the final markup, each detail page is fetched and
//! parsed on a bounded pool, and images are optionally downloaded. Output
//! keeps the order in which items were discovered.

pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod output;
pub mod pagination;
pub mod pipeline;
pub mod scrapers;
pub mod services;
pub mod utils;

pub use config::{Config, Settings};
pub use pipeline::{HarvestEvents, HarvestSummary, Harvester};
