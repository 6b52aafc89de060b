//! Markup extraction: listing tiles and detail-page fields.

mod detail;
mod selectors;
mod tiles;

pub use detail::{DetailFields, DetailParser};
pub use selectors::{DetailSelectors, TileSelectors};
pub use tiles::TileExtractor;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
    #[error("Invalid base URL '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Compile a CSS selector, keeping the offending text in the error.
pub(crate) fn compile(selector: &str) -> Result<scraper::Selector, ExtractError> {
    scraper::Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn parse_base(url: &str) -> Result<url::Url, ExtractError> {
    url::Url::parse(url).map_err(|source| ExtractError::BaseUrl {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_selector_is_reported() {
        match compile("li[") {
            Err(ExtractError::Selector { selector, .. }) => assert_eq!(selector, "li["),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_relative_base_rejected() {
        assert!(parse_base("/shop/").is_err());
    }
}
