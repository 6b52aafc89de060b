//! Browser session value types.

use thiserror::Error;

/// Reference to one element matched by a selector at lookup time.
///
/// Handles are re-resolved on every use, so an element that was replaced
/// in the DOM after the lookup surfaces as an [`BrowserError::Interaction`]
/// rather than acting on a detached node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }
}

/// Errors raised by a browser session.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Element missing, stale, or a script/click rejected by the page.
    #[error("Browser interaction failed: {0}")]
    Interaction(String),
    /// The session can no longer be driven (launch failed, connection lost).
    #[error("Browser unavailable: {0}")]
    Unavailable(String),
}

impl BrowserError {
    /// Whether the error should abort the run instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrowserError::Unavailable(_))
    }
}
