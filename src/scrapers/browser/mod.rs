//! Browser automation for JavaScript-driven listings.
//!
//! The listing is driven through the [`BrowserSession`] trait; the
//! production implementation is [`ChromeSession`] (chromiumoxide over CDP).
//! Tests substitute scripted sessions.

mod config;
pub mod scripts;
mod session;
mod types;

pub use config::{BrowserEngineConfig, BrowserEngineType};
pub use session::ChromeSession;
pub use types::{BrowserError, ElementHandle};

use async_trait::async_trait;

/// One exclusive browser tab.
///
/// Transient failures (missing or stale elements, rejected clicks) come back
/// as [`BrowserError::Interaction`]; a session that can no longer be driven
/// reports [`BrowserError::Unavailable`].
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` in the tab and wait for it to become interactive.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Evaluate a script in the page and return its JSON result.
    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// All elements currently matching `selector`, in document order.
    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError>;

    async fn is_displayed(&mut self, element: &ElementHandle) -> Result<bool, BrowserError>;

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), BrowserError>;

    async fn click(&mut self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Serialized DOM of the current page.
    async fn page_source(&mut self) -> Result<String, BrowserError>;

    /// Release the tab and the browser behind it.
    async fn close(&mut self) -> Result<(), BrowserError>;
}
