//! Capabilities the harvester drives: a browser tab and an HTTP client.

pub mod browser;
pub mod http_client;

pub use browser::{BrowserEngineConfig, BrowserError, BrowserSession, ChromeSession, ElementHandle};
pub use http_client::{FetchError, FetchResponse, HttpClient, PageFetcher};
