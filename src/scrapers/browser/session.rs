//! Chromium (CDP) implementation of [`BrowserSession`].

#[cfg(feature = "browser")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "browser")]
use std::sync::Arc;
#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

use super::config::BrowserEngineConfig;
#[cfg(feature = "browser")]
use super::config::BrowserEngineType;
#[cfg(feature = "browser")]
use super::scripts;
use super::types::{BrowserError, ElementHandle};
use super::BrowserSession;
#[cfg(feature = "browser")]
use crate::scrapers::http_client::BROWSER_USER_AGENT;

/// A single Chromium tab driven over the DevTools protocol.
#[cfg(feature = "browser")]
pub struct ChromeSession {
    config: BrowserEngineConfig,
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
}

#[cfg(feature = "browser")]
impl ChromeSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Launch (or connect to) a browser and open a blank tab.
    pub async fn launch(config: BrowserEngineConfig) -> Result<Self, BrowserError> {
        let mut session = Self {
            config,
            browser: None,
            page: None,
            handler: None,
            connected: Arc::new(AtomicBool::new(false)),
        };
        session.ensure_browser().await?;
        session.open_page().await?;
        Ok(session)
    }

    /// Find Chrome executable.
    fn find_chrome() -> Result<std::path::PathBuf, BrowserError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(BrowserError::Unavailable(
            "Chrome/Chromium not found. Install chromium or set browser.remote_url".to_string(),
        ))
    }

    async fn ensure_browser(&mut self) -> Result<(), BrowserError> {
        if self.browser.is_some() {
            return Ok(());
        }

        if let Some(remote_url) = self.config.remote_url.clone() {
            return self.connect_remote(&remote_url).await;
        }

        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1920, 1080);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        if self.config.block_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder.build().map_err(|e| {
            BrowserError::Unavailable(format!("Failed to build browser config: {}", e))
        })?;

        let (browser, handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Unavailable(format!("Failed to launch browser: {}", e)))?;

        self.attach(browser, handler);
        Ok(())
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&mut self, url: &str) -> Result<(), BrowserError> {
        info!("Connecting to remote browser at {}", url);

        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let unavailable = |e: reqwest::Error| {
            BrowserError::Unavailable(format!("Failed to reach remote browser: {}", e))
        };
        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                BrowserError::Unavailable("No webSocketDebuggerUrl in response".to_string())
            })?;

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| {
                BrowserError::Unavailable(format!("Failed to connect to remote browser: {}", e))
            })?;

        self.attach(browser, handler);
        Ok(())
    }

    /// Keep the CDP handler running; once it stops, the session is dead.
    fn attach(&mut self, browser: Browser, mut handler: chromiumoxide::handler::Handler) {
        let connected = self.connected.clone();
        connected.store(true, Ordering::SeqCst);
        self.handler = Some(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            connected.store(false, Ordering::SeqCst);
        }));
        self.browser = Some(browser);
    }

    async fn open_page(&mut self) -> Result<(), BrowserError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| BrowserError::Unavailable("browser not started".to_string()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Unavailable(format!("Failed to open tab: {}", e)))?;
        let user_agent = self
            .config
            .user_agent
            .clone()
            .unwrap_or_else(|| BROWSER_USER_AGENT.to_string());
        page.execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| self.classify(e))?;
        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page, BrowserError> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::Unavailable("no open tab".to_string()))
    }

    /// CDP errors while the handler is alive are page-level hiccups.
    fn classify(&self, err: impl std::fmt::Display) -> BrowserError {
        if self.connected.load(Ordering::SeqCst) {
            BrowserError::Interaction(err.to_string())
        } else {
            BrowserError::Unavailable(err.to_string())
        }
    }

    async fn evaluate(&self, script: String) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| self.classify(e))?;
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    /// Evaluate an element script; `null` means the element is gone.
    async fn evaluate_on(
        &self,
        element: &ElementHandle,
        script: String,
    ) -> Result<serde_json::Value, BrowserError> {
        match self.evaluate(script).await? {
            serde_json::Value::Null => Err(BrowserError::Interaction(format!(
                "element {}[{}] is no longer attached",
                element.selector, element.index
            ))),
            value => Ok(value),
        }
    }

    async fn wait_for_ready(&self) -> Result<(), BrowserError> {
        let page = self.page()?;
        match tokio::time::timeout(
            Duration::from_secs(self.config.timeout),
            page.evaluate(scripts::WAIT_FOR_READY.to_string()),
        )
        .await
        {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state"),
        }

        if self.config.engine == BrowserEngineType::Stealth {
            for script in scripts::STEALTH_SCRIPTS {
                if let Err(e) = page.evaluate(script.to_string()).await {
                    debug!("Stealth script injection skipped: {}", e);
                }
            }
        }

        if let Some(ref selector) = self.config.wait_for_selector {
            debug!("Waiting for selector: {}", selector);
            let timeout = Duration::from_secs(self.config.timeout);
            match tokio::time::timeout(timeout, page.find_element(selector.as_str())).await {
                Ok(Ok(_)) => debug!("Selector found"),
                Ok(Err(e)) => warn!("Selector not found: {}", e),
                Err(_) => warn!("Timeout waiting for selector"),
            }
        }
        Ok(())
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| BrowserError::Unavailable(format!("Invalid URL {}: {}", url, e)))?;
        let page = self.page()?;
        page.execute(nav_params)
            .await
            .map_err(|e| BrowserError::Unavailable(format!("Navigation failed: {}", e)))?;
        self.wait_for_ready().await
    }

    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value, BrowserError> {
        self.evaluate(script.to_string()).await
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let count = self
            .evaluate(scripts::count_elements(selector))
            .await?
            .as_u64()
            .unwrap_or(0) as usize;
        Ok((0..count)
            .map(|index| ElementHandle::new(selector, index))
            .collect())
    }

    async fn is_displayed(&mut self, element: &ElementHandle) -> Result<bool, BrowserError> {
        let value = self
            .evaluate_on(element, scripts::is_displayed(element))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.evaluate_on(element, scripts::scroll_into_view(element))
            .await
            .map(|_| ())
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.evaluate_on(element, scripts::click(element))
            .await
            .map(|_| ())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.page()?
            .content()
            .await
            .map_err(|e| BrowserError::Unavailable(format!("Failed to read page source: {}", e)))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        if let Some(mut browser) = self.browser.take() {
            // A remote browser belongs to someone else; only drop our connection.
            if self.config.remote_url.is_none() {
                if let Err(e) = browser.close().await {
                    debug!("Browser close reported: {}", e);
                }
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct ChromeSession;

#[cfg(not(feature = "browser"))]
impl ChromeSession {
    pub async fn launch(_config: BrowserEngineConfig) -> Result<Self, BrowserError> {
        Err(Self::not_compiled())
    }

    fn not_compiled() -> BrowserError {
        BrowserError::Unavailable(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        )
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
        Err(Self::not_compiled())
    }

    async fn execute_script(&mut self, _script: &str) -> Result<serde_json::Value, BrowserError> {
        Err(Self::not_compiled())
    }

    async fn find_elements(&mut self, _selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        Err(Self::not_compiled())
    }

    async fn is_displayed(&mut self, _element: &ElementHandle) -> Result<bool, BrowserError> {
        Err(Self::not_compiled())
    }

    async fn scroll_into_view(&mut self, _element: &ElementHandle) -> Result<(), BrowserError> {
        Err(Self::not_compiled())
    }

    async fn click(&mut self, _element: &ElementHandle) -> Result<(), BrowserError> {
        Err(Self::not_compiled())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        Err(Self::not_compiled())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }
}

#[cfg(all(test, not(feature = "browser")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_launch_reports_missing_support() {
        match ChromeSession::launch(BrowserEngineConfig::default()).await {
            Err(e) => assert!(e.is_fatal()),
            Ok(_) => panic!("browser support should be unavailable"),
        }
    }
}
