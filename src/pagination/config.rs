//! Pagination timings and selectors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the load-more listing is driven. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Selector matching one rendered listing item.
    pub item_selector: String,
    /// Selector matching the "load more" control.
    pub load_more_selector: String,
    /// Scroll-to-bottom actions per cycle (passive lazy-loading).
    pub scroll_rounds: u32,
    pub scroll_pause_ms: u64,
    /// Pause before re-checking a control that is present but hidden.
    pub visibility_recheck_ms: u64,
    /// Click attempts per cycle before the cycle counts as no progress.
    pub click_retry_limit: u32,
    /// Pause between scrolling the control into view and clicking it.
    pub click_settle_ms: u64,
    /// Pause after a click that could not be performed.
    pub click_error_pause_ms: u64,
    pub poll_interval_ms: u64,
    /// How long one click may take to attach new items.
    pub item_wait_timeout_ms: u64,
    /// Pause after a click that produced no new items.
    pub attempt_pause_ms: u64,
    /// Pause after a cycle that produced new items.
    pub progress_pause_ms: u64,
    /// Backoff after a stalled cycle.
    pub stall_backoff_ms: u64,
    /// Consecutive stalled cycles before giving up.
    pub max_no_progress: u32,
    /// Pause before the final item count.
    pub final_settle_ms: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            item_selector: "div.content-products-list ul li".to_string(),
            load_more_selector: "button.woocommerce-load-more".to_string(),
            scroll_rounds: 3,
            scroll_pause_ms: 1000,
            visibility_recheck_ms: 800,
            click_retry_limit: 6,
            click_settle_ms: 120,
            click_error_pause_ms: 500,
            poll_interval_ms: 500,
            item_wait_timeout_ms: 10_000,
            attempt_pause_ms: 600,
            progress_pause_ms: 600,
            stall_backoff_ms: 1000,
            max_no_progress: 4,
            final_settle_ms: 1000,
        }
    }
}

impl PaginationConfig {
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn visibility_recheck(&self) -> Duration {
        Duration::from_millis(self.visibility_recheck_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn click_error_pause(&self) -> Duration {
        Duration::from_millis(self.click_error_pause_ms)
    }

    /// Never zero, so the poll loop always advances.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn item_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.item_wait_timeout_ms)
    }

    pub fn attempt_pause(&self) -> Duration {
        Duration::from_millis(self.attempt_pause_ms)
    }

    pub fn progress_pause(&self) -> Duration {
        Duration::from_millis(self.progress_pause_ms)
    }

    pub fn stall_backoff(&self) -> Duration {
        Duration::from_millis(self.stall_backoff_ms)
    }

    pub fn final_settle(&self) -> Duration {
        Duration::from_millis(self.final_settle_ms)
    }
}
