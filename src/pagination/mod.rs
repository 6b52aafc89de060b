//! Drives a "load more" listing until every item is rendered.
//!
//! Each cycle scrolls to the bottom, looks for the load-more control and
//! clicks it until the item count grows. Cycles that never grow the count
//! feed the [`ProgressTracker`], which ends the run once the listing looks
//! exhausted. A missing or hidden control means the listing is fully
//! loaded.

mod config;
mod progress;
mod sleeper;

pub use config::PaginationConfig;
pub use progress::{ProgressSignal, ProgressState, ProgressTracker};
pub use sleeper::{Sleeper, TokioSleeper};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::scrapers::browser::scripts::SCROLL_TO_BOTTOM;
use crate::scrapers::{BrowserError, BrowserSession, ElementHandle};

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The load-more control is gone or hidden.
    Loaded,
    /// Repeated cycles produced no new items.
    Exhausted,
}

/// Summary of one pagination run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationReport {
    pub stop: StopReason,
    pub cycles: u32,
    /// Item count read after the loop settled.
    pub final_count: usize,
    /// Highest count known to the tracker at the end of each clicking cycle.
    pub observed_counts: Vec<usize>,
}

/// Turn transient failures into `None`; fatal ones propagate.
fn absorb<T>(result: Result<T, BrowserError>) -> Result<Option<T>, BrowserError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("Ignoring transient browser failure: {}", e);
            Ok(None)
        }
    }
}

/// Pagination loop over a [`BrowserSession`].
pub struct PaginationDriver {
    config: PaginationConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl PaginationDriver {
    pub fn with_sleeper(config: PaginationConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    /// Load the listing to completion.
    ///
    /// Only [`BrowserError::Unavailable`] escapes; every other failure
    /// degrades to a retry or to "control absent".
    pub async fn run<B>(&self, session: &mut B) -> Result<PaginationReport, BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        let mut tracker = ProgressTracker::new(self.config.max_no_progress);
        let mut observed_counts = Vec::new();
        let mut cycles = 0u32;

        info!(
            "Loading listing items via '{}'",
            self.config.load_more_selector
        );

        let stop = loop {
            cycles += 1;
            self.scroll_to_bottom(session).await?;

            if self.find_visible_trigger(session).await?.is_none() {
                info!("Load-more control not available, listing fully loaded");
                break StopReason::Loaded;
            }

            let before = absorb(self.count_items(session).await)?
                .unwrap_or_else(|| tracker.last_observed_count());
            info!("Clicking load more (current items: {})", before);

            let signal = match self.click_until_growth(session, before).await? {
                Some(now) => tracker.observe(now),
                None => tracker.observe(before),
            };
            observed_counts.push(tracker.last_observed_count());

            match signal {
                ProgressSignal::Progressed => {
                    self.sleeper.sleep(self.config.progress_pause()).await;
                }
                ProgressSignal::Stalled => {
                    warn!(
                        "No progress after {} clicks (no_progress={})",
                        self.config.click_retry_limit,
                        tracker.state().consecutive_no_progress
                    );
                    self.sleeper.sleep(self.config.stall_backoff()).await;
                }
                ProgressSignal::Exhausted => {
                    warn!("Stopping loader due to repeated no-progress");
                    break StopReason::Exhausted;
                }
            }
        };

        self.sleeper.sleep(self.config.final_settle()).await;
        let final_count = absorb(self.count_items(session).await)?
            .unwrap_or_else(|| tracker.last_observed_count());
        info!(
            "Load finished after {} cycles: {} items in DOM ({:?})",
            cycles, final_count, stop
        );

        Ok(PaginationReport {
            stop,
            cycles,
            final_count,
            observed_counts,
        })
    }

    async fn scroll_to_bottom<B>(&self, session: &mut B) -> Result<(), BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        for _ in 0..self.config.scroll_rounds {
            absorb(session.execute_script(SCROLL_TO_BOTTOM).await)?;
            self.sleeper.sleep(self.config.scroll_pause()).await;
        }
        Ok(())
    }

    async fn count_items<B>(&self, session: &mut B) -> Result<usize, BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        Ok(session
            .find_elements(&self.config.item_selector)
            .await?
            .len())
    }

    /// First load-more control; lookup failures count as "absent".
    async fn first_trigger<B>(&self, session: &mut B) -> Result<Option<ElementHandle>, BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        Ok(absorb(session.find_elements(&self.config.load_more_selector).await)?
            .and_then(|elements| elements.into_iter().next()))
    }

    async fn find_visible_trigger<B>(
        &self,
        session: &mut B,
    ) -> Result<Option<ElementHandle>, BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        let Some(trigger) = self.first_trigger(session).await? else {
            return Ok(None);
        };
        if absorb(session.is_displayed(&trigger).await)? == Some(true) {
            return Ok(Some(trigger));
        }

        self.sleeper.sleep(self.config.visibility_recheck()).await;
        let Some(trigger) = self.first_trigger(session).await? else {
            return Ok(None);
        };
        match absorb(session.is_displayed(&trigger).await)? {
            Some(true) => Ok(Some(trigger)),
            _ => Ok(None),
        }
    }

    /// Click up to `click_retry_limit` times; returns the grown count.
    async fn click_until_growth<B>(
        &self,
        session: &mut B,
        before: usize,
    ) -> Result<Option<usize>, BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        for attempt in 1..=self.config.click_retry_limit {
            let trigger = match absorb(session.find_elements(&self.config.load_more_selector).await)? {
                Some(elements) => match elements.into_iter().next() {
                    Some(trigger) => trigger,
                    None => {
                        debug!("Load-more control vanished before attempt {}", attempt);
                        break;
                    }
                },
                None => {
                    self.sleeper.sleep(self.config.click_error_pause()).await;
                    continue;
                }
            };

            if absorb(self.press(session, &trigger).await)?.is_none() {
                self.sleeper.sleep(self.config.click_error_pause()).await;
                continue;
            }

            if let Some(now) = self.wait_for_growth(session, before).await? {
                info!("Loaded new items (now {}) [attempt {}]", now, attempt);
                return Ok(Some(now));
            }
            debug!("Attempt {} produced no new items", attempt);
            self.sleeper.sleep(self.config.attempt_pause()).await;
        }
        Ok(None)
    }

    async fn press<B>(&self, session: &mut B, trigger: &ElementHandle) -> Result<(), BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        session.scroll_into_view(trigger).await?;
        self.sleeper.sleep(self.config.click_settle()).await;
        session.click(trigger).await
    }

    /// Poll the item count until it exceeds `before` or the wait times out.
    async fn wait_for_growth<B>(
        &self,
        session: &mut B,
        before: usize,
    ) -> Result<Option<usize>, BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        let interval = self.config.poll_interval();
        let timeout = self.config.item_wait_timeout();
        let mut waited = Duration::ZERO;
        while waited < timeout {
            self.sleeper.sleep(interval).await;
            waited += interval;
            let now = absorb(self.count_items(session).await)?.unwrap_or(before);
            if now > before {
                return Ok(Some(now));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const ITEMS: &str = "li.item";
    const MORE: &str = "button.more";

    /// Records requested pauses without waiting.
    #[derive(Default)]
    struct RecordingSleeper {
        total: Mutex<Duration>,
    }

    impl RecordingSleeper {
        fn total(&self) -> Duration {
            *self.total.lock().unwrap()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            *self.total.lock().unwrap() += duration;
        }
    }

    /// Listing that reveals `batch` items a few polls after each click.
    struct ScriptedListing {
        total: usize,
        visible: usize,
        batch: usize,
        polls_to_attach: u32,
        pending: Option<u32>,
        failing_clicks: u32,
        trigger_hidden: bool,
        trigger_stays: bool,
        fatal_on_click: bool,
        /// Visibility checks answered "hidden" before the control shows.
        hidden_checks: u32,
        /// 1-based load-more lookup that fails transiently.
        failing_lookup: Option<u32>,
        more_lookups: u32,
        clicks: u32,
    }

    impl ScriptedListing {
        fn new(total: usize, visible: usize, batch: usize) -> Self {
            Self {
                total,
                visible,
                batch,
                polls_to_attach: 2,
                pending: None,
                failing_clicks: 0,
                trigger_hidden: false,
                trigger_stays: false,
                fatal_on_click: false,
                hidden_checks: 0,
                failing_lookup: None,
                more_lookups: 0,
                clicks: 0,
            }
        }

        fn trigger_present(&self) -> bool {
            self.trigger_stays || self.visible < self.total
        }
    }

    #[async_trait]
    impl BrowserSession for ScriptedListing {
        async fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
            Ok(())
        }

        async fn execute_script(&mut self, _script: &str) -> Result<serde_json::Value, BrowserError> {
            Ok(serde_json::Value::Bool(true))
        }

        async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
            if selector == MORE {
                self.more_lookups += 1;
                if self.failing_lookup == Some(self.more_lookups) {
                    return Err(BrowserError::Interaction("stale element".into()));
                }
            }
            let count = match selector {
                ITEMS => {
                    if let Some(left) = self.pending {
                        if left <= 1 {
                            self.pending = None;
                            self.visible = (self.visible + self.batch).min(self.total);
                        } else {
                            self.pending = Some(left - 1);
                        }
                    }
                    self.visible
                }
                MORE if self.trigger_present() => 1,
                _ => 0,
            };
            Ok((0..count).map(|i| ElementHandle::new(selector, i)).collect())
        }

        async fn is_displayed(&mut self, _element: &ElementHandle) -> Result<bool, BrowserError> {
            if self.hidden_checks > 0 {
                self.hidden_checks -= 1;
                return Ok(false);
            }
            Ok(!self.trigger_hidden)
        }

        async fn scroll_into_view(&mut self, _element: &ElementHandle) -> Result<(), BrowserError> {
            Ok(())
        }

        async fn click(&mut self, _element: &ElementHandle) -> Result<(), BrowserError> {
            if self.fatal_on_click {
                return Err(BrowserError::Unavailable("tab crashed".into()));
            }
            if self.failing_clicks > 0 {
                self.failing_clicks -= 1;
                return Err(BrowserError::Interaction("click intercepted".into()));
            }
            self.clicks += 1;
            if self.visible < self.total {
                self.pending = Some(self.polls_to_attach);
            }
            Ok(())
        }

        async fn page_source(&mut self) -> Result<String, BrowserError> {
            Ok(String::new())
        }

        async fn close(&mut self) -> Result<(), BrowserError> {
            Ok(())
        }
    }

    fn driver(sleeper: Arc<RecordingSleeper>) -> PaginationDriver {
        PaginationDriver::with_sleeper(
            PaginationConfig {
                item_selector: ITEMS.to_string(),
                load_more_selector: MORE.to_string(),
                ..Default::default()
            },
            sleeper,
        )
    }

    fn is_non_decreasing(counts: &[usize]) -> bool {
        counts.windows(2).all(|w| w[0] <= w[1])
    }

    #[tokio::test]
    async fn test_loads_until_control_disappears() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut listing = ScriptedListing::new(25, 10, 5);

        let report = driver(sleeper.clone()).run(&mut listing).await.unwrap();

        assert_eq!(report.stop, StopReason::Loaded);
        assert_eq!(report.final_count, 25);
        assert_eq!(report.observed_counts, vec![15, 20, 25]);
        assert_eq!(report.cycles, 4);
        assert_eq!(listing.clicks, 3);
        // Successful clicks return on growth instead of waiting out the timeout.
        assert!(sleeper.total() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_stalled_listing_exhausts() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut listing = ScriptedListing::new(10, 10, 5);
        listing.trigger_stays = true;

        let report = driver(sleeper).run(&mut listing).await.unwrap();

        assert_eq!(report.stop, StopReason::Exhausted);
        // First cycle registers the passively loaded 10, then 4 stalled cycles.
        assert_eq!(report.cycles, 5);
        assert_eq!(listing.clicks, 5 * 6);
        assert_eq!(report.final_count, 10);
        assert!(is_non_decreasing(&report.observed_counts));
    }

    #[tokio::test]
    async fn test_transient_click_failures_are_retried() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut listing = ScriptedListing::new(12, 4, 4);
        listing.failing_clicks = 3;

        let report = driver(sleeper).run(&mut listing).await.unwrap();

        assert_eq!(report.stop, StopReason::Loaded);
        assert_eq!(report.final_count, 12);
        assert_eq!(listing.clicks, 2);
    }

    #[tokio::test]
    async fn test_hidden_control_means_loaded() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut listing = ScriptedListing::new(30, 10, 5);
        listing.trigger_hidden = true;

        let report = driver(sleeper.clone()).run(&mut listing).await.unwrap();

        assert_eq!(report.stop, StopReason::Loaded);
        assert_eq!(report.cycles, 1);
        assert_eq!(report.final_count, 10);
        assert_eq!(listing.clicks, 0);
        assert!(report.observed_counts.is_empty());
    }

    #[tokio::test]
    async fn test_control_visible_after_recheck_is_clicked() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut listing = ScriptedListing::new(15, 10, 5);
        listing.hidden_checks = 1;

        let report = driver(sleeper.clone()).run(&mut listing).await.unwrap();

        assert_eq!(report.stop, StopReason::Loaded);
        assert_eq!(report.cycles, 2);
        assert_eq!(listing.clicks, 1);
        assert_eq!(report.observed_counts, vec![15]);
        assert_eq!(report.final_count, 15);
        assert!(sleeper.total() >= Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_transient_lookup_in_click_loop_is_retried() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut listing = ScriptedListing::new(15, 10, 5);
        // Lookup 1 finds the control; lookup 2 is the first click attempt.
        listing.failing_lookup = Some(2);

        let report = driver(sleeper).run(&mut listing).await.unwrap();

        assert_eq!(report.stop, StopReason::Loaded);
        assert_eq!(report.cycles, 2);
        assert_eq!(listing.clicks, 1);
        assert_eq!(report.observed_counts, vec![15]);
        assert_eq!(report.final_count, 15);
    }

    #[tokio::test]
    async fn test_fatal_failure_propagates() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut listing = ScriptedListing::new(30, 10, 5);
        listing.fatal_on_click = true;

        let err = driver(sleeper).run(&mut listing).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_slow_attach_waits_within_timeout() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut listing = ScriptedListing::new(20, 10, 10);
        // 19 polls * 500ms stays under the 10s wait.
        listing.polls_to_attach = 19;

        let report = driver(sleeper).run(&mut listing).await.unwrap();

        assert_eq!(report.stop, StopReason::Loaded);
        assert_eq!(report.final_count, 20);
        assert_eq!(listing.clicks, 1);
    }

    #[tokio::test]
    async fn test_terminates_for_various_thresholds() {
        for k in 1..=5u32 {
            let sleeper = Arc::new(RecordingSleeper::default());
            let mut listing = ScriptedListing::new(7, 7, 1);
            listing.trigger_stays = true;
            let driver = PaginationDriver::with_sleeper(
                PaginationConfig {
                    item_selector: ITEMS.to_string(),
                    load_more_selector: MORE.to_string(),
                    max_no_progress: k,
                    ..Default::default()
                },
                sleeper,
            );

            let report = driver.run(&mut listing).await.unwrap();
            assert_eq!(report.stop, StopReason::Exhausted);
            assert_eq!(report.cycles, k + 1);
            assert!(is_non_decreasing(&report.observed_counts));
        }
    }
}
