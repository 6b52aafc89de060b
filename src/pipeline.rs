//! End-to-end harvest: load the listing, enrich every item, store assets,
//! write the output file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::extract::{DetailParser, TileExtractor};
use crate::models::{CandidateItem, MaterializedRecord};
use crate::output::write_records;
use crate::pagination::{PaginationDriver, PaginationReport, Sleeper, TokioSleeper};
use crate::scrapers::{BrowserError, BrowserSession, PageFetcher};
use crate::services::{
    AssetConfig, AssetEvent, AssetService, EnrichConfig, EnrichEvent, EnrichService,
};

/// Optional progress channels for a run. Dropped when the run ends.
#[derive(Default)]
pub struct HarvestEvents {
    pub enrich: Option<mpsc::Sender<EnrichEvent>>,
    pub assets: Option<mpsc::Sender<AssetEvent>>,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub pagination: PaginationReport,
    /// Tiles extracted from the final listing, duplicates included.
    pub candidates: usize,
    pub records: usize,
    pub records_with_errors: usize,
    pub assets_stored: usize,
    pub output_path: PathBuf,
}

/// Composes pagination, extraction, enrichment and materialization.
pub struct Harvester {
    settings: Settings,
    sleeper: Arc<dyn Sleeper>,
    driver: PaginationDriver,
    tiles: TileExtractor,
    enrich: EnrichService,
    assets: Option<AssetService>,
}

impl Harvester {
    pub fn new(settings: Settings, fetcher: Arc<dyn PageFetcher>) -> anyhow::Result<Self> {
        Self::with_sleeper(settings, fetcher, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        settings: Settings,
        fetcher: Arc<dyn PageFetcher>,
        sleeper: Arc<dyn Sleeper>,
    ) -> anyhow::Result<Self> {
        let tiles = TileExtractor::new(&settings.tiles).context("Invalid listing selectors")?;
        let parser = DetailParser::new(&settings.detail).context("Invalid detail selectors")?;

        let enrich = EnrichService::new(
            fetcher.clone(),
            parser,
            EnrichConfig {
                workers: settings.enrich_workers,
                request_timeout: settings.request_timeout(),
            },
        );

        let assets = settings.download_assets.then(|| {
            let mut config = AssetConfig::new(settings.assets_dir.clone());
            config.workers = settings.asset_workers;
            config.request_timeout = settings.request_timeout();
            AssetService::new(fetcher, config)
        });

        let driver = PaginationDriver::with_sleeper(settings.pagination.clone(), sleeper.clone());

        Ok(Self {
            settings,
            sleeper,
            driver,
            tiles,
            enrich,
            assets,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run every stage and write the output file.
    ///
    /// The browser is closed once the listing has been read, whether or
    /// not loading it succeeded. A browser failure aborts the run before
    /// anything is written.
    pub async fn run<B>(
        &self,
        browser: &mut B,
        start_url: &str,
        events: HarvestEvents,
    ) -> anyhow::Result<HarvestSummary>
    where
        B: BrowserSession + ?Sized,
    {
        info!("Opening listing {}", start_url);
        let listing = self.load_listing(browser, start_url).await;
        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        let (markup, pagination) = listing.context("Failed to load listing")?;

        let candidates = self
            .tiles
            .extract(&markup, start_url)
            .context("Failed to extract listing tiles")?;
        let candidate_count = candidates.len();
        info!("Found {} listing tiles", candidate_count);

        let records = self.collect(candidates, events).await;

        write_records(&self.settings.output_path, &records).await?;

        let summary = HarvestSummary {
            pagination,
            candidates: candidate_count,
            records: records.len(),
            records_with_errors: records
                .iter()
                .filter(|r| !r.record.errors.is_empty())
                .count(),
            assets_stored: records
                .iter()
                .filter(|r| r.local_asset_path.is_some())
                .count(),
            output_path: self.settings.output_path.clone(),
        };
        info!(
            "Saved {} records to {}",
            summary.records,
            summary.output_path.display()
        );
        Ok(summary)
    }

    /// Enrich candidates and, when enabled, store their assets.
    pub async fn collect(
        &self,
        candidates: Vec<CandidateItem>,
        events: HarvestEvents,
    ) -> Vec<MaterializedRecord> {
        let HarvestEvents {
            enrich: enrich_tx,
            assets: asset_tx,
        } = events;

        let enriched = self.enrich.enrich_all(candidates, enrich_tx).await;

        match &self.assets {
            Some(assets) => assets.materialize(enriched, asset_tx).await,
            None => enriched
                .into_iter()
                .map(|record| MaterializedRecord::new(record, None))
                .collect(),
        }
    }

    async fn load_listing<B>(
        &self,
        browser: &mut B,
        start_url: &str,
    ) -> Result<(String, PaginationReport), BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        browser.navigate(start_url).await?;
        self.sleeper.sleep(self.settings.initial_settle()).await;

        let report = self.driver.run(browser).await?;
        info!(
            "Pagination finished after {} cycles with {} items ({:?})",
            report.cycles, report.final_count, report.stop
        );

        let markup = browser.page_source().await?;
        Ok((markup, report))
    }
}
