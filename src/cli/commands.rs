//! Command implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use console::style;
use tokio::sync::mpsc;

use super::progress::HarvestProgress;
use crate::config::{Settings, START_URL_ENV};
use crate::extract::{DetailParser, TileExtractor};
use crate::models::{CandidateItem, MaterializedRecord};
use crate::output::to_json;
use crate::pipeline::{HarvestEvents, Harvester};
use crate::scrapers::http_client::resolve_user_agent;
use crate::scrapers::{ChromeSession, HttpClient, PageFetcher};
use crate::services::{AssetEvent, EnrichEvent, Enricher};

fn http_client(settings: &Settings, user_agent: &str) -> anyhow::Result<Arc<dyn PageFetcher>> {
    let client = HttpClient::new(user_agent, settings.request_timeout())
        .context("Failed to create HTTP client")?;
    Ok(Arc::new(client))
}

/// Harvest the listing: paginate, enrich, download, save.
pub async fn cmd_run(settings: Settings, show_progress: bool) -> anyhow::Result<()> {
    let Some(start_url) = settings.start_url.clone() else {
        bail!(
            "No listing URL configured. Set {} or pass --url",
            START_URL_ENV
        );
    };

    // One identity for the whole run, so "impersonate" picks a single agent.
    let user_agent = resolve_user_agent(settings.user_agent.as_deref());
    let fetcher = http_client(&settings, &user_agent)?;
    let harvester = Harvester::new(settings, fetcher)?;
    let settings = harvester.settings();

    println!(
        "{} Loading {} (headless={})",
        style("→").cyan(),
        start_url,
        settings.browser.headless
    );
    let mut browser = ChromeSession::launch(settings.browser_config(&user_agent))
        .await
        .context("Failed to start browser")?;

    let progress = show_progress.then(|| Arc::new(HarvestProgress::new(settings.download_assets)));
    let (enrich_tx, mut enrich_rx) = mpsc::channel::<EnrichEvent>(100);
    let (asset_tx, mut asset_rx) = mpsc::channel::<AssetEvent>(100);

    let enrich_progress = progress.clone();
    let enrich_handler = tokio::spawn(async move {
        while let Some(event) = enrich_rx.recv().await {
            if let Some(ref progress) = enrich_progress {
                progress.on_enrich(&event);
            }
        }
    });
    let asset_progress = progress.clone();
    let asset_handler = tokio::spawn(async move {
        while let Some(event) = asset_rx.recv().await {
            if let Some(ref progress) = asset_progress {
                progress.on_asset(&event);
            }
        }
    });

    let events = HarvestEvents {
        enrich: Some(enrich_tx),
        assets: Some(asset_tx),
    };
    let result = harvester.run(&mut browser, &start_url, events).await;

    for handler in [enrich_handler, asset_handler] {
        if let Err(e) = handler.await {
            tracing::warn!("Event handler task failed: {}", e);
        }
    }
    if let Some(ref progress) = progress {
        progress.finish();
    }

    let summary = result?;
    println!(
        "{} Listing loaded: {} items after {} cycles ({:?})",
        style("✓").green(),
        summary.pagination.final_count,
        summary.pagination.cycles,
        summary.pagination.stop
    );
    println!(
        "{} Saved {} records to {}",
        style("✓").green(),
        summary.records,
        summary.output_path.display()
    );
    if summary.candidates > summary.records {
        println!(
            "  {} {} duplicate tiles skipped",
            style("→").dim(),
            summary.candidates - summary.records
        );
    }
    if harvester.settings().download_assets {
        println!(
            "  {} {} images stored in {}",
            style("→").dim(),
            summary.assets_stored,
            harvester.settings().assets_dir.display()
        );
    }
    if summary.records_with_errors > 0 {
        println!(
            "  {} {} records have errors",
            style("!").yellow(),
            summary.records_with_errors
        );
    }
    Ok(())
}

/// Extract tiles from a saved listing page and print them as JSON.
pub async fn cmd_tiles(settings: &Settings, file: &Path, base_url: Option<&str>) -> anyhow::Result<()> {
    let markup = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let Some(base_url) = base_url.or(settings.start_url.as_deref()) else {
        bail!("A base URL is needed to resolve links. Pass --base-url or set {}", START_URL_ENV);
    };

    let extractor = TileExtractor::new(&settings.tiles)?;
    let tiles = extractor.extract(&markup, base_url)?;

    println!("{}", serde_json::to_string_pretty(&tiles)?);
    eprintln!("{} {} tiles", style("✓").green(), tiles.len());
    Ok(())
}

/// Enrich a single detail page and print the resulting record.
pub async fn cmd_enrich(settings: &Settings, url: &str) -> anyhow::Result<()> {
    let parser = DetailParser::new(&settings.detail)?;
    let user_agent = resolve_user_agent(settings.user_agent.as_deref());
    let enricher = Enricher::new(
        http_client(settings, &user_agent)?,
        parser,
        settings.request_timeout(),
    );

    let record = enricher.enrich(CandidateItem::new(url)).await;
    for error in &record.errors {
        eprintln!("{} {}", style("✗").red(), error);
    }

    let json = to_json(&[MaterializedRecord::new(record, None)])?;
    println!("{}", json);
    Ok(())
}
