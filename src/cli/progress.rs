//! Progress bars for the enrichment and download stages.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::services::{AssetEvent, EnrichEvent};

fn stage_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {msg:<10} [{bar:30.cyan/blue}] {pos}/{len} ({per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

/// One bar per concurrent stage. Lengths grow as work is picked up, since
/// the number of distinct items is only known to the services.
pub struct HarvestProgress {
    multi: MultiProgress,
    enrich: ProgressBar,
    assets: ProgressBar,
}

impl HarvestProgress {
    pub fn new(with_assets: bool) -> Self {
        let multi = MultiProgress::new();

        let enrich = multi.add(ProgressBar::new(0));
        enrich.set_style(stage_style());
        enrich.set_message("Enriching");

        let assets = if with_assets {
            let bar = multi.add(ProgressBar::new(0));
            bar.set_style(stage_style());
            bar.set_message("Images");
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            multi,
            enrich,
            assets,
        }
    }

    pub fn on_enrich(&self, event: &EnrichEvent) {
        match event {
            EnrichEvent::Started { .. } => self.enrich.inc_length(1),
            EnrichEvent::Completed { url, errors, .. } => {
                self.enrich.inc(1);
                if *errors > 0 {
                    self.println(&format!(
                        "{} {} ({} error{})",
                        console::style("!").yellow(),
                        url,
                        errors,
                        if *errors == 1 { "" } else { "s" }
                    ));
                }
            }
            EnrichEvent::Failed { url, error, .. } => {
                self.enrich.inc(1);
                self.println(&format!("{} {}: {}", console::style("✗").red(), url, error));
            }
        }
    }

    pub fn on_asset(&self, event: &AssetEvent) {
        match event {
            AssetEvent::Started { .. } => self.assets.inc_length(1),
            AssetEvent::Completed { .. } => self.assets.inc(1),
            AssetEvent::Failed { url, error } => {
                self.assets.inc(1);
                self.println(&format!(
                    "{} Image {}: {}",
                    console::style("✗").red(),
                    url,
                    error
                ));
            }
        }
    }

    pub fn println(&self, message: &str) {
        let _ = self.multi.println(message);
    }

    pub fn finish(&self) {
        self.enrich.finish_and_clear();
        self.assets.finish_and_clear();
    }
}
