//! CLI parser and dispatch.

mod commands;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "tilecrawl")]
#[command(about = "Harvest a load-more product listing into JSON")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Load the whole listing, enrich every item and save the result
    Run {
        /// Listing URL
        #[arg(short, long, env = "START_URL")]
        url: Option<String>,
        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory for downloaded images
        #[arg(long)]
        images_dir: Option<PathBuf>,
        /// Skip image downloads
        #[arg(long)]
        no_images: bool,
        /// Show the browser window
        #[arg(long)]
        show_browser: bool,
        /// Connect to a running Chrome (DevTools URL) instead of launching one
        #[arg(long, env = "BROWSER_URL")]
        remote_url: Option<String>,
        /// Concurrent detail-page fetches
        #[arg(short, long)]
        workers: Option<usize>,
        /// Concurrent image downloads
        #[arg(long)]
        image_workers: Option<usize>,
        /// Hide progress bars
        #[arg(short = 'q', long)]
        quiet: bool,
    },

    /// Extract listing tiles from a saved HTML file
    Tiles {
        /// Saved listing page
        file: PathBuf,
        /// URL the page was saved from (for resolving relative links)
        #[arg(short, long)]
        base_url: Option<String>,
    },

    /// Fetch and parse a single detail page
    Enrich {
        /// Detail page URL
        url: String,
    },
}

/// Command-line overrides for `run`.
struct RunOverrides {
    url: Option<String>,
    output: Option<PathBuf>,
    images_dir: Option<PathBuf>,
    no_images: bool,
    show_browser: bool,
    remote_url: Option<String>,
    workers: Option<usize>,
    image_workers: Option<usize>,
}

impl RunOverrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(url) = self.url {
            settings.start_url = Some(url);
        }
        if let Some(output) = self.output {
            settings.output_path = output;
        }
        if let Some(dir) = self.images_dir {
            settings.assets_dir = dir;
        }
        if self.no_images {
            settings.download_assets = false;
        }
        if self.show_browser {
            settings.browser.headless = false;
        }
        if let Some(remote) = self.remote_url {
            settings.browser.remote_url = Some(remote);
        }
        if let Some(workers) = self.workers {
            settings.enrich_workers = workers;
        }
        if let Some(workers) = self.image_workers {
            settings.asset_workers = workers;
        }
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (mut settings, _config) = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Run {
            url,
            output,
            images_dir,
            no_images,
            show_browser,
            remote_url,
            workers,
            image_workers,
            quiet,
        } => {
            RunOverrides {
                url,
                output,
                images_dir,
                no_images,
                show_browser,
                remote_url,
                workers,
                image_workers,
            }
            .apply(&mut settings);
            commands::cmd_run(settings, !quiet).await
        }
        Commands::Tiles { file, base_url } => {
            commands::cmd_tiles(&settings, &file, base_url.as_deref()).await
        }
        Commands::Enrich { url } => commands::cmd_enrich(&settings, &url).await,
    }
}
