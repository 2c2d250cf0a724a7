use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{AppConfig, CatalogConfig, ListingConfig, DEFAULT_CONFIG_FILE};
use crate::logging::LogDestination;

/// Scrape a book catalog or a news front page into JSON files.
#[derive(Debug, Parser)]
#[command(name = "scrape", version, about)]
pub struct Cli {
    /// RON configuration file; missing means built-in defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// error, warn, info, debug or trace.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[arg(long, global = true, value_enum)]
    pub log_to: Option<LogDestination>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Walk the paginated catalog and keep items below the price ceiling.
    Books(BooksArgs),
    /// Render the news front page and extract every listed story.
    Headlines(HeadlinesArgs),
    /// Write the default configuration to the `--config` path.
    InitConfig {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct BooksArgs {
    #[arg(long)]
    pub count: Option<usize>,
    /// Items priced at or above this are skipped.
    #[arg(long)]
    pub price_ceiling: Option<f64>,
    /// Attempts per request, including the first.
    #[arg(long)]
    pub retries: Option<u32>,
    #[arg(long)]
    pub delay_secs: Option<f64>,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl BooksArgs {
    pub fn apply(&self, config: &mut CatalogConfig) {
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(ceiling) = self.price_ceiling {
            config.price_ceiling = ceiling;
        }
        if let Some(retries) = self.retries {
            config.max_attempts = retries;
        }
        if let Some(delay) = self.delay_secs {
            config.retry_delay_secs = delay;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
    }
}

#[derive(Debug, Args)]
pub struct HeadlinesArgs {
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub retries: Option<u32>,
    #[arg(long)]
    pub delay_secs: Option<f64>,
    /// Show the browser window.
    #[arg(long)]
    pub headed: bool,
    /// Read the page from a saved HTML file instead of a browser.
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl HeadlinesArgs {
    pub fn apply(&self, config: &mut ListingConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(retries) = self.retries {
            config.max_attempts = retries;
        }
        if let Some(delay) = self.delay_secs {
            config.retry_delay_secs = delay;
        }
        if self.headed {
            config.headless = false;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
    }
}

impl Cli {
    pub fn apply_logging(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(destination) = self.log_to {
            config.log.destination = destination;
        }
    }
}
