mod cli;
mod config;
mod logging;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use scrape_engine::{
    scrape_catalog, scrape_listing, AtomicFileWriter, ListingSettings, ReqwestFetcher,
    SessionLauncher, StaticDomLauncher,
};
use scrape_logging::scrape_info;
use tokio::runtime::Runtime;

use crate::cli::{Cli, Command, HeadlinesArgs};
use crate::config::AppConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, source) = config::load(&cli.config);
    cli.apply_logging(&mut config);
    logging::initialize(
        config.log.destination,
        scrape_logging::parse_level(&config.log.level),
    );
    source.report();

    match &cli.command {
        Command::Books(args) => {
            args.apply(&mut config.catalog);
            run_books(&config)
        }
        Command::Headlines(args) => {
            args.apply(&mut config.listing);
            run_headlines(&config, args)
        }
        Command::InitConfig { force } => write_default_config(&cli.config, *force),
    }
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn run_books(config: &AppConfig) -> Result<()> {
    let settings = config.catalog.to_settings();
    let fetcher = ReqwestFetcher::new(config.catalog.fetch_settings());

    let items = runtime()?.block_on(scrape_catalog(&fetcher, &settings));

    println!(
        "Collected {} book(s) priced below {} into {}",
        items.len(),
        settings.price_ceiling,
        settings.output_path.display()
    );
    Ok(())
}

fn run_headlines(config: &AppConfig, args: &HeadlinesArgs) -> Result<()> {
    let settings = config.listing.to_settings();
    let launcher = launcher_for(&settings, args.snapshot.as_deref())?;

    let headlines = runtime()?.block_on(scrape_listing(launcher.as_ref(), &settings));

    if headlines.is_empty() {
        println!("No headlines could be retrieved from {}", settings.url);
    } else {
        println!(
            "Collected {} headline(s) into {}",
            headlines.len(),
            settings.output_path.display()
        );
    }
    Ok(())
}

fn launcher_for(settings: &ListingSettings, snapshot: Option<&Path>) -> Result<Box<dyn SessionLauncher>> {
    if let Some(path) = snapshot {
        let html = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        scrape_info!("Serving {} from snapshot {:?}", settings.url, path);
        return Ok(Box::new(StaticDomLauncher::new().with_page(&settings.url, html)));
    }
    browser_launcher()
}

#[cfg(feature = "chromium")]
fn browser_launcher() -> Result<Box<dyn SessionLauncher>> {
    Ok(Box::new(scrape_engine::ChromiumLauncher))
}

#[cfg(not(feature = "chromium"))]
fn browser_launcher() -> Result<Box<dyn SessionLauncher>> {
    bail!("built without the `chromium` feature; pass --snapshot to read a saved page")
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; use --force to replace it", path.display());
    }
    let content = config::render_default().context("failed to render default configuration")?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let written = AtomicFileWriter::new(dir)
        .write(filename, content.as_bytes())
        .context("failed to write configuration")?;
    println!("Wrote default configuration to {}", written.display());
    Ok(())
}
