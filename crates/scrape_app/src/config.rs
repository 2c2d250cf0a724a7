use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scrape_engine::{
    CatalogSettings, FetchSettings, ListingSettings, RetryPolicy, SessionSettings,
};
use scrape_logging::{scrape_info, scrape_warn};
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "scrape.ron";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub catalog: CatalogConfig,
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            destination: LogDestination::Terminal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub count: usize,
    pub price_ceiling: f64,
    pub max_attempts: u32,
    pub retry_delay_secs: f64,
    pub request_timeout_secs: f64,
    pub output: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let settings = CatalogSettings::default();
        Self {
            base_url: settings.base_url,
            count: settings.target_count,
            price_ceiling: settings.price_ceiling,
            max_attempts: settings.retry.max_attempts,
            retry_delay_secs: settings.retry.delay.as_secs_f64(),
            request_timeout_secs: FetchSettings::default().request_timeout.as_secs_f64(),
            output: settings.output_path,
        }
    }
}

impl CatalogConfig {
    pub fn to_settings(&self) -> CatalogSettings {
        CatalogSettings {
            base_url: self.base_url.clone(),
            target_count: self.count,
            price_ceiling: self.price_ceiling,
            retry: RetryPolicy::new(self.max_attempts, seconds(self.retry_delay_secs)),
            output_path: self.output.clone(),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: seconds(self.request_timeout_secs),
            ..FetchSettings::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub url: String,
    pub max_attempts: u32,
    pub retry_delay_secs: f64,
    pub settle_delay_secs: f64,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub output: PathBuf,
}

impl Default for ListingConfig {
    fn default() -> Self {
        let settings = ListingSettings::default();
        Self {
            url: settings.url,
            max_attempts: settings.retry.max_attempts,
            retry_delay_secs: settings.retry.delay.as_secs_f64(),
            settle_delay_secs: settings.settle_delay.as_secs_f64(),
            headless: settings.session.headless,
            window_width: settings.session.window_width,
            window_height: settings.session.window_height,
            output: settings.output_path,
        }
    }
}

impl ListingConfig {
    pub fn to_settings(&self) -> ListingSettings {
        ListingSettings {
            url: self.url.clone(),
            retry: RetryPolicy::new(self.max_attempts, seconds(self.retry_delay_secs)),
            settle_delay: seconds(self.settle_delay_secs),
            session: SessionSettings {
                headless: self.headless,
                window_width: self.window_width,
                window_height: self.window_height,
                ..SessionSettings::default()
            },
            output_path: self.output.clone(),
            ..ListingSettings::default()
        }
    }
}

/// How the configuration was obtained. Reported once logging is up.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Missing(PathBuf),
    Unreadable { path: PathBuf, reason: String },
}

impl ConfigSource {
    pub fn report(&self) {
        match self {
            ConfigSource::File(path) => scrape_info!("Loaded configuration from {:?}", path),
            ConfigSource::Missing(path) => {
                scrape_info!("No configuration at {:?}, using defaults", path)
            }
            ConfigSource::Unreadable { path, reason } => {
                scrape_warn!("Ignoring configuration {:?}: {}; using defaults", path, reason)
            }
        }
    }
}

/// Read `path` as RON. Never fails: a missing or broken file yields defaults.
pub fn load(path: &Path) -> (AppConfig, ConfigSource) {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return (AppConfig::default(), ConfigSource::Missing(path.to_path_buf()));
        }
        Err(err) => {
            return (
                AppConfig::default(),
                ConfigSource::Unreadable {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                },
            );
        }
    };

    match ron::from_str(&content) {
        Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
        Err(err) => (
            AppConfig::default(),
            ConfigSource::Unreadable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        ),
    }
}

pub fn render_default() -> Result<String, ron::Error> {
    ron::ser::to_string_pretty(&AppConfig::default(), ron::ser::PrettyConfig::new())
}

/// Negative or non-finite values mean "no delay".
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
