//! Scrape engine: fetching, rendering, retry and the two scraping pipelines.
mod catalog;
mod decode;
mod fetch;
mod listing;
mod persist;
mod render;
mod retry;
mod types;

pub use catalog::{scrape_catalog, CatalogPipeline, CatalogRun, CatalogSettings, CatalogTermination};
pub use decode::decode_body;
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use listing::{scrape_listing, ListingSelectors, ListingSettings};
pub use persist::{ensure_output_dir, persist_records, write_json_array, AtomicFileWriter, PersistError};
#[cfg(feature = "chromium")]
pub use render::{ChromiumLauncher, ChromiumSession};
pub use render::{
    ElementHandle, RenderError, RenderSession, SessionLauncher, SessionSettings, StaticDomLauncher,
    StaticDomSession,
};
pub use retry::{RetryExhausted, RetryGovernor, RetryPolicy};
pub use types::{CategoryError, FailureKind, FetchError, FetchMetadata, FetchOutput, RowLookupError};
