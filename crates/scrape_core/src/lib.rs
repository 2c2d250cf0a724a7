//! Scrape core: pure record model and HTML extraction helpers.
mod catalog_page;
mod collector;
mod model;
mod price;

pub use catalog_page::{
    catalog_base, extract_category, page_url, parse_catalog_page, CatalogPage, ItemSummary, SkippedSummary,
    SummaryError,
};
pub use collector::Collector;
pub use model::{CatalogItem, Headline, SENTINEL};
pub use price::{parse_price, PriceError};
