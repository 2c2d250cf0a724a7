//! Paginated catalog walk: page fetch -> summaries -> price filter -> category
//! lookup -> collector.

use std::path::PathBuf;

use scrape_core::{catalog_base, extract_category, page_url, parse_catalog_page, CatalogItem, CatalogPage, Collector, ItemSummary};
use scrape_logging::{scrape_debug, scrape_error, scrape_info, scrape_warn};
use url::Url;

use crate::persist::persist_records;
use crate::retry::{RetryExhausted, RetryGovernor, RetryPolicy};
use crate::{CategoryError, FetchError, Fetcher};

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSettings {
    /// Directory holding `page-N.html`; a missing trailing `/` is added.
    pub base_url: String,
    pub target_count: usize,
    /// Items priced at or above this are skipped.
    pub price_ceiling: f64,
    pub retry: RetryPolicy,
    pub output_path: PathBuf,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: "https://books.toscrape.com/catalogue/".to_string(),
            target_count: 50,
            price_ceiling: 20.0,
            retry: RetryPolicy::default(),
            output_path: PathBuf::from("books.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTermination {
    TargetReached,
    /// A page came back without any products.
    EndOfCatalog,
    /// The page could not be fetched within the retry budget.
    Aborted { page: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRun {
    pub items: Vec<CatalogItem>,
    pub pages_fetched: u32,
    /// Accepted items dropped because their category never resolved.
    pub dropped: usize,
    pub termination: CatalogTermination,
}

pub struct CatalogPipeline<'a> {
    fetcher: &'a dyn Fetcher,
    settings: &'a CatalogSettings,
    governor: RetryGovernor,
}

impl<'a> CatalogPipeline<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, settings: &'a CatalogSettings) -> Self {
        Self {
            fetcher,
            settings,
            governor: RetryGovernor::new(settings.retry),
        }
    }

    pub async fn run(&self) -> CatalogRun {
        let mut collector = Collector::new();
        let mut pages_fetched = 0;
        let mut dropped = 0;

        let base = match catalog_base(&self.settings.base_url) {
            Ok(base) => base,
            Err(err) => {
                scrape_error!("Invalid catalog base url {:?}: {}", self.settings.base_url, err);
                return CatalogRun {
                    items: Vec::new(),
                    pages_fetched,
                    dropped,
                    termination: CatalogTermination::Aborted { page: 1 },
                };
            }
        };

        let mut cursor: u32 = 1;
        let termination = loop {
            if collector.reached(self.settings.target_count) {
                break CatalogTermination::TargetReached;
            }

            let url = match page_url(&base, cursor) {
                Ok(url) => url,
                Err(err) => {
                    scrape_error!("Cannot build url of page {}: {}", cursor, err);
                    break CatalogTermination::Aborted { page: cursor };
                }
            };
            let page = match self.fetch_page(&url, &base).await {
                Ok(page) => page,
                Err(exhausted) => {
                    scrape_error!("Stopping at page {}: {}", cursor, exhausted);
                    break CatalogTermination::Aborted { page: cursor };
                }
            };
            pages_fetched += 1;

            for skipped in &page.skipped {
                scrape_warn!(
                    "Page {} entry {} skipped: {}",
                    cursor,
                    skipped.position,
                    skipped.reason
                );
            }
            if page.is_empty() {
                scrape_info!("No more products on page {}", cursor);
                break CatalogTermination::EndOfCatalog;
            }

            dropped += self.collect_page(page.summaries, &mut collector).await;
            cursor += 1;
        };

        if collector.is_empty() {
            scrape_warn!("Catalog run collected no items");
        }
        scrape_info!(
            "Catalog run finished after {} page(s): {} item(s), {} dropped ({:?})",
            pages_fetched,
            collector.len(),
            dropped,
            termination
        );
        CatalogRun {
            items: collector.into_records(),
            pages_fetched,
            dropped,
            termination,
        }
    }

    async fn fetch_page(&self, url: &Url, base: &Url) -> Result<CatalogPage, RetryExhausted<FetchError>> {
        let fetcher = self.fetcher;
        let target = url.as_str();

        let body = self
            .governor
            .run(&format!("catalog page {target}"), || async move {
                fetcher.fetch(target).await.map(|output| output.text())
            })
            .await?;
        Ok(parse_catalog_page(&body, base))
    }

    /// Returns how many accepted items were dropped.
    async fn collect_page(
        &self,
        summaries: Vec<ItemSummary>,
        collector: &mut Collector<CatalogItem>,
    ) -> usize {
        let mut dropped = 0;
        for summary in summaries {
            if collector.reached(self.settings.target_count) {
                break;
            }
            if summary.price >= self.settings.price_ceiling {
                scrape_debug!(
                    "Skipping {:?}: {} is not below {}",
                    summary.title,
                    summary.price,
                    self.settings.price_ceiling
                );
                continue;
            }

            match self.resolve_category(&summary.detail_url).await {
                Ok(category) => {
                    scrape_debug!("Collected {:?} ({})", summary.title, category);
                    collector.push(CatalogItem::from_summary(summary, category));
                }
                Err(exhausted) => {
                    scrape_warn!("Dropping {:?}: {}", summary.title, exhausted);
                    dropped += 1;
                }
            }
        }
        dropped
    }

    async fn resolve_category(&self, detail_url: &Url) -> Result<String, RetryExhausted<CategoryError>> {
        let fetcher = self.fetcher;
        let target = detail_url.as_str();
        self.governor
            .run(&format!("category of {target}"), || async move {
                let output = fetcher.fetch(target).await?;
                extract_category(&output.text()).ok_or(CategoryError::MissingBreadcrumb)
            })
            .await
    }
}

/// Walk the catalog, persist the result to `settings.output_path` and return it.
///
/// Never fails: network trouble shortens the result, a failed write is logged.
pub async fn scrape_catalog(fetcher: &dyn Fetcher, settings: &CatalogSettings) -> Vec<CatalogItem> {
    let run = CatalogPipeline::new(fetcher, settings).run().await;
    persist_records(&settings.output_path, &run.items, "catalog items");
    run.items
}
