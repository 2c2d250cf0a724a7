//! Rendered listing scrape: session -> navigate -> wait for rows -> per-row
//! best-effort extraction -> release.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use scrape_core::{Collector, Headline};
use scrape_logging::{scrape_debug, scrape_error, scrape_info, scrape_warn};
use url::Url;

use crate::persist::persist_records;
use crate::render::{ElementHandle, RenderError, RenderSession, SessionLauncher, SessionSettings};
use crate::retry::{RetryGovernor, RetryPolicy};
use crate::RowLookupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    pub row: String,
    /// Title link, relative to a row.
    pub title_link: String,
    /// Score element, relative to the metadata row that follows a row.
    pub score: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row: "tr.athing".to_string(),
            title_link: "td.title > span.titleline > a".to_string(),
            score: "span.score".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingSettings {
    pub url: String,
    pub selectors: ListingSelectors,
    pub retry: RetryPolicy,
    /// Pause after navigation so client-side scripts can assemble the page.
    pub settle_delay: Duration,
    pub session: SessionSettings,
    pub output_path: PathBuf,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            url: "https://news.ycombinator.com/".to_string(),
            selectors: ListingSelectors::default(),
            retry: RetryPolicy::new(3, Duration::from_secs(2)),
            settle_delay: Duration::from_secs(2),
            session: SessionSettings::default(),
            output_path: PathBuf::from("hacker_news.json"),
        }
    }
}

/// Scrape the rendered listing, persist it to `settings.output_path` and return it.
///
/// Returns an empty vector (and writes nothing) when the session cannot be
/// started, the page never loads or no rows ever appear. Once a session was
/// acquired it is closed exactly once, whatever happened in between.
pub async fn scrape_listing(launcher: &dyn SessionLauncher, settings: &ListingSettings) -> Vec<Headline> {
    let page_url = match Url::parse(&settings.url) {
        Ok(url) => url,
        Err(err) => {
            scrape_error!("Invalid listing url {:?}: {}", settings.url, err);
            return Vec::new();
        }
    };
    let governor = RetryGovernor::new(settings.retry);

    scrape_info!("Starting listing scrape of {}", page_url);
    let session = match governor
        .run("start browser session", || launcher.launch(&settings.session))
        .await
    {
        Ok(session) => session,
        Err(exhausted) => {
            scrape_error!("No browser session: {}", exhausted);
            return Vec::new();
        }
    };

    let run = ListingRun {
        session: session.as_ref(),
        settings,
        governor,
        page_url: &page_url,
    };
    let headlines = run.collect().await;

    match session.close().await {
        Ok(()) => scrape_info!("Browser session closed"),
        Err(err) => scrape_warn!("Closing browser session failed: {}", err),
    }

    match headlines {
        Some(headlines) => {
            persist_records(&settings.output_path, &headlines, "headlines");
            headlines
        }
        None => Vec::new(),
    }
}

struct ListingRun<'a> {
    session: &'a dyn RenderSession,
    settings: &'a ListingSettings,
    governor: RetryGovernor,
    page_url: &'a Url,
}

impl ListingRun<'_> {
    /// `None` when the page or its rows could not be reached.
    async fn collect(&self) -> Option<Vec<Headline>> {
        let session = self.session;
        let url = self.page_url.as_str();

        if let Err(exhausted) = self
            .governor
            .run(&format!("navigate to {url}"), || session.navigate(url))
            .await
        {
            scrape_error!("Page never loaded: {}", exhausted);
            return None;
        }
        scrape_info!("Loaded {}", url);
        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }

        let row_selector = self.settings.selectors.row.as_str();
        let rows = match self
            .governor
            .run("locate listing rows", || async move {
                let rows = session.find_all(row_selector).await?;
                if rows.is_empty() {
                    Err(RowLookupError::NotReady)
                } else {
                    Ok(rows)
                }
            })
            .await
        {
            Ok(rows) => rows,
            Err(exhausted) => {
                scrape_error!("No listing rows: {}", exhausted);
                return None;
            }
        };
        scrape_info!("Found {} listing rows", rows.len());

        let mut collector = Collector::new();
        for (index, row) in rows.iter().enumerate() {
            let headline = self.extract_row(*row, index + 1).await;
            scrape_info!(
                "Processed row {}/{}: {:.50} (score: {})",
                index + 1,
                rows.len(),
                headline.title,
                headline.score
            );
            collector.push(headline);
        }
        Some(collector.into_records())
    }

    /// Never fails: sub-fields that cannot be read keep their sentinel.
    async fn extract_row(&self, row: ElementHandle, position: usize) -> Headline {
        let mut headline = Headline::default();
        let session = self.session;
        let selectors = &self.settings.selectors;

        let title_selector = selectors.title_link.as_str();
        match self
            .lookup(&format!("title link of row {position}"), || {
                session.find_one(title_selector, Some(row))
            })
            .await
        {
            Some(Some(link)) => {
                if let Some(title) = self.lookup("title text", || session.text(link)).await {
                    if !title.is_empty() {
                        headline.title = title;
                    }
                }
                if let Some(Some(href)) = self.lookup("title href", || session.attribute(link, "href")).await {
                    headline.url = self.resolve(&href);
                }
            }
            Some(None) => scrape_warn!("Row {}: no title link", position),
            None => {}
        }

        match self.score_text(row, position).await {
            Some(text) => match parse_score(&text) {
                Some(score) => headline.score = score,
                None => scrape_warn!(
                    "Row {}: cannot parse score {:?} for {:.30}",
                    position,
                    text,
                    headline.title
                ),
            },
            None => scrape_debug!("Row {}: no score for {:.30}", position, headline.title),
        }

        headline
    }

    /// Text of the score element in the metadata row right after `row`.
    async fn score_text(&self, row: ElementHandle, position: usize) -> Option<String> {
        let session = self.session;
        let row_id = self.lookup("row id", || session.attribute(row, "id")).await??;

        let metadata_selector = format!("tr[id=\"{}\"] + tr", css_escape(&row_id));
        let metadata_selector = metadata_selector.as_str();
        let metadata = self
            .lookup(&format!("metadata row of row {position}"), || {
                session.find_one(metadata_selector, None)
            })
            .await??;

        let score_selector = self.settings.selectors.score.as_str();
        let score = self
            .lookup(&format!("score of row {position}"), || {
                session.find_one(score_selector, Some(metadata))
            })
            .await??;
        self.lookup("score text", || session.text(score)).await
    }

    /// Governed row-level lookup; exhaustion is logged by the governor and
    /// collapses to `None`.
    async fn lookup<T, F, Fut>(&self, label: &str, op: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RenderError>>,
    {
        self.governor.run(label, op).await.ok()
    }

    fn resolve(&self, href: &str) -> String {
        self.page_url
            .join(href.trim())
            .map(String::from)
            .unwrap_or_else(|_| href.to_string())
    }
}

/// First whitespace-separated token of e.g. `"118 points"`.
fn parse_score(text: &str) -> Option<u32> {
    text.split_whitespace().next()?.parse().ok()
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
