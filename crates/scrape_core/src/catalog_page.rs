use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::price::{parse_price, PriceError};

/// Fields read from one product summary on a catalog listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    pub title: String,
    pub price: f64,
    pub detail_url: Url,
    pub image_url: Url,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SummaryError {
    #[error("missing title link")]
    MissingTitle,
    #[error("missing price")]
    MissingPrice,
    #[error("bad price: {0}")]
    Price(#[from] PriceError),
    #[error("missing image")]
    MissingImage,
    #[error("cannot resolve {reference:?}: {source}")]
    BadUrl {
        reference: String,
        source: url::ParseError,
    },
}

/// A summary that was present on the page but could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSummary {
    /// 1-based position on the page.
    pub position: usize,
    pub reason: SummaryError,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogPage {
    pub summaries: Vec<ItemSummary>,
    pub skipped: Vec<SkippedSummary>,
}

impl CatalogPage {
    /// A page with no product entries at all marks the end of the catalog.
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty() && self.skipped.is_empty()
    }
}

/// Parse the catalog directory URL, adding the trailing `/` that `page_url`
/// needs to join below it instead of beside it.
pub fn catalog_base(raw: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(raw.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

/// URL of listing page `page` (1-based) under `base`.
pub fn page_url(base: &Url, page: u32) -> Result<Url, url::ParseError> {
    base.join(&format!("page-{page}.html"))
}

/// Read every `article.product_pod` on a listing page.
///
/// Relative links and image sources are joined onto `base`.
pub fn parse_catalog_page(html: &str, base: &Url) -> CatalogPage {
    let doc = Html::parse_document(html);
    let Some(article_sel) = Selector::parse("article.product_pod").ok() else {
        return CatalogPage::default();
    };
    let title_sel = Selector::parse("h3 > a").ok();
    let price_sel = Selector::parse("p.price_color").ok();
    let image_sel = Selector::parse("img").ok();

    let mut page = CatalogPage::default();
    for (index, article) in doc.select(&article_sel).enumerate() {
        let parsed = parse_summary(
            article,
            base,
            title_sel.as_ref(),
            price_sel.as_ref(),
            image_sel.as_ref(),
        );
        match parsed {
            Ok(summary) => page.summaries.push(summary),
            Err(reason) => page.skipped.push(SkippedSummary {
                position: index + 1,
                reason,
            }),
        }
    }
    page
}

fn parse_summary(
    article: ElementRef,
    base: &Url,
    title_sel: Option<&Selector>,
    price_sel: Option<&Selector>,
    image_sel: Option<&Selector>,
) -> Result<ItemSummary, SummaryError> {
    let link = first_match(article, title_sel).ok_or(SummaryError::MissingTitle)?;
    let title = link
        .value()
        .attr("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(SummaryError::MissingTitle)?
        .to_string();
    let href = link.value().attr("href").ok_or(SummaryError::MissingTitle)?;

    let price_text = first_match(article, price_sel)
        .map(|p| p.text().collect::<String>())
        .ok_or(SummaryError::MissingPrice)?;
    let price = parse_price(&price_text)?;

    let src = first_match(article, image_sel)
        .and_then(|img| img.value().attr("src"))
        .ok_or(SummaryError::MissingImage)?;

    Ok(ItemSummary {
        title,
        price,
        detail_url: resolve(base, href)?,
        image_url: resolve(base, src)?,
    })
}

/// Category name from a product detail page: the third breadcrumb link
/// (Home > Books > Category).
pub fn extract_category(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let breadcrumb_sel = Selector::parse("ul.breadcrumb").ok()?;
    let link_sel = Selector::parse("a").ok()?;

    let breadcrumb = doc.select(&breadcrumb_sel).next()?;
    breadcrumb
        .select(&link_sel)
        .nth(2)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|c| !c.is_empty())
}

fn first_match<'a>(scope: ElementRef<'a>, sel: Option<&Selector>) -> Option<ElementRef<'a>> {
    sel.and_then(|sel| scope.select(sel).next())
}

fn resolve(base: &Url, reference: &str) -> Result<Url, SummaryError> {
    base.join(reference.trim())
        .map_err(|source| SummaryError::BadUrl {
            reference: reference.to_string(),
            source,
        })
}
