use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{collapse_whitespace, ElementHandle, RenderError, RenderSession, SessionLauncher, SessionSettings};

/// In-memory session over pre-rendered HTML, keyed by URL.
///
/// Nothing is executed: the DOM is whatever the stored markup parses to.
#[derive(Debug, Default)]
pub struct StaticDomSession {
    pages: HashMap<String, String>,
    current: RefCell<Option<LoadedPage>>,
    closed: Cell<bool>,
}

#[derive(Debug)]
struct LoadedPage {
    html: Html,
    nodes: Vec<NodeId>,
}

impl StaticDomSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(normalize(url), html.into());
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.closed.get() {
            Err(RenderError::Closed)
        } else {
            Ok(())
        }
    }

    fn with_page_mut<T>(
        &self,
        f: impl FnOnce(&mut LoadedPage) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        self.ensure_open()?;
        let mut current = self.current.borrow_mut();
        let page = current.as_mut().ok_or(RenderError::NoPage)?;
        f(page)
    }
}

impl LoadedPage {
    fn element(&self, handle: ElementHandle) -> Result<ElementRef<'_>, RenderError> {
        self.nodes
            .get(handle.index())
            .and_then(|id| self.html.tree.get(*id))
            .and_then(ElementRef::wrap)
            .ok_or(RenderError::StaleElement(handle))
    }

    fn register(&mut self, ids: impl IntoIterator<Item = NodeId>) -> Vec<ElementHandle> {
        ids.into_iter()
            .map(|id| {
                self.nodes.push(id);
                ElementHandle::new(self.nodes.len() - 1)
            })
            .collect()
    }
}

#[async_trait::async_trait(?Send)]
impl RenderSession for StaticDomSession {
    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        self.ensure_open()?;
        let markup = self
            .pages
            .get(&normalize(url))
            .ok_or_else(|| RenderError::Navigation {
                url: url.to_string(),
                message: "no such page".to_string(),
            })?;
        *self.current.borrow_mut() = Some(LoadedPage {
            html: Html::parse_document(markup),
            nodes: Vec::new(),
        });
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, RenderError> {
        let sel = parse_selector(selector)?;
        self.with_page_mut(|page| {
            let ids: Vec<NodeId> = page.html.select(&sel).map(|el| el.id()).collect();
            Ok(page.register(ids))
        })
    }

    async fn find_one(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
    ) -> Result<Option<ElementHandle>, RenderError> {
        let sel = parse_selector(selector)?;
        self.with_page_mut(|page| {
            let found = match scope {
                Some(handle) => page.element(handle)?.select(&sel).next().map(|el| el.id()),
                None => page.html.select(&sel).next().map(|el| el.id()),
            };
            Ok(page.register(found).into_iter().next())
        })
    }

    async fn text(&self, element: ElementHandle) -> Result<String, RenderError> {
        self.with_page_mut(|page| {
            let text: String = page.element(element)?.text().collect();
            Ok(collapse_whitespace(&text))
        })
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RenderError> {
        self.with_page_mut(|page| {
            Ok(page
                .element(element)?
                .value()
                .attr(name)
                .map(str::to_string))
        })
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.ensure_open()?;
        self.closed.set(true);
        self.current.borrow_mut().take();
        Ok(())
    }
}

/// Launches [`StaticDomSession`]s that all serve the same set of pages.
#[derive(Debug, Clone, Default)]
pub struct StaticDomLauncher {
    pages: Vec<(String, String)>,
}

impl StaticDomLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.push((url.to_string(), html.into()));
        self
    }
}

#[async_trait::async_trait(?Send)]
impl SessionLauncher for StaticDomLauncher {
    async fn launch(&self, _settings: &SessionSettings) -> Result<Box<dyn RenderSession>, RenderError> {
        let session = self
            .pages
            .iter()
            .fold(StaticDomSession::new(), |session, (url, html)| {
                session.with_page(url, html.clone())
            });
        Ok(Box::new(session))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, RenderError> {
    Selector::parse(selector).map_err(|_| RenderError::Selector {
        selector: selector.to_string(),
    })
}

fn normalize(url: &str) -> String {
    Url::parse(url.trim())
        .map(String::from)
        .unwrap_or_else(|_| url.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><table>
        <tr class="athing" id="1"><td><a href="/x">  First
            story </a></td></tr>
        <tr><td><span class="score">5 points</span></td></tr>
    </table></body></html>"#;

    fn session() -> StaticDomSession {
        StaticDomSession::new().with_page("https://news.example", PAGE)
    }

    #[tokio::test]
    async fn queries_require_a_loaded_page() {
        let session = session();
        assert_eq!(session.find_all("tr").await, Err(RenderError::NoPage));
        session.navigate("https://news.example/").await.unwrap();
        assert_eq!(session.find_all("tr").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn scoped_lookup_and_sibling_selector() {
        let session = session();
        session.navigate("https://news.example").await.unwrap();

        let row = session.find_one("tr.athing", None).await.unwrap().unwrap();
        let link = session.find_one("a", Some(row)).await.unwrap().unwrap();
        assert_eq!(session.text(link).await.unwrap(), "First story");
        assert_eq!(session.attribute(link, "href").await.unwrap().as_deref(), Some("/x"));
        assert_eq!(session.find_one("span.score", Some(row)).await, Ok(None));

        let meta = session.find_one("tr[id=\"1\"] + tr", None).await.unwrap().unwrap();
        let score = session.find_one("span.score", Some(meta)).await.unwrap().unwrap();
        assert_eq!(session.text(score).await.unwrap(), "5 points");
    }

    #[tokio::test]
    async fn unknown_url_and_bad_selector_are_errors() {
        let session = session();
        assert!(matches!(
            session.navigate("https://elsewhere.example").await,
            Err(RenderError::Navigation { .. })
        ));
        session.navigate("https://news.example").await.unwrap();
        assert!(matches!(
            session.find_all("tr[").await,
            Err(RenderError::Selector { .. })
        ));
        assert_eq!(
            session.text(ElementHandle::new(42)).await,
            Err(RenderError::StaleElement(ElementHandle::new(42)))
        );
    }

    #[tokio::test]
    async fn closed_session_rejects_further_use() {
        let session = session();
        session.close().await.unwrap();
        assert!(session.is_closed());
        assert_eq!(session.navigate("https://news.example").await, Err(RenderError::Closed));
        assert_eq!(session.close().await, Err(RenderError::Closed));
    }
}
