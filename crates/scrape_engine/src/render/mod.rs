//! Narrow interface over a rendering backend: load a page, query its live DOM.
//!
//! The listing pipeline only talks to [`RenderSession`], so it runs the same
//! against headless Chrome and against the in-memory [`StaticDomSession`].

#[cfg(feature = "chromium")]
mod chromium;
mod static_dom;

use std::time::Duration;

use thiserror::Error;

#[cfg(feature = "chromium")]
pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use static_dom::{StaticDomLauncher, StaticDomSession};

/// Opaque reference to an element found in the current page.
///
/// Handles are invalidated by the next `navigate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(usize);

impl ElementHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("navigation to {url} timed out")]
    Timeout { url: String },
    #[error("invalid selector {selector:?}")]
    Selector { selector: String },
    #[error("query {selector:?} failed: {message}")]
    Query { selector: String, message: String },
    #[error("element handle {0:?} is not valid for the current page")]
    StaleElement(ElementHandle),
    #[error("no page loaded")]
    NoPage,
    #[error("session already closed")]
    Closed,
    #[error("browser error: {0}")]
    Browser(String),
}

/// Launch options for a rendering session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub headless: bool,
    pub sandbox: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub extra_args: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            window_width: 1920,
            window_height: 1080,
            extra_args: vec![
                "--disable-gpu".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A live page plus its DOM. Exclusively owned by one pipeline run.
///
/// Lookups that match nothing return `Ok(None)` / an empty vector; `Err` is
/// reserved for backend failures.
#[async_trait::async_trait(?Send)]
pub trait RenderSession {
    async fn navigate(&self, url: &str) -> Result<(), RenderError>;

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, RenderError>;

    /// First match of `selector` under `scope`, or in the whole page when `scope` is `None`.
    async fn find_one(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
    ) -> Result<Option<ElementHandle>, RenderError>;

    /// Visible text, whitespace collapsed.
    async fn text(&self, element: ElementHandle) -> Result<String, RenderError>;

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RenderError>;

    /// Release the backend. Called exactly once per session.
    async fn close(&self) -> Result<(), RenderError>;
}

#[async_trait::async_trait(?Send)]
pub trait SessionLauncher {
    async fn launch(&self, settings: &SessionSettings) -> Result<Box<dyn RenderSession>, RenderError>;
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
