use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use scrape_logging::{scrape_debug, scrape_info, scrape_warn};
use tokio::task::JoinHandle;

use super::{collapse_whitespace, ElementHandle, RenderError, RenderSession, SessionLauncher, SessionSettings};

/// Starts a local Chrome/Chromium over the DevTools protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

#[async_trait::async_trait(?Send)]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self, settings: &SessionSettings) -> Result<Box<dyn RenderSession>, RenderError> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .request_timeout(settings.request_timeout);
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        for arg in &settings.extra_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| RenderError::Launch(err.to_string()))?;

        // The CDP connection only makes progress while its handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    scrape_debug!("CDP handler stopped: {}", err);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(RenderError::Launch(err.to_string()));
            }
        };

        scrape_info!("Browser session started (headless: {})", settings.headless);
        Ok(Box::new(ChromiumSession {
            browser: RefCell::new(Some(browser)),
            handler: RefCell::new(Some(handler_task)),
            page,
            elements: RefCell::new(Vec::new()),
            navigation_timeout: settings.request_timeout,
        }))
    }
}

pub struct ChromiumSession {
    browser: RefCell<Option<Browser>>,
    handler: RefCell<Option<JoinHandle<()>>>,
    page: Page,
    elements: RefCell<Vec<Rc<Element>>>,
    navigation_timeout: Duration,
}

impl ChromiumSession {
    fn element(&self, handle: ElementHandle) -> Result<Rc<Element>, RenderError> {
        self.elements
            .borrow()
            .get(handle.index())
            .cloned()
            .ok_or(RenderError::StaleElement(handle))
    }

    fn register(&self, found: Vec<Element>) -> Vec<ElementHandle> {
        let mut elements = self.elements.borrow_mut();
        let start = elements.len();
        elements.extend(found.into_iter().map(Rc::new));
        (start..elements.len()).map(ElementHandle::new).collect()
    }

    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.browser.borrow().is_some() {
            Ok(())
        } else {
            Err(RenderError::Closed)
        }
    }
}

#[async_trait::async_trait(?Send)]
impl RenderSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        self.ensure_open()?;
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Err(_) => Err(RenderError::Timeout {
                url: url.to_string(),
            }),
            Ok(Err(err)) => Err(RenderError::Navigation {
                url: url.to_string(),
                message: err.to_string(),
            }),
            Ok(Ok(_)) => {
                self.elements.borrow_mut().clear();
                Ok(())
            }
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, RenderError> {
        self.ensure_open()?;
        let found = self
            .page
            .find_elements(selector)
            .await
            .map_err(|err| query_error(selector, err))?;
        Ok(self.register(found))
    }

    async fn find_one(
        &self,
        selector: &str,
        scope: Option<ElementHandle>,
    ) -> Result<Option<ElementHandle>, RenderError> {
        self.ensure_open()?;
        let found = match scope {
            Some(handle) => {
                let parent = self.element(handle)?;
                parent.find_elements(selector).await
            }
            None => self.page.find_elements(selector).await,
        }
        .map_err(|err| query_error(selector, err))?;
        Ok(self.register(found.into_iter().take(1).collect()).into_iter().next())
    }

    async fn text(&self, element: ElementHandle) -> Result<String, RenderError> {
        let element = self.element(element)?;
        let text = element
            .inner_text()
            .await
            .map_err(|err| RenderError::Browser(err.to_string()))?;
        Ok(collapse_whitespace(text.as_deref().unwrap_or_default()))
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RenderError> {
        let element = self.element(element)?;
        element
            .attribute(name)
            .await
            .map_err(|err| RenderError::Browser(err.to_string()))
    }

    async fn close(&self) -> Result<(), RenderError> {
        let browser = self.browser.borrow_mut().take();
        let Some(mut browser) = browser else {
            return Err(RenderError::Closed);
        };
        self.elements.borrow_mut().clear();

        let closed = browser.close().await;
        if let Err(err) = browser.wait().await {
            scrape_warn!("Browser process did not exit cleanly: {}", err);
        }
        if let Some(handler) = self.handler.borrow_mut().take() {
            handler.abort();
        }
        closed
            .map(|_| ())
            .map_err(|err| RenderError::Browser(err.to_string()))
    }
}

fn query_error(selector: &str, err: impl std::fmt::Display) -> RenderError {
    RenderError::Query {
        selector: selector.to_string(),
        message: err.to_string(),
    }
}
