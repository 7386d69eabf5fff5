//! Rendered page fetches via a headless Chromium session.
//!
//! Requires the `browser` feature flag:
//! ```toml
//! paper-crawl = { version = "0.1", features = ["browser"] }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;

use super::Fetch;
use crate::crawl::CrawlError;

/// Controls that reveal collapsed page content. Locating either is
/// best-effort; a missing control never aborts the fetch.
const EXPAND_ABSTRACT: &str = "[data-selenium-selector='text-truncator-toggle']";
const EXPAND_AUTHORS: &str = "[data-selenium-selector='author-list-expander']";

/// Rendered fetch: executes the page's scripts and clicks the
/// abstract/author expansion controls before capturing the document.
///
/// Each fetch owns a dedicated browser session, torn down on every exit
/// path, so concurrent crawlers never share rendering state.
pub struct RenderedFetcher {
    navigation_timeout: Duration,
}

impl RenderedFetcher {
    pub fn new(navigation_timeout: Duration) -> Self {
        Self { navigation_timeout }
    }

    fn session_config(&self) -> Result<BrowserConfig, CrawlError> {
        // Images, stylesheets, and plugins are dead weight for metadata
        // scraping; dropping them keeps the session fast.
        BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--blink-settings=imagesEnabled=false")
            .arg("--disable-remote-fonts")
            .arg("--disable-plugins")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(CrawlError::Browser)
    }
}

#[async_trait]
impl Fetch for RenderedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let config = self.session_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlError::Browser(format!("launch failed: {e}")))?;
        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let result = tokio::time::timeout(self.navigation_timeout, capture(&browser, url))
            .await
            .unwrap_or_else(|_| {
                Err(CrawlError::Browser(format!("rendering timed out for {url}")))
            });

        // Teardown runs on every path, including capture failure.
        if let Err(e) = browser.close().await {
            tracing::warn!(%url, "failed to close browser session: {e}");
        }
        handler_task.abort();

        result
    }
}

async fn capture(browser: &Browser, url: &str) -> Result<String, CrawlError> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| CrawlError::Browser(format!("navigation to {url} failed: {e}")))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| CrawlError::Browser(format!("navigation to {url} failed: {e}")))?;

    for selector in [EXPAND_ABSTRACT, EXPAND_AUTHORS] {
        if let Err(e) = expand(&page, selector).await {
            tracing::info!(%url, selector, "content left unexpanded: {e}");
        }
    }

    let html = page
        .content()
        .await
        .map_err(|e| CrawlError::Browser(format!("capture of {url} failed: {e}")))?;
    if let Err(e) = page.close().await {
        tracing::debug!(%url, "failed to close page: {e}");
    }
    Ok(html)
}

async fn expand(page: &Page, selector: &str) -> Result<(), CrawlError> {
    let element = page
        .find_element(selector)
        .await
        .map_err(|e| CrawlError::Interaction(format!("{selector} not found: {e}")))?;
    element
        .click()
        .await
        .map_err(|e| CrawlError::Interaction(format!("click on {selector} failed: {e}")))?;
    Ok(())
}
