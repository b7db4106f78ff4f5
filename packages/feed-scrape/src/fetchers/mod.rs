//! Fetcher implementations.
//!
//! # Available Fetchers
//!
//! - `HttpFetcher` - Single HTTP GET
//! - `BrowserFetcher` - Scoped render session per fetch
//! - `PageFetcher` - Dispatches on `FetchStrategy` to one of the above
//! - `ChromiumEngine` - Headless Chromium (requires `chromium` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use feed_scrape::fetchers::{HttpFetcher, PageFetcher};
//! use feed_scrape::traits::fetcher::{FetchStrategy, Fetcher};
//!
//! let fetcher = PageFetcher::new(HttpFetcher::new());
//! let html = fetcher.fetch("https://example.com", &FetchStrategy::DirectHttp).await?;
//! ```

mod browser;
mod http;

#[cfg(feature = "chromium")]
mod chromium;

pub use browser::{BrowserFetcher, DEFAULT_RENDER_TIMEOUT};
pub use http::{HttpFetcher, DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT};

#[cfg(feature = "chromium")]
pub use chromium::ChromiumEngine;

use async_trait::async_trait;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::ScrapeConfig;
use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchStrategy, Fetcher};

/// Strategy-dispatching fetcher.
///
/// Holds the HTTP client and, optionally, a browser fetcher. A rendered
/// fetch without a configured browser fails with `RenderFailure`.
#[derive(Clone)]
pub struct PageFetcher {
    http: HttpFetcher,
    browser: Option<BrowserFetcher>,
}

impl PageFetcher {
    /// Create a fetcher that only supports direct HTTP.
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            browser: None,
        }
    }

    /// Enable rendered fetches.
    pub fn with_browser(mut self, browser: BrowserFetcher) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Build from configuration.
    ///
    /// With the `chromium` feature, rendered fetches use headless Chromium.
    pub fn from_config(config: &ScrapeConfig) -> Self {
        let http = HttpFetcher::new()
            .with_user_agent(config.user_agent.clone())
            .with_timeout(config.http_timeout());

        #[allow(unused_mut)]
        let mut fetcher = Self::new(http);

        #[cfg(feature = "chromium")]
        {
            let mut engine = ChromiumEngine::new();
            if let Some(path) = &config.chrome_executable {
                engine = engine.with_executable(path);
            }
            fetcher = fetcher.with_browser(
                BrowserFetcher::new(std::sync::Arc::new(engine))
                    .with_render_timeout(config.render_timeout()),
            );
        }

        fetcher
    }

    /// Whether rendered fetches are available.
    pub fn supports_rendering(&self) -> bool {
        self.browser.is_some()
    }
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str, strategy: &FetchStrategy) -> FetchResult<String> {
        let started = Instant::now();

        let result = match strategy {
            FetchStrategy::DirectHttp => self.http.get(url).await,
            FetchStrategy::RenderedBrowser { wait } => match &self.browser {
                Some(browser) => browser.render(url, wait.as_ref()).await,
                None => Err(FetchError::render(url, "no render engine configured")),
            },
        };

        match &result {
            Ok(html) => info!(
                url = %url,
                strategy = strategy.label(),
                bytes = html.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Page fetched"
            ),
            Err(e) => warn!(
                url = %url,
                strategy = strategy.label(),
                error = %e,
                "Page fetch failed"
            ),
        }

        result
    }

    fn name(&self) -> &str {
        "page"
    }
}
