//! Testing utilities including mock implementations.
//!
//! These are useful for testing code that uses the scraping library
//! without making real network calls or launching a browser.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{FetchError, FetchResult};
use crate::traits::{
    fetcher::{FetchStrategy, Fetcher, WaitCondition},
    renderer::{RenderEngine, RenderResult, RenderSession},
};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }
}

/// A mock fetcher for testing.
///
/// Serves predefined pages by URL and records every call.
#[derive(Default, Clone)]
pub struct MockFetcher {
    /// Predefined pages by URL
    pages: Arc<RwLock<HashMap<String, String>>>,

    /// URLs that should fail, with the HTTP status to report
    fail_urls: Arc<RwLock<HashMap<String, u16>>>,

    /// Artificial latency per fetch
    delay: Option<Duration>,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockFetchCall>>>,
}

/// Record of a call made to the mock fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MockFetchCall {
    pub url: String,
    pub strategy: FetchStrategy,
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined page.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), html.into());
        self
    }

    /// Replace a page's content after construction.
    pub fn set_page(&self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.write().unwrap().insert(url.into(), html.into());
    }

    /// Mark a URL as failing with `status`.
    pub fn fail_url(self, url: impl Into<String>, status: u16) -> Self {
        self.fail_urls.write().unwrap().insert(url.into(), status);
        self
    }

    /// Delay every fetch, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockFetchCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, strategy: &FetchStrategy) -> FetchResult<String> {
        self.calls.write().unwrap().push(MockFetchCall {
            url: url.to_string(),
            strategy: strategy.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = self.fail_urls.read().unwrap().get(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            });
        }

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock render engine.
///
/// Sessions serve predefined pages. A `Selector` wait that matches nothing
/// in the page never completes, like a real browser waiting for content
/// that never appears. Launches and closes are counted so tests can
/// assert that no session leaks.
#[derive(Default)]
pub struct MockRenderEngine {
    pages: Arc<RwLock<HashMap<String, String>>>,
    fail_launch: AtomicBool,
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl MockRenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page the engine can render.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), html.into());
        self
    }

    /// Make every launch fail.
    pub fn failing_launch(self) -> Self {
        self.fail_launch.store(true, Ordering::SeqCst);
        self
    }

    /// Sessions successfully launched.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Sessions closed.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Sessions launched but not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.launches() - self.closes()
    }
}

#[async_trait]
impl RenderEngine for MockRenderEngine {
    async fn launch(&self) -> RenderResult<Box<dyn RenderSession>> {
        if self.fail_launch.load(Ordering::SeqCst) {
            return Err("mock browser failed to start".into());
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRenderSession {
            pages: Arc::clone(&self.pages),
            closes: Arc::clone(&self.closes),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockRenderSession {
    pages: Arc<RwLock<HashMap<String, String>>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderSession for MockRenderSession {
    async fn open(&mut self, url: &str, wait: Option<&WaitCondition>) -> RenderResult<String> {
        let html = self
            .pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| format!("navigation to {} failed", url))?;

        if let Some(WaitCondition::Selector(selector)) = wait {
            if !contains_selector(&html, selector)? {
                futures::future::pending::<()>().await;
            }
        }

        Ok(html)
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn contains_selector(html: &str, selector: &str) -> RenderResult<bool> {
    let selector =
        Selector::parse(selector).map_err(|e| format!("invalid wait selector: {}", e))?;
    Ok(Html::parse_document(html).select(&selector).next().is_some())
}

/// Fixture pages shaped like the built-in sources.
pub mod fixtures {
    /// MCP server listing: three entries, the second without creator or icon.
    pub const MCP_FEED: &str = r#"<!DOCTYPE html>
<html><head><title>MCP Servers</title></head>
<body>
  <div class="my-4 cursor-pointer">
    <img src="/logos/filesystem.png" alt="">
    <a class="font-medium text-primary" href="/server/filesystem/modelcontextprotocol"><h3>Filesystem</h3></a>
    <p class="mt-0.5">created by modelcontextprotocol</p>
    <div class="mt-2 text-sm"><p>Secure file operations with configurable access controls.</p></div>
    <span class="whitespace-nowrap">2 hours ago</span>
  </div>
  <div class="my-4 cursor-pointer">
    <a class="font-medium text-primary" href="/server/weather"><h3>Weather</h3></a>
    <p class="mt-0.5">Official integration</p>
    <div class="mt-2 text-sm"><p>Forecasts for &lt;any&gt; city.</p></div>
    <span class="whitespace-nowrap">5 hours ago</span>
  </div>
  <div class="my-4 cursor-pointer">
    <img src="https://cdn.example.com/git.svg" alt="">
    <a class="font-medium text-primary" href="https://github.com/bob/git-mcp"><h3>Git</h3></a>
    <p class="mt-0.5">created by bob</p>
    <div class="mt-2 text-sm"><p>Read and search git repositories.</p></div>
    <span class="whitespace-nowrap">1 day ago</span>
  </div>
</body></html>"#;

    /// Landing page with the usual SEO markup.
    pub const SEO_HOME: &str = r#"<!DOCTYPE html>
<html><head>
  <title>Phone Monitoring App</title>
  <meta name="description" content="Monitor any phone remotely.">
  <meta name="keywords" content="monitoring, parental control">
  <link rel="canonical" href="/en/">
  <meta property="og:title" content="Monitoring made simple">
  <meta property="og:image" content="https://cdn.example.com/og.png">
  <meta name="twitter:card" content="summary_large_image">
  <script type="application/ld+json">{"@type":"SoftwareApplication"}</script>
</head>
<body>
  <h1>Keep your family safe</h1>
  <h2>Location tracking</h2>
  <h2>Message monitoring</h2>
</body></html>"#;

    /// TiSPY pricing columns.
    pub const TISPY_PRICING: &str = r#"<!DOCTYPE html>
<html><body>
  <section id="plans"><div class="row">
    <div class="col-md-4">
      <h2>Basic</h2>
      <p>Essential monitoring.</p>
      <div class="price"><span>9.99</span></div>
      <font color="red"><strike>39.99</strike></font>
      <lable for="d_90"><b>3 months</b></lable>
      <a class="buttons" href="/buy/basic">Buy Basic</a>
    </div>
    <div class="col-md-4">
      <h2>Premium</h2>
      <p>Everything in Basic plus social apps.</p>
      <div class="price"><span>16.66</span></div>
      <font color="red"><strike>69.99</strike></font>
      <lable for="d_90"><b>3 months</b></lable>
      <a class="buttons" href="/buy/premium">Buy Premium</a>
      <a class="buttons" href="/trial/premium">Free Trial</a>
    </div>
  </div></section>
</body></html>"#;

    /// mSpy plan cards.
    pub const MSPY_PRICING: &str = r#"<!DOCTYPE html>
<html><body>
  <div class="funnel-concept__plans">
    <div class="plan_item">
      <div class="plan_item--period">1 Month</div>
      <div class="plan_item--description">Try it out</div>
      <div class="plan_item--price-value">$48.99</div>
      <span class="plan_item--features_text">GPS</span>
      <span class="plan_item--features_text">Call logs</span>
    </div>
    <div class="plan_item">
      <div class="plan_item--period">12 Months</div>
      <div class="plan_item--description">Best value</div>
      <div class="plan_item--price-value">$11.66</div>
      <span class="plan_item--features_text">GPS</span>
      <span class="plan_item--features_text">Social apps</span>
      <span class="plan_item--features_text">Keylogger</span>
    </div>
  </div>
</body></html>"#;
}
