//! Headless Chromium render engine.
//!
//! Requires the `chromium` feature and a Chrome/Chromium binary on the
//! host (or `CHROME_EXECUTABLE`).

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::traits::fetcher::WaitCondition;
use crate::traits::renderer::{RenderEngine, RenderResult, RenderSession};

/// Quiet period after navigation for `WaitCondition::NetworkIdle`.
const NETWORK_IDLE_SETTLE: Duration = Duration::from_millis(500);

/// Interval between selector polls for `WaitCondition::Selector`.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches one headless Chromium process per session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumEngine {
    executable: Option<PathBuf>,
}

impl ChromiumEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific Chrome/Chromium binary.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn launch(&self) -> RenderResult<Box<dyn RenderSession>> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build()?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("Chromium session launched");
        Ok(Box::new(ChromiumSession { browser, handler }))
    }

    fn name(&self) -> &str {
        "chromium"
    }
}

struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn open(&mut self, url: &str, wait: Option<&WaitCondition>) -> RenderResult<String> {
        let page = self.browser.new_page(url).await?;
        page.wait_for_navigation().await?;

        match wait {
            Some(WaitCondition::Selector(selector)) => {
                while page.find_element(selector.as_str()).await.is_err() {
                    tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
                }
            }
            Some(WaitCondition::NetworkIdle) => tokio::time::sleep(NETWORK_IDLE_SETTLE).await,
            None => {}
        }

        Ok(page.content().await?)
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        let mut session = *self;
        let closed = session.browser.close().await;
        let exited = session.browser.wait().await;
        session.handler.abort();

        closed?;
        exited?;
        debug!("Chromium session closed");
        Ok(())
    }
}
