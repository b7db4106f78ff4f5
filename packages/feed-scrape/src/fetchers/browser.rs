//! Rendered-browser fetcher.
//!
//! Every fetch launches its own engine session and closes it before
//! returning, whatever the outcome. Sessions are never pooled.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::WaitCondition;
use crate::traits::renderer::RenderEngine;

/// Default bound on navigation plus readiness wait.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetcher for pages whose content is produced by client-side script.
#[derive(Clone)]
pub struct BrowserFetcher {
    engine: Arc<dyn RenderEngine>,
    render_timeout: Duration,
}

impl BrowserFetcher {
    /// Create a fetcher over `engine` with the default render timeout.
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            engine,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Set the render timeout.
    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Launch a session, render `url`, and close the session.
    ///
    /// Fails with `Timeout` when navigation plus `wait` exceeds the render
    /// timeout, and with `Render` when the engine fails. A session that
    /// cannot be closed also fails the fetch.
    pub async fn render(&self, url: &str, wait: Option<&WaitCondition>) -> FetchResult<String> {
        let started = Instant::now();
        debug!(url = %url, engine = self.engine.name(), wait = ?wait, "Launching render session");

        let mut session = self
            .engine
            .launch()
            .await
            .map_err(|e| FetchError::render(url, format!("launch failed: {}", e)))?;

        let outcome = tokio::time::timeout(self.render_timeout, session.open(url, wait)).await;
        let closed = session.close().await;

        let html = match outcome {
            Err(_) => {
                warn!(
                    url = %url,
                    timeout_ms = self.render_timeout.as_millis() as u64,
                    "Render wait timed out"
                );
                if let Err(e) = &closed {
                    warn!(url = %url, error = %e, "Render session close failed after timeout");
                }
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    after: self.render_timeout,
                });
            }
            Ok(Err(e)) => {
                if let Err(close_err) = &closed {
                    warn!(url = %url, error = %close_err, "Render session close failed after error");
                }
                return Err(FetchError::render(url, e));
            }
            Ok(Ok(html)) => html,
        };

        closed.map_err(|e| FetchError::render(url, format!("close failed: {}", e)))?;

        debug!(
            url = %url,
            bytes = html.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Render completed"
        );
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchCause;
    use crate::testing::MockRenderEngine;

    #[tokio::test]
    async fn test_render_returns_document_and_closes() {
        let engine = Arc::new(MockRenderEngine::new().with_page(
            "https://example.com/app",
            "<div id=\"plans\"><div class=\"card\">Pro</div></div>",
        ));
        let fetcher = BrowserFetcher::new(engine.clone());

        let html = fetcher
            .render("https://example.com/app", Some(&WaitCondition::selector(".card")))
            .await
            .unwrap();

        assert!(html.contains("Pro"));
        assert_eq!(engine.launches(), 1);
        assert_eq!(engine.closes(), 1);
    }

    #[tokio::test]
    async fn test_wait_never_satisfied_times_out_and_releases() {
        let engine = Arc::new(
            MockRenderEngine::new().with_page("https://example.com/app", "<div>loading</div>"),
        );
        let fetcher = BrowserFetcher::new(engine.clone())
            .with_render_timeout(Duration::from_millis(50));

        let err = fetcher
            .render("https://example.com/app", Some(&WaitCondition::selector("#never")))
            .await
            .unwrap_err();

        assert_eq!(err.cause(), FetchCause::Timeout);
        assert_eq!(engine.launches(), 1);
        assert_eq!(engine.closes(), 1);
        assert_eq!(engine.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_navigation_error_is_render_failure_and_releases() {
        let engine = Arc::new(MockRenderEngine::new());
        let fetcher = BrowserFetcher::new(engine.clone());

        let err = fetcher.render("https://example.com/404", None).await.unwrap_err();

        assert_eq!(err.cause(), FetchCause::RenderFailure);
        assert_eq!(engine.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_is_render_failure() {
        let engine = Arc::new(MockRenderEngine::new().failing_launch());
        let fetcher = BrowserFetcher::new(engine.clone());

        let err = fetcher.render("https://example.com", None).await.unwrap_err();

        assert_eq!(err.cause(), FetchCause::RenderFailure);
        assert!(err.to_string().contains("launch failed"));
        assert_eq!(engine.launches(), 0);
    }

    #[tokio::test]
    async fn test_each_fetch_gets_own_session() {
        let engine = Arc::new(MockRenderEngine::new().with_page("https://example.com", "<p>x</p>"));
        let fetcher = BrowserFetcher::new(engine.clone());

        let (a, b) = tokio::join!(
            fetcher.render("https://example.com", Some(&WaitCondition::NetworkIdle)),
            fetcher.render("https://example.com", None),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(engine.launches(), 2);
        assert_eq!(engine.closes(), 2);
    }
}
