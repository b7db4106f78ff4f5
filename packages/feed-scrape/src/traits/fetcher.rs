//! Fetcher trait for retrieving raw page content.
//!
//! A content source picks its [`FetchStrategy`] at configuration time;
//! implementations dispatch on it and hand back the document HTML.
//!
//! # Usage
//!
//! ```rust,ignore
//! use feed_scrape::traits::fetcher::{FetchStrategy, Fetcher, WaitCondition};
//!
//! let html = fetcher.fetch("https://example.com", &FetchStrategy::DirectHttp).await?;
//!
//! let rendered = fetcher
//!     .fetch(
//!         "https://example.com/app",
//!         &FetchStrategy::rendered(WaitCondition::selector("#plans .card")),
//!     )
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchResult;

/// Readiness condition for rendered pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum WaitCondition {
    /// CSS selector that must match at least one element
    Selector(String),
    /// Navigation finished and the network has been quiet briefly
    NetworkIdle,
}

impl WaitCondition {
    /// Wait for a selector to appear.
    pub fn selector(selector: impl Into<String>) -> Self {
        WaitCondition::Selector(selector.into())
    }
}

/// How a page is retrieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Single HTTP GET, body returned as-is
    #[default]
    DirectHttp,
    /// Full browser render, optionally gated on a readiness condition
    RenderedBrowser {
        #[serde(default)]
        wait: Option<WaitCondition>,
    },
}

impl FetchStrategy {
    /// Rendered fetch waiting on `wait`.
    pub fn rendered(wait: WaitCondition) -> Self {
        FetchStrategy::RenderedBrowser { wait: Some(wait) }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            FetchStrategy::DirectHttp => "direct_http",
            FetchStrategy::RenderedBrowser { .. } => "rendered_browser",
        }
    }
}

/// Fetcher trait for pluggable page retrieval.
///
/// Implementations:
/// - `PageFetcher` - dispatches to HTTP or a render engine
/// - `MockFetcher` - canned pages for tests
///
/// No retries happen at this layer; callers wrap their own policy.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` using `strategy` and return the document HTML.
    async fn fetch(&self, url: &str, strategy: &FetchStrategy) -> FetchResult<String>;

    /// Get the fetcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_json() {
        let direct: FetchStrategy = serde_json::from_str(r#"{"kind":"direct_http"}"#).unwrap();
        assert_eq!(direct, FetchStrategy::DirectHttp);

        let rendered: FetchStrategy = serde_json::from_str(
            r##"{"kind":"rendered_browser","wait":{"type":"selector","value":"#plans"}}"##,
        )
        .unwrap();
        assert_eq!(rendered, FetchStrategy::rendered(WaitCondition::selector("#plans")));

        let idle: FetchStrategy = serde_json::from_str(
            r#"{"kind":"rendered_browser","wait":{"type":"network_idle"}}"#,
        )
        .unwrap();
        assert_eq!(idle, FetchStrategy::rendered(WaitCondition::NetworkIdle));

        let bare: FetchStrategy =
            serde_json::from_str(r#"{"kind":"rendered_browser"}"#).unwrap();
        assert_eq!(bare, FetchStrategy::RenderedBrowser { wait: None });
    }

    #[test]
    fn test_strategy_label() {
        assert_eq!(FetchStrategy::DirectHttp.label(), "direct_http");
        assert_eq!(
            FetchStrategy::rendered(WaitCondition::NetworkIdle).label(),
            "rendered_browser"
        );
    }
}
