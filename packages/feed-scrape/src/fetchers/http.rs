//! Direct HTTP fetcher.
//!
//! One GET per fetch, body returned unchanged. No retries.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};

/// Default request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent; some origins reject obvious bot agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP fetcher for pages whose content is present in the initial response.
///
/// For pages built by client-side script, use `BrowserFetcher` instead.
///
/// # Example
///
/// ```rust,ignore
/// let fetcher = HttpFetcher::new().with_timeout(Duration::from_secs(10));
/// let html = fetcher.get("https://example.com").await?;
/// ```
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a new HTTP fetcher with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET `url` and return the response body.
    pub async fn get(&self, url: &str) -> FetchResult<String> {
        debug!(url = %url, "HTTP fetch starting");
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "HTTP fetch returned error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_error(url, e))?;

        debug!(
            url = %url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "HTTP fetch completed"
        );
        Ok(body)
    }

    fn map_error(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source: Box::new(error),
            }
        }
    }
}
