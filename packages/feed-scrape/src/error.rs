//! Typed errors for the scraping library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Coarse classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchCause {
    /// Origin unreachable or not serving the page
    NetworkFailure,
    /// Request or render wait exceeded its bound
    Timeout,
    /// Render engine could not start, navigate, or capture the page
    RenderFailure,
}

/// Errors that can occur while retrieving a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response arrived
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Origin answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// Request or readiness wait timed out
    #[error("timeout after {after:?} fetching {url}")]
    Timeout { url: String, after: Duration },

    /// Render engine failure (launch, navigation, capture)
    #[error("render failed for {url}: {reason}")]
    Render { url: String, reason: String },
}

impl FetchError {
    /// Classify this error.
    pub fn cause(&self) -> FetchCause {
        match self {
            FetchError::Network { .. } | FetchError::Status { .. } => FetchCause::NetworkFailure,
            FetchError::Timeout { .. } => FetchCause::Timeout,
            FetchError::Render { .. } => FetchCause::RenderFailure,
        }
    }

    /// URL that was being fetched.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Network { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Render { url, .. } => url,
        }
    }

    pub(crate) fn render(url: &str, reason: impl fmt::Display) -> Self {
        FetchError::Render {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while loading or compiling a schema or source definition.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Selector failed to parse
    #[error("invalid selector `{selector}` for field `{field}`: {reason}")]
    InvalidSelector {
        field: String,
        selector: String,
        reason: String,
    },

    /// Schema defines no fields
    #[error("schema has no fields")]
    Empty,

    /// Source definition is inconsistent
    #[error("invalid source definition `{id}`: {reason}")]
    InvalidSource { id: String, reason: String },

    /// Definition file could not be read
    #[error("failed to read definitions: {0}")]
    Io(#[from] std::io::Error),

    /// Definition JSON is malformed
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable present but unparseable
    #[error("{name} must be {expected}, got `{value}`")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },
}

/// Error produced by a cache compute function, passed through unchanged.
///
/// Every waiter of one in-flight compute receives the same error, so the
/// inner value is shared.
pub struct CacheComputeError<E>(Arc<E>);

impl<E> CacheComputeError<E> {
    pub(crate) fn new(inner: Arc<E>) -> Self {
        Self(inner)
    }

    /// Borrow the original error.
    pub fn inner(&self) -> &E {
        &self.0
    }

    /// Take the original error back if no other waiter still holds it.
    pub fn into_inner(self) -> std::result::Result<E, Arc<E>> {
        Arc::try_unwrap(self.0)
    }
}

impl<E> Clone for CacheComputeError<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E: fmt::Debug> fmt::Debug for CacheComputeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheComputeError").field(&self.0).finish()
    }
}

impl<E: fmt::Display> fmt::Display for CacheComputeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CacheComputeError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Errors surfaced by the feed pipeline.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Fetching the source page failed
    #[error(transparent)]
    Fetch(#[from] CacheComputeError<FetchError>),

    /// Source definition did not compile
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No source registered under this id
    #[error("unknown source: {0}")]
    UnknownSource(String),
}

impl SourceError {
    /// Fetch cause, if this was a fetch failure.
    pub fn fetch_cause(&self) -> Option<FetchCause> {
        match self {
            SourceError::Fetch(e) => Some(e.inner().cause()),
            _ => None,
        }
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for schema loading.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_causes() {
        let status = FetchError::Status {
            url: "https://example.com".into(),
            status: 503,
        };
        assert_eq!(status.cause(), FetchCause::NetworkFailure);
        assert_eq!(status.url(), "https://example.com");

        let timeout = FetchError::Timeout {
            url: "https://example.com".into(),
            after: Duration::from_secs(5),
        };
        assert_eq!(timeout.cause(), FetchCause::Timeout);

        let render = FetchError::render("https://example.com", "browser crashed");
        assert_eq!(render.cause(), FetchCause::RenderFailure);
        assert!(render.to_string().contains("browser crashed"));
    }

    #[test]
    fn test_cache_compute_error_passes_through() {
        let err = CacheComputeError::new(Arc::new(FetchError::Status {
            url: "https://example.com".into(),
            status: 404,
        }));
        assert_eq!(err.to_string(), "HTTP 404 fetching https://example.com");

        let source: SourceError = err.clone().into();
        assert_eq!(source.fetch_cause(), Some(FetchCause::NetworkFailure));

        drop(source);
        assert!(matches!(
            err.into_inner(),
            Ok(FetchError::Status { status: 404, .. })
        ));
    }
}
