//! Browser-rendering capability.
//!
//! An engine launches isolated sessions; a session renders one page and
//! is then closed. The fetcher owns the session for the duration of one
//! fetch and closes it on every exit path.

use async_trait::async_trait;

use crate::traits::fetcher::WaitCondition;

/// Engine-level error, mapped to `FetchError` by the fetcher.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for render operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Launches rendering sessions.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Start a fresh, isolated browser instance.
    async fn launch(&self) -> RenderResult<Box<dyn RenderSession>>;

    /// Get the engine name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// One running browser instance.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url`, wait for `wait` if given, and return the rendered document.
    ///
    /// May never return if the wait condition never holds; callers bound it.
    async fn open(&mut self, url: &str, wait: Option<&WaitCondition>) -> RenderResult<String>;

    /// Shut the instance down.
    async fn close(self: Box<Self>) -> RenderResult<()>;
}
