//! Selector-Driven Page Scraping Library
//!
//! Fetches pages over plain HTTP or through a headless browser, extracts
//! records with declarative CSS-selector schemas, caches the extraction
//! per source, and turns the records into feed items with stable
//! identifiers and source-ordered timestamps.
//!
//! # Design Philosophy
//!
//! - Schemas are data, validated when loaded
//! - Source document order is the item order
//! - One fetch per source per TTL, however many callers
//! - Library handles mechanics, the route layer handles presentation
//!
//! # Usage
//!
//! ```rust,ignore
//! use feed_scrape::{sources, FeedPipeline, ScrapeConfig};
//!
//! let config = ScrapeConfig::from_env()?;
//! let pipeline = FeedPipeline::from_config(&config);
//!
//! let source = sources::by_id("mcp-so/feed").expect("built-in source");
//! let feed = pipeline.run(&source).await?;
//! for item in &feed.item {
//!     println!("{} {}", item.pub_date, item.title);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Fetcher, RenderEngine, CacheStore)
//! - [`fetchers`] - HTTP and rendered-browser fetchers
//! - [`extract`] - Schemas and document extraction
//! - [`cache`] - TTL cache with single-flight compute
//! - [`stores`] - Cache store implementations
//! - [`feed`] - Feed item synthesis
//! - [`sources`] - Built-in and file-loaded source definitions
//! - [`pipeline`] - Source-to-feed pipeline
//! - [`testing`] - Mock implementations for testing

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod feed;
pub mod fetchers;
pub mod pipeline;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;

// Re-export core types at crate root
pub use cache::TtlCache;
pub use clock::{Clock, SystemClock};
pub use config::ScrapeConfig;
pub use error::{
    CacheComputeError, ConfigError, FetchCause, FetchError, SchemaError, SourceError,
};
pub use extract::{
    extract, CompiledSchema, ExtractedRecord, Extraction, FieldRule, FieldSchema, Schema,
    Transform,
};
pub use feed::{
    DescriptionTemplate, Feed, FeedItem, FeedSynthesizer, ItemMode, ItemTemplate, Part,
    PartStyle, Section,
};
pub use fetchers::{BrowserFetcher, HttpFetcher, PageFetcher};
pub use pipeline::{ExtractionCache, FeedPipeline};
pub use sources::{SourceDefinition, SourceRegistry};
pub use stores::MemoryCacheStore;
pub use traits::{
    fetcher::{FetchStrategy, Fetcher, WaitCondition},
    renderer::{RenderEngine, RenderSession},
    store::{CacheEntry, CacheStore},
};

#[cfg(feature = "chromium")]
pub use fetchers::ChromiumEngine;

// Re-export testing utilities
pub use testing::{ManualClock, MockFetcher, MockRenderEngine};
