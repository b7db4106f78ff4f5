//! Source-to-feed pipeline.
//!
//! `run` looks the extraction up in the TTL cache under the source's key.
//! On a miss (or expiry) it fetches the page with the source's strategy and
//! extracts records; concurrent runs of one source share that work. The
//! records, cached or fresh, are then turned into feed items.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::TtlCache;
use crate::config::ScrapeConfig;
use crate::error::{FetchError, Result};
use crate::extract::{extract, Extraction};
use crate::feed::{Feed, FeedSynthesizer};
use crate::fetchers::PageFetcher;
use crate::sources::SourceDefinition;
use crate::traits::fetcher::Fetcher;

/// Cache of extractions keyed by source cache key.
pub type ExtractionCache = TtlCache<Extraction, FetchError>;

/// Owns the cache, fetcher and synthesizer shared by every source.
pub struct FeedPipeline<F: Fetcher + ?Sized = PageFetcher> {
    fetcher: Arc<F>,
    cache: ExtractionCache,
    synthesizer: FeedSynthesizer,
}

impl FeedPipeline<PageFetcher> {
    /// Pipeline with a real fetcher configured from `config`.
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(
            Arc::new(PageFetcher::from_config(config)),
            ExtractionCache::new(),
            FeedSynthesizer::new().with_interval(config.item_interval()),
        )
    }
}

impl<F: Fetcher + ?Sized + 'static> FeedPipeline<F> {
    pub fn new(fetcher: Arc<F>, cache: ExtractionCache, synthesizer: FeedSynthesizer) -> Self {
        Self {
            fetcher,
            cache,
            synthesizer,
        }
    }

    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    pub fn synthesizer(&self) -> &FeedSynthesizer {
        &self.synthesizer
    }

    /// Build the feed for `source`.
    ///
    /// Fetch failures are returned unchanged (wrapped as
    /// [`SourceError::Fetch`](crate::error::SourceError::Fetch)) and leave
    /// nothing in the cache.
    pub async fn run(&self, source: &SourceDefinition) -> Result<Feed> {
        let started = Instant::now();
        let extraction = self.extraction(source).await.map_err(|e| {
            warn!(source = %source.id, error = %e, "Source run failed");
            e
        })?;

        let item = self
            .synthesizer
            .build(extraction.records(), &source.link, &source.items);

        info!(
            source = %source.id,
            records = extraction.len(),
            items = item.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Feed built"
        );

        Ok(Feed {
            title: source.title.clone(),
            link: source.link.clone(),
            description: source.description.clone(),
            item,
        })
    }

    /// Cached extraction for `source`, fetching on miss.
    pub async fn extraction(&self, source: &SourceDefinition) -> Result<Extraction> {
        let schema = Arc::new(source.compile()?);
        let base = Url::parse(&source.link).ok();
        let fetcher = Arc::clone(&self.fetcher);
        let url = source.link.clone();
        let strategy = source.strategy.clone();
        let id = source.id.clone();

        let extraction = self
            .cache
            .get_or_compute(&source.cache_key, source.ttl(), move || async move {
                debug!(source = %id, url = %url, strategy = strategy.label(), "Fetching source");
                let html = fetcher.fetch(&url, &strategy).await?;
                let extraction = extract(&html, &schema, base.as_ref());
                debug!(source = %id, records = extraction.len(), "Extracted records");
                Ok::<_, FetchError>(extraction)
            })
            .await?;

        Ok(extraction)
    }
}
