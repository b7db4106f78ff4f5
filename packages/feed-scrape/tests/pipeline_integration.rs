//! Integration tests for the source-to-feed pipeline.
//!
//! These tests drive the full path through the public API:
//! 1. Dispatch on fetch strategy (direct or rendered)
//! 2. Extract records with the source schema
//! 3. Cache the extraction under the source key
//! 4. Synthesize ordered, stably identified feed items

use std::sync::Arc;
use std::time::Duration;

use feed_scrape::{
    sources, testing::fixtures, BrowserFetcher, CacheStore, ExtractionCache, FeedPipeline, FeedSynthesizer,
    FetchCause, HttpFetcher, MockFetcher, MockRenderEngine, PageFetcher, SourceRegistry,
};

/// Helper to build a pipeline whose rendered fetches go to `engine`.
fn rendered_pipeline(engine: Arc<MockRenderEngine>, timeout: Duration) -> FeedPipeline {
    let fetcher = PageFetcher::new(HttpFetcher::new())
        .with_browser(BrowserFetcher::new(engine).with_render_timeout(timeout));
    FeedPipeline::new(
        Arc::new(fetcher),
        ExtractionCache::new(),
        FeedSynthesizer::new(),
    )
}

#[tokio::test]
async fn test_rendered_pricing_source_end_to_end() {
    let engine = Arc::new(
        MockRenderEngine::new().with_page("https://www.mspy.net/price.html", fixtures::MSPY_PRICING),
    );
    let pipeline = rendered_pipeline(engine.clone(), Duration::from_secs(5));
    let source = sources::by_id("mspy/pricing").unwrap();

    let feed = pipeline.run(&source).await.unwrap();

    assert_eq!(feed.title, "mSpy Pricing");
    assert_eq!(feed.len(), 2);
    assert_eq!(feed.item[0].title, "mSpy Plan: 1 Month");
    assert_eq!(engine.launches(), 1);
    assert_eq!(engine.open_sessions(), 0);
}

#[tokio::test]
async fn test_rendered_wait_timeout_releases_session() {
    // Plans never appear on this page.
    let engine = Arc::new(
        MockRenderEngine::new().with_page("https://www.mspy.net/price.html", "<div>Loading...</div>"),
    );
    let pipeline = rendered_pipeline(engine.clone(), Duration::from_millis(50));
    let source = sources::by_id("mspy/pricing").unwrap();

    let err = pipeline.run(&source).await.unwrap_err();

    assert_eq!(err.fetch_cause(), Some(FetchCause::Timeout));
    assert_eq!(engine.launches(), 1);
    assert_eq!(engine.open_sessions(), 0);
    assert_eq!(pipeline.cache().store().len().await, 0);
}

#[tokio::test]
async fn test_abandoned_rendered_run_still_releases_session() {
    let engine = Arc::new(
        MockRenderEngine::new().with_page("https://www.mspy.net/price.html", "<div>Loading...</div>"),
    );
    let pipeline = rendered_pipeline(engine.clone(), Duration::from_millis(50));
    let source = sources::by_id("mspy/pricing").unwrap();

    // Caller disconnects while the page is still waiting for plans.
    let abandoned = tokio::time::timeout(Duration::from_millis(10), pipeline.run(&source)).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(engine.launches(), 1);
    assert_eq!(engine.open_sessions(), 0);
    assert_eq!(pipeline.cache().in_flight().await, 0);
    assert_eq!(pipeline.cache().store().len().await, 0);
}

#[tokio::test]
async fn test_concurrent_rendered_runs_launch_once() {
    let engine = Arc::new(
        MockRenderEngine::new().with_page("https://www.tispy.net/pricing/", fixtures::TISPY_PRICING),
    );
    let pipeline = Arc::new(rendered_pipeline(engine.clone(), Duration::from_secs(5)));
    let source = sources::by_id("tispy/pricing").unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let pipeline = Arc::clone(&pipeline);
        let source = source.clone();
        handles.push(tokio::spawn(async move { pipeline.run(&source).await }));
    }

    let mut guids = Vec::new();
    for handle in handles {
        let feed = handle.await.unwrap().unwrap();
        assert_eq!(feed.len(), 1);
        guids.push(feed.item[0].guid.clone());
    }

    assert_eq!(engine.launches(), 1);
    assert!(guids.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_sources_sharing_cache_keep_separate_entries() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .with_page("https://mcp.so/feed", fixtures::MCP_FEED)
            .with_page("https://tispy.net", fixtures::SEO_HOME),
    );
    let pipeline = FeedPipeline::new(
        Arc::clone(&fetcher),
        ExtractionCache::new(),
        FeedSynthesizer::new(),
    );

    let mcp = sources::by_id("mcp-so/feed").unwrap();
    let seo = sources::by_id("tispy/home").unwrap();

    let mcp_feed = pipeline.run(&mcp).await.unwrap();
    let seo_feed = pipeline.run(&seo).await.unwrap();
    pipeline.run(&mcp).await.unwrap();

    assert_eq!(mcp_feed.len(), 3);
    assert_eq!(seo_feed.len(), 1);
    assert_eq!(seo_feed.item[0].title, "TiSPY SEO Content Updated");
    assert!(seo_feed.item[0]
        .description
        .contains("<strong>Canonical URL:</strong> https://tispy.net/en/"));
    assert_eq!(fetcher.call_count(), 2);
    assert_eq!(pipeline.cache().store().len().await, 2);
}

#[tokio::test]
async fn test_source_loaded_from_file() {
    let path = std::env::temp_dir().join(format!("feed-scrape-sources-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"[{
            "id": "example/blog",
            "title": "Example Blog",
            "link": "https://blog.example.com/",
            "schema": {
                "mode": "repeating",
                "container": "article",
                "fields": {
                    "title": { "selector": "h2" },
                    "link": { "selector": "a", "attribute": "href" },
                    "published": { "selector": "time", "attribute": "datetime" }
                }
            },
            "cache_key": "example:blog",
            "ttl_secs": 300,
            "items": {
                "title": "{title}",
                "guid_prefix": "blog",
                "link_field": "link",
                "timestamp_field": "published"
            }
        }]"#,
    )
    .unwrap();

    let mut registry = SourceRegistry::with_builtin();
    assert_eq!(registry.load_file(&path).unwrap(), 1);
    std::fs::remove_file(&path).ok();

    let fetcher = Arc::new(MockFetcher::new().with_page(
        "https://blog.example.com/",
        r#"<article><h2>Newest</h2><a href="/p/2">read</a><time datetime="2026-10-02T09:00:00Z"></time></article>
           <article><h2>Older</h2><a href="/p/1">read</a><time datetime="2026-09-30T09:00:00Z"></time></article>"#,
    ));
    let pipeline = FeedPipeline::new(fetcher, ExtractionCache::new(), FeedSynthesizer::new());

    let feed = pipeline.run(registry.get("example/blog").unwrap()).await.unwrap();

    assert_eq!(feed.item[0].link, "https://blog.example.com/p/2");
    assert_eq!(feed.item[0].pub_date.to_rfc3339(), "2026-10-02T09:00:00+00:00");
    assert_eq!(feed.item[1].title, "Older");
}
