//! Selector-based extraction.
//!
//! A [`Schema`] maps field names to CSS selector rules. It is compiled
//! once (all selectors validated) and then evaluated against fetched HTML
//! with [`extract`], producing plain string records in document order.
//!
//! # Example
//!
//! ```rust
//! use feed_scrape::extract::{extract, FieldRule, FieldSchema, Schema};
//!
//! let schema = Schema::repeating(
//!     "li.post",
//!     FieldSchema::new()
//!         .field("title", FieldRule::text("h2"))
//!         .field("link", FieldRule::attr("a", "href")),
//! )
//! .compile()
//! .unwrap();
//!
//! let html = r#"<ul><li class="post"><h2>Hello</h2><a href="/hello">read</a></li></ul>"#;
//! let base = url::Url::parse("https://example.com/").unwrap();
//! let extraction = extract(html, &schema, Some(&base));
//!
//! assert_eq!(extraction.records()[0].get("link"), "https://example.com/hello");
//! ```

mod document;
mod record;
mod schema;

pub use document::{element_text, extract, resolve_url};
pub use record::{ExtractedRecord, Extraction, MULTIPLE_DELIMITER};
pub use schema::{CompiledSchema, FieldRule, FieldSchema, Schema, Transform};
