//! Landing-page SEO snapshot shared by the home-page sources.

use crate::extract::{FieldRule, FieldSchema, Schema};
use crate::feed::{DescriptionTemplate, ItemTemplate, Part, PartStyle, Section};
use crate::traits::fetcher::FetchStrategy;

use super::SourceDefinition;

const TWELVE_HOURS: u64 = 60 * 60 * 12;

/// Flat schema over the page head plus top-level headings.
pub fn seo_schema() -> Schema {
    Schema::flat(
        FieldSchema::new()
            .field("title", FieldRule::text("title"))
            .field("description", meta("name", "description"))
            .field("keywords", meta("name", "keywords"))
            .field("h1", FieldRule::text("h1"))
            .field("h2", FieldRule::text("h2").multiple())
            .field("canonical_url", FieldRule::attr("link[rel=\"canonical\"]", "href"))
            .field("og_title", meta("property", "og:title"))
            .field("og_description", meta("property", "og:description"))
            .field("og_image", meta("property", "og:image"))
            .field("twitter_card", meta("name", "twitter:card"))
            .field("twitter_title", meta("name", "twitter:title"))
            .field("twitter_description", meta("name", "twitter:description"))
            .field("twitter_image", meta("name", "twitter:image"))
            .field(
                "structured_data",
                FieldRule::text("script[type=\"application/ld+json\"]").html(),
            ),
    )
}

fn meta(key: &str, value: &str) -> FieldRule {
    FieldRule::attr(format!("meta[{}=\"{}\"]", key, value), "content")
}

/// Sectioned description of an SEO snapshot.
pub fn seo_description() -> DescriptionTemplate {
    DescriptionTemplate::new(vec![
        Section::titled(
            "Basic SEO Elements",
            vec![
                Part::labelled("title", "Title"),
                Part::labelled("description", "Description"),
                Part::labelled("keywords", "Keywords"),
                Part::labelled("h1", "H1"),
                Part::labelled("h2", "H2"),
                Part::labelled("canonical_url", "Canonical URL"),
            ],
        ),
        Section::titled(
            "Open Graph Data",
            vec![
                Part::labelled("og_title", "OG Title"),
                Part::labelled("og_description", "OG Description"),
                Part::labelled("og_image", "OG Image"),
            ],
        ),
        Section::titled(
            "Twitter Card Data",
            vec![
                Part::labelled("twitter_card", "Twitter Card"),
                Part::labelled("twitter_title", "Twitter Title"),
                Part::labelled("twitter_description", "Twitter Description"),
                Part::labelled("twitter_image", "Twitter Image"),
            ],
        ),
        Section::titled(
            "Structured Data",
            vec![Part::new("structured_data", PartStyle::Preformatted)],
        ),
    ])
}

/// An SEO snapshot source. The snapshot is one record, so the feed gets
/// one item whose GUID changes whenever any tracked element changes.
pub(super) fn seo_source(
    id: &str,
    title: &str,
    link: &str,
    strategy: FetchStrategy,
    cache_key: &str,
    item_title: &str,
    guid_prefix: &str,
) -> SourceDefinition {
    SourceDefinition {
        id: id.to_string(),
        title: title.to_string(),
        link: link.to_string(),
        description: None,
        strategy,
        schema: seo_schema(),
        cache_key: cache_key.to_string(),
        ttl_secs: TWELVE_HOURS,
        items: ItemTemplate::per_record(item_title, guid_prefix, seo_description()),
    }
}
