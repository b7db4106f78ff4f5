//! Recently submitted MCP servers and clients from mcp.so.

use crate::extract::{FieldRule, FieldSchema, Schema, Transform};
use crate::feed::{DescriptionTemplate, ItemTemplate, Part, PartStyle};
use crate::traits::fetcher::FetchStrategy;

use super::SourceDefinition;

pub(super) fn feed() -> SourceDefinition {
    let fields = FieldSchema::new()
        .field("name", FieldRule::text("h3"))
        .field("summary", FieldRule::text(".mt-2.text-sm p"))
        .field(
            "creator",
            FieldRule::text("p.mt-0\\.5").transform(Transform::RequireLabel("created by".into())),
        )
        .field("submitted", FieldRule::text(".whitespace-nowrap"))
        .field("link", FieldRule::attr("a.font-medium.text-primary", "href"))
        .field("icon", FieldRule::attr("img", "src"));

    let description = DescriptionTemplate::parts(vec![
        Part::new("summary", PartStyle::Paragraph),
        Part::labelled("creator", "Created by"),
        Part::labelled("submitted", "Submission time"),
    ]);

    SourceDefinition {
        id: "mcp-so/feed".into(),
        title: "MCP Servers Feed".into(),
        link: "https://mcp.so/feed".into(),
        description: Some("MCP Servers and MCP Clients submitted by users recently.".into()),
        strategy: FetchStrategy::DirectHttp,
        schema: Schema::repeating(".my-4.cursor-pointer", fields),
        cache_key: "mcp-so:feed".into(),
        ttl_secs: 60 * 60,
        items: ItemTemplate::per_record("{name}", "mcp", description)
            .with_link_field("link")
            .with_author_field("creator")
            .with_enclosure("icon", None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::testing::fixtures;
    use url::Url;

    #[test]
    fn test_records_from_fixture() {
        let source = feed();
        let schema = source.compile().unwrap();
        let base = Url::parse(&source.link).unwrap();

        let extraction = extract(fixtures::MCP_FEED, &schema, Some(&base));
        let records = extraction.records();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("name"), "Filesystem");
        assert_eq!(records[0].get("creator"), "modelcontextprotocol");
        assert_eq!(
            records[0].get("link"),
            "https://mcp.so/server/filesystem/modelcontextprotocol"
        );
        assert_eq!(records[0].get("icon"), "https://mcp.so/logos/filesystem.png");
        // Weather's byline carries no "created by" label.
        assert_eq!(records[1].get("creator"), "");
        assert_eq!(records[1].get("icon"), "");
        assert_eq!(records[2].get("link"), "https://github.com/bob/git-mcp");
    }
}
