//! Schema evaluation over a parsed HTML document.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::record::{ExtractedRecord, Extraction};
use super::schema::{CompiledField, CompiledSchema, Scope};

/// Attributes whose values are URLs and get resolved against the base URL.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "poster", "data-src"];

/// Evaluate `schema` against `html`.
///
/// Never fails: fields that match nothing come back empty, and a
/// repeating schema whose container matches nothing yields no records.
/// Relative URLs in link/image attributes are resolved against the
/// document's `<base href>` (if any) joined onto `page_url`.
pub fn extract(html: &str, schema: &CompiledSchema, page_url: Option<&Url>) -> Extraction {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);

    match &schema.scope {
        Scope::Document => {
            let mut record = ExtractedRecord::new();
            for field in &schema.fields {
                fill_field(&mut record, document.select(&field.selector), field, base.as_ref());
            }
            Extraction::Single(record)
        }
        Scope::Containers(container) => {
            let records: Vec<ExtractedRecord> = document
                .select(container)
                .map(|element| scoped_record(element, &schema.fields, base.as_ref()))
                .collect();

            if records.is_empty() {
                debug!(fields = schema.fields.len(), "Container selector matched no elements");
            }
            Extraction::Many(records)
        }
    }
}

fn scoped_record(
    container: ElementRef<'_>,
    fields: &[CompiledField],
    base: Option<&Url>,
) -> ExtractedRecord {
    let mut record = ExtractedRecord::new();
    for field in fields {
        fill_field(&mut record, container.select(&field.selector), field, base);
    }
    record
}

fn fill_field<'a>(
    record: &mut ExtractedRecord,
    mut matches: impl Iterator<Item = ElementRef<'a>>,
    field: &CompiledField,
    base: Option<&Url>,
) {
    if field.rule.multiple {
        let values = matches.map(|element| read_value(element, field, base));
        record.insert_matches(field.name.clone(), values);
    } else {
        let value = matches
            .next()
            .map(|element| read_value(element, field, base))
            .unwrap_or_default();
        record.insert(field.name.clone(), value);
    }
}

fn read_value(element: ElementRef<'_>, field: &CompiledField, base: Option<&Url>) -> String {
    let rule = &field.rule;
    let value = match &rule.attribute {
        Some(attribute) => {
            let raw = element.value().attr(attribute).unwrap_or("").trim();
            if is_url_attribute(attribute) {
                resolve_url(raw, base)
            } else {
                raw.to_string()
            }
        }
        None if rule.html => element.inner_html().trim().to_string(),
        None => element_text(element),
    };

    match &rule.transform {
        Some(transform) => transform.apply(&value),
        None => value,
    }
}

/// Concatenated descendant text with whitespace runs collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_url_attribute(attribute: &str) -> bool {
    URL_ATTRIBUTES
        .iter()
        .any(|a| a.eq_ignore_ascii_case(attribute))
}

/// Resolve `value` against `base`; unresolvable or empty values pass through.
pub fn resolve_url(value: &str, base: Option<&Url>) -> String {
    if value.is_empty() {
        return String::new();
    }
    match base.map(|base| base.join(value)) {
        Some(Ok(resolved)) => resolved.to_string(),
        _ => value.to_string(),
    }
}

fn document_base(document: &Html, page_url: Option<&Url>) -> Option<Url> {
    let page_url = page_url?;
    let declared = Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|base| base.value().attr("href"))
                .map(str::to_string)
        });

    match declared {
        Some(href) => page_url.join(&href).ok().or_else(|| Some(page_url.clone())),
        None => Some(page_url.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::schema::{FieldRule, FieldSchema, Schema, Transform};

    const FEED_HTML: &str = r#"
        <html><head><title>MCP Feed</title></head>
        <body>
            <div class="entry">
                <h3>Alpha Server</h3>
                <p class="by">created by alice</p>
                <a class="link" href="/server/alpha">open</a>
                <img src="/icons/alpha.png">
            </div>
            <div class="entry">
                <h3>Beta   Server</h3>
                <a class="link" href="https://other.example/beta">open</a>
            </div>
            <div class="entry">
                <h3>Gamma <b>Server</b></h3>
            </div>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://mcp.so/feed").unwrap()
    }

    fn entry_schema() -> CompiledSchema {
        Schema::repeating(
            ".entry",
            FieldSchema::new()
                .field("name", FieldRule::text("h3"))
                .field(
                    "creator",
                    FieldRule::text("p.by").transform(Transform::StripPrefix("created by".into())),
                )
                .field("link", FieldRule::attr("a.link", "href"))
                .field("image", FieldRule::attr("img", "src")),
        )
        .compile()
        .unwrap()
    }

    #[test]
    fn test_repeating_preserves_document_order() {
        let extraction = extract(FEED_HTML, &entry_schema(), Some(&base()));
        let records = extraction.records();

        assert_eq!(records.len(), 3);
        let names: Vec<_> = records.iter().map(|r| r.get("name")).collect();
        assert_eq!(names, vec!["Alpha Server", "Beta Server", "Gamma Server"]);
    }

    #[test]
    fn test_repeating_fields_scoped_to_container() {
        let extraction = extract(FEED_HTML, &entry_schema(), Some(&base()));
        let records = extraction.records();

        assert_eq!(records[0].get("creator"), "alice");
        assert_eq!(records[1].get("creator"), "");
        assert_eq!(records[2].get("link"), "");
        assert_eq!(records[1].get("image"), "");
    }

    #[test]
    fn test_relative_urls_resolved() {
        let extraction = extract(FEED_HTML, &entry_schema(), Some(&base()));
        let records = extraction.records();

        assert_eq!(records[0].get("link"), "https://mcp.so/server/alpha");
        assert_eq!(records[0].get("image"), "https://mcp.so/icons/alpha.png");
        assert_eq!(records[1].get("link"), "https://other.example/beta");
    }

    #[test]
    fn test_base_element_overrides_page_url() {
        let html = r#"<head><base href="https://cdn.example/assets/"></head>
            <body><img src="logo.png"></body>"#;
        let schema = Schema::flat(FieldSchema::new().field("logo", FieldRule::attr("img", "src")))
            .compile()
            .unwrap();

        let record = extract(html, &schema, Some(&base())).into_records().remove(0);
        assert_eq!(record.get("logo"), "https://cdn.example/assets/logo.png");
    }

    #[test]
    fn test_no_base_url_keeps_relative() {
        let extraction = extract(FEED_HTML, &entry_schema(), None);
        assert_eq!(extraction.records()[0].get("link"), "/server/alpha");
    }

    #[test]
    fn test_empty_container_match_is_empty_sequence() {
        let schema = Schema::repeating(".missing", FieldSchema::new().field("a", FieldRule::text("a")))
            .compile()
            .unwrap();

        let extraction = extract(FEED_HTML, &schema, None);
        assert_eq!(extraction, Extraction::Many(vec![]));
    }

    #[test]
    fn test_flat_schema_with_missing_fields() {
        let html = r#"<html><head>
                <title> Pricing </title>
                <meta name="description" content="Plans and prices">
                <script type="application/ld+json">{"@type":"Product"}</script>
            </head><body>
                <h2>Monthly</h2><h2></h2><h2>Yearly</h2>
            </body></html>"#;
        let schema = Schema::flat(
            FieldSchema::new()
                .field("title", FieldRule::text("title"))
                .field("description", FieldRule::attr(r#"meta[name="description"]"#, "content"))
                .field("keywords", FieldRule::attr(r#"meta[name="keywords"]"#, "content"))
                .field("h1", FieldRule::text("h1"))
                .field("h2", FieldRule::text("h2").multiple())
                .field(
                    "structured",
                    FieldRule::text(r#"script[type="application/ld+json"]"#).html(),
                ),
        )
        .compile()
        .unwrap();

        let extraction = extract(html, &schema, None);
        let record = &extraction.records()[0];

        assert_eq!(record.get("title"), "Pricing");
        assert_eq!(record.get("description"), "Plans and prices");
        assert_eq!(record.get("keywords"), "");
        assert_eq!(record.get("h1"), "");
        assert_eq!(record.get("h2"), "Monthly, Yearly");
        assert_eq!(record.matches("h2"), vec!["Monthly", "", "Yearly"]);
        assert_eq!(record.get("structured"), r#"{"@type":"Product"}"#);
        assert_eq!(record.len(), 6);
    }

    #[test]
    fn test_missing_attribute_is_empty() {
        let html = r#"<a class="btn">Buy</a>"#;
        let schema = Schema::flat(FieldSchema::new().field("url", FieldRule::attr("a.btn", "href")))
            .compile()
            .unwrap();

        let record = extract(html, &schema, Some(&base())).into_records().remove(0);
        assert_eq!(record.get("url"), "");
    }

    #[test]
    fn test_multiple_with_transform() {
        let html = r#"<ul><li>3 months</li><li>12 months</li><li>lifetime</li></ul>"#;
        let schema = Schema::flat(
            FieldSchema::new().field(
                "durations",
                FieldRule::text("li").multiple().transform(Transform::DigitsOnly),
            ),
        )
        .compile()
        .unwrap();

        let record = extract(html, &schema, None).into_records().remove(0);
        assert_eq!(record.get("durations"), "3, 12");
    }

    #[test]
    fn test_multiple_keeps_commas_inside_matches() {
        let html = r#"<ul class="features"><li>Calls, SMS and chats</li><li>GPS</li></ul>"#;
        let schema = Schema::flat(
            FieldSchema::new().field("features", FieldRule::text(".features li").multiple()),
        )
        .compile()
        .unwrap();

        let record = extract(html, &schema, None).into_records().remove(0);
        assert_eq!(record.matches("features"), vec!["Calls, SMS and chats", "GPS"]);
    }
}
