//! Description assembly.
//!
//! A description is built from a record in a fixed part order. Parts whose
//! value is empty are left out entirely (no dangling labels), and a section
//! whose parts are all empty drops its heading too. Text values are
//! entity-escaped; `Html` parts keep their markup after sanitizing.

use serde::{Deserialize, Serialize};

use crate::extract::ExtractedRecord;

/// How one field is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStyle {
    /// `<p><strong>Label:</strong> value</p>`
    #[default]
    Paragraph,
    /// `<h3>value</h3>`
    Heading,
    /// `<ul><li>..</li></ul>`, one item per match
    List,
    /// `<ul><li><a href="..">..</a></li></ul>`, pairing each match with
    /// the match at the same position in `href_field`
    LinkList,
    /// `<pre>value</pre>`
    Preformatted,
    /// `<p><a href="value">label</a></p>`
    Link,
    /// Extracted markup, sanitized with ammonia
    Html,
}

/// One field in the description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub style: PartStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href_field: Option<String>,
}

impl Part {
    pub fn new(field: impl Into<String>, style: PartStyle) -> Self {
        Self {
            field: field.into(),
            label: None,
            style,
            href_field: None,
        }
    }

    /// List of links: text from `field`, targets from `href_field`.
    pub fn links(field: impl Into<String>, href_field: impl Into<String>) -> Self {
        Self {
            href_field: Some(href_field.into()),
            ..Self::new(field, PartStyle::LinkList)
        }
    }

    /// Labelled paragraph.
    pub fn labelled(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(field, PartStyle::Paragraph)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Fields this part reads.
    fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.field.as_str()).chain(self.href_field.as_deref())
    }

    /// Render the part, or `None` when it has nothing to show.
    fn render(&self, record: &ExtractedRecord) -> Option<String> {
        let label = self.label.as_deref().map(escape);
        let value = record.get(&self.field).trim();

        let html = match self.style {
            PartStyle::List | PartStyle::LinkList => {
                let items = self.list_items(record);
                if items.is_empty() {
                    return None;
                }
                match label {
                    Some(label) => format!("<h4>{}</h4><ul>{}</ul>", label, items),
                    None => format!("<ul>{}</ul>", items),
                }
            }
            _ if value.is_empty() => return None,
            PartStyle::Paragraph => match label {
                Some(label) => format!("<p><strong>{}:</strong> {}</p>", label, escape(value)),
                None => format!("<p>{}</p>", escape(value)),
            },
            PartStyle::Heading => format!("<h3>{}</h3>", escape(value)),
            PartStyle::Preformatted => format!("<pre>{}</pre>", escape(value)),
            PartStyle::Link => format!(
                "<p><a href=\"{}\">{}</a></p>",
                escape(value),
                label.unwrap_or_else(|| escape(value))
            ),
            PartStyle::Html => ammonia::clean(value),
        };
        Some(html)
    }

    fn list_items(&self, record: &ExtractedRecord) -> String {
        let texts = record.matches(&self.field);
        let hrefs = match (&self.style, &self.href_field) {
            (PartStyle::LinkList, Some(href_field)) => record.matches(href_field),
            _ => Vec::new(),
        };

        texts
            .iter()
            .enumerate()
            .filter_map(|(i, text)| {
                let text = text.trim();
                let href = hrefs.get(i).map(|h| h.trim()).unwrap_or("");
                match (text.is_empty(), href.is_empty()) {
                    (true, true) => None,
                    (_, true) => Some(format!("<li>{}</li>", escape(text))),
                    (true, false) => Some(format!(
                        "<li><a href=\"{0}\">{0}</a></li>",
                        escape(href)
                    )),
                    (false, false) => Some(format!(
                        "<li><a href=\"{}\">{}</a></li>",
                        escape(href),
                        escape(text)
                    )),
                }
            })
            .collect()
    }
}

/// A group of parts under an optional heading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub parts: Vec<Part>,
}

impl Section {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            heading: None,
            parts,
        }
    }

    pub fn titled(heading: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            heading: Some(heading.into()),
            parts,
        }
    }
}

/// Ordered description layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionTemplate {
    pub sections: Vec<Section>,
}

impl DescriptionTemplate {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Single untitled section.
    pub fn parts(parts: Vec<Part>) -> Self {
        Self::new(vec![Section::new(parts)])
    }

    /// Fields referenced by the template, in render order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.parts.iter().flat_map(Part::fields))
    }

    /// Render `record` into an HTML fragment.
    pub fn render(&self, record: &ExtractedRecord) -> String {
        let mut html = String::new();
        for section in &self.sections {
            let body: String = section
                .parts
                .iter()
                .filter_map(|part| part.render(record))
                .collect();

            if body.is_empty() {
                continue;
            }
            if let Some(heading) = &section.heading {
                html.push_str(&format!("<h2>{}</h2>", escape(heading)));
            }
            html.push_str(&body);
        }
        html
    }
}

/// Escape text for use in HTML content or a quoted attribute.
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
