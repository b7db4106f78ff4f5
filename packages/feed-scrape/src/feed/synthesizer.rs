//! Record-to-item synthesis.
//!
//! Items come out in record order. When a source carries no usable
//! per-record timestamp, item `i` is stamped `now - i * interval`, so a
//! reader sorting newest-first shows the source's own order. GUIDs hash
//! the record's content, so an unchanged record keeps its GUID across
//! runs while an edited one gets a new GUID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use super::description::{escape, DescriptionTemplate};
use super::types::FeedItem;
use crate::clock::{Clock, SystemClock};
use crate::extract::ExtractedRecord;

/// Default spacing between synthesized timestamps.
pub const DEFAULT_ITEM_INTERVAL_SECS: i64 = 60;

/// Hex characters of the content hash kept in a GUID.
const GUID_HASH_LEN: usize = 16;

/// One item per record, or one item summarizing all records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemMode {
    #[default]
    PerRecord,
    Summary,
}

/// Enclosure (image/media) taken from a record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnclosureRule {
    pub field: String,
    /// Fixed MIME type; guessed from the URL when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// How records become feed items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTemplate {
    #[serde(default)]
    pub mode: ItemMode,

    /// Title format; `{field}` placeholders are filled from the record
    pub title: String,

    /// Prefix for generated GUIDs
    pub guid_prefix: String,

    /// Field holding a per-item link (overrides the source URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_field: Option<String>,

    /// Field holding an RFC 3339 / RFC 2822 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosure: Option<EnclosureRule>,

    /// Summary mode: heading placed above the per-record fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_heading: Option<String>,

    #[serde(default)]
    pub description: DescriptionTemplate,
}

impl ItemTemplate {
    /// One item per record.
    pub fn per_record(
        title: impl Into<String>,
        guid_prefix: impl Into<String>,
        description: DescriptionTemplate,
    ) -> Self {
        Self {
            mode: ItemMode::PerRecord,
            title: title.into(),
            guid_prefix: guid_prefix.into(),
            link_field: None,
            author_field: None,
            timestamp_field: None,
            enclosure: None,
            summary_heading: None,
            description,
        }
    }

    /// One item for the whole record set.
    pub fn summary(
        title: impl Into<String>,
        guid_prefix: impl Into<String>,
        description: DescriptionTemplate,
    ) -> Self {
        Self {
            mode: ItemMode::Summary,
            ..Self::per_record(title, guid_prefix, description)
        }
    }

    pub fn with_link_field(mut self, field: impl Into<String>) -> Self {
        self.link_field = Some(field.into());
        self
    }

    pub fn with_author_field(mut self, field: impl Into<String>) -> Self {
        self.author_field = Some(field.into());
        self
    }

    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = Some(field.into());
        self
    }

    pub fn with_enclosure(mut self, field: impl Into<String>, mime_type: Option<&str>) -> Self {
        self.enclosure = Some(EnclosureRule {
            field: field.into(),
            mime_type: mime_type.map(str::to_string),
        });
        self
    }

    pub fn with_summary_heading(mut self, heading: impl Into<String>) -> Self {
        self.summary_heading = Some(heading.into());
        self
    }

    /// Fields this template reads from records.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = placeholders(&self.title);
        fields.extend(
            [
                &self.link_field,
                &self.author_field,
                &self.timestamp_field,
            ]
            .into_iter()
            .flatten()
            .cloned(),
        );
        if let Some(enclosure) = &self.enclosure {
            fields.push(enclosure.field.clone());
        }
        fields.extend(self.description.fields().map(str::to_string));
        fields
    }
}

/// Converts extracted records into feed items.
#[derive(Clone)]
pub struct FeedSynthesizer {
    interval: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl Default for FeedSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSynthesizer {
    pub fn new() -> Self {
        Self {
            interval: chrono::Duration::seconds(DEFAULT_ITEM_INTERVAL_SECS),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the timestamp spacing. Non-positive values fall back to one
    /// second so timestamps stay strictly decreasing.
    pub fn with_interval(mut self, interval: chrono::Duration) -> Self {
        self.interval = if interval > chrono::Duration::zero() {
            interval
        } else {
            chrono::Duration::seconds(1)
        };
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn interval(&self) -> chrono::Duration {
        self.interval
    }

    /// Build items for `records` using the current time.
    pub fn build(
        &self,
        records: &[ExtractedRecord],
        source_url: &str,
        template: &ItemTemplate,
    ) -> Vec<FeedItem> {
        self.build_at(records, source_url, template, self.clock.now())
    }

    /// Build items with an explicit `now`.
    pub fn build_at(
        &self,
        records: &[ExtractedRecord],
        source_url: &str,
        template: &ItemTemplate,
        now: DateTime<Utc>,
    ) -> Vec<FeedItem> {
        match template.mode {
            ItemMode::PerRecord => self.per_record(records, source_url, template, now),
            ItemMode::Summary => vec![summary_item(records, source_url, template, now)],
        }
    }

    fn per_record(
        &self,
        records: &[ExtractedRecord],
        source_url: &str,
        template: &ItemTemplate,
        now: DateTime<Utc>,
    ) -> Vec<FeedItem> {
        let guids = item_guids(records, source_url, template);

        records
            .iter()
            .zip(guids)
            .enumerate()
            .map(|(index, (record, guid))| {
                let title = render_title(&template.title, record);
                let link = field_or(record, template.link_field.as_deref(), source_url);
                let author = optional_field(record, template.author_field.as_deref());

                let pub_date = template
                    .timestamp_field
                    .as_deref()
                    .and_then(|field| parse_timestamp(record.get(field)))
                    .unwrap_or_else(|| self.synthesized(now, index));

                let (enclosure_url, enclosure_type) = enclosure(record, template.enclosure.as_ref());

                FeedItem {
                    title,
                    description: template.description.render(record),
                    link,
                    pub_date,
                    guid,
                    enclosure_url,
                    enclosure_type,
                    author,
                }
            })
            .collect()
    }

    fn synthesized(&self, now: DateTime<Utc>, index: usize) -> DateTime<Utc> {
        i32::try_from(index)
            .ok()
            .and_then(|index| self.interval.checked_mul(index))
            .and_then(|offset| now.checked_sub_signed(offset))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Content-hash GUIDs for per-record items.
///
/// Exact duplicates get a `-2`, `-3` suffix counted from the end of the
/// page; the last occurrence keeps the bare hash.
fn item_guids(records: &[ExtractedRecord], source_url: &str, template: &ItemTemplate) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut guids: Vec<String> = records
        .iter()
        .rev()
        .map(|record| {
            let title = render_title(&template.title, record);
            let link = field_or(record, template.link_field.as_deref(), source_url);
            let author = optional_field(record, template.author_field.as_deref());
            let base = format!(
                "{}-{}",
                template.guid_prefix,
                content_hash(&title, author.as_deref(), &link, [record])
            );

            let occurrence = seen.entry(base.clone()).or_insert(0);
            *occurrence += 1;
            match *occurrence {
                1 => base,
                n => format!("{}-{}", base, n),
            }
        })
        .collect();
    guids.reverse();
    guids
}

fn summary_item(
    records: &[ExtractedRecord],
    source_url: &str,
    template: &ItemTemplate,
    now: DateTime<Utc>,
) -> FeedItem {
    let mut description = String::new();
    if let Some(heading) = &template.summary_heading {
        description.push_str(&format!("<h2>{}</h2>", escape(heading)));
    }
    for record in records {
        description.push_str(&template.description.render(record));
    }

    let title = records
        .first()
        .map(|first| render_title(&template.title, first))
        .unwrap_or_else(|| render_title(&template.title, &ExtractedRecord::new()));

    FeedItem {
        guid: format!(
            "{}-{}",
            template.guid_prefix,
            content_hash(&title, None, source_url, records)
        ),
        title,
        description,
        link: source_url.to_string(),
        pub_date: now,
        enclosure_url: None,
        enclosure_type: None,
        author: None,
    }
}

/// Fill `{field}` placeholders from `record`.
pub fn render_title(format: &str, record: &ExtractedRecord) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        match rest[start..].find('}') {
            Some(len) => {
                out.push_str(record.get(&rest[start + 1..start + len]));
                rest = &rest[start + len + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

fn placeholders(format: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut rest = format;
    while let Some(start) = rest.find('{') {
        match rest[start..].find('}') {
            Some(len) => {
                fields.push(rest[start + 1..start + len].to_string());
                rest = &rest[start + len + 1..];
            }
            None => break,
        }
    }
    fields
}

fn field_or(record: &ExtractedRecord, field: Option<&str>, fallback: &str) -> String {
    optional_field(record, field).unwrap_or_else(|| fallback.to_string())
}

fn optional_field(record: &ExtractedRecord, field: Option<&str>) -> Option<String> {
    field
        .map(|f| record.get(f).trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn enclosure(
    record: &ExtractedRecord,
    rule: Option<&EnclosureRule>,
) -> (Option<String>, Option<String>) {
    let Some(rule) = rule else {
        return (None, None);
    };
    let Some(url) = optional_field(record, Some(&rule.field)) else {
        return (None, None);
    };
    let mime_type = rule.mime_type.clone().or_else(|| {
        let path = url::Url::parse(&url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.clone());
        mime_guess::from_path(path).first_raw().map(str::to_string)
    });
    (Some(url), mime_type)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// First `GUID_HASH_LEN` hex chars of SHA-256 over the identifying fields.
fn content_hash<'a>(
    title: &str,
    author: Option<&str>,
    link: &str,
    records: impl IntoIterator<Item = &'a ExtractedRecord>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(author.unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(link.as_bytes());
    for record in records {
        for (field, value) in record.iter() {
            hasher.update([0u8]);
            hasher.update(field.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.as_bytes());
        }
        hasher.update([1u8]);
    }
    let digest = hex::encode(hasher.finalize());
    digest[..GUID_HASH_LEN].to_string()
}
