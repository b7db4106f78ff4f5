//! Feed output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One synthesized feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,

    /// HTML fragment
    pub description: String,

    pub link: String,

    #[serde(rename = "pubDate")]
    pub pub_date: DateTime<Utc>,

    /// Stable identifier for deduplication
    pub guid: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosure_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosure_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Feed handed to the route layer: `{title, link, description, item}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,

    pub link: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub item: Vec<FeedItem>,
}

impl Feed {
    pub fn len(&self) -> usize {
        self.item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_empty()
    }
}
