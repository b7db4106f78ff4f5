//! Content source definitions.
//!
//! A source names a page, how to fetch it, what to extract, how long to
//! cache the extraction, and how records become feed items. Definitions
//! are plain data: the built-in ones live here, more can be loaded from
//! a JSON file. Every definition is validated when it is loaded.
//!
//! # Built-in sources
//!
//! | id | fetch | records | ttl |
//! |----|-------|---------|-----|
//! | `mcp-so/feed` | direct HTTP | one per server | 1 h |
//! | `tispy/home` | direct HTTP | SEO snapshot | 12 h |
//! | `tispy/pricing` | rendered | one summary item | 24 h |
//! | `mspy/home` | rendered | SEO snapshot | 12 h |
//! | `mspy/pricing` | rendered | one per plan | 12 h |

mod mcp_so;
mod mspy;
mod seo;
mod tispy;

pub use seo::{seo_description, seo_schema};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, SchemaError, SchemaResult, SourceError};
use crate::extract::{CompiledSchema, Schema};
use crate::feed::ItemTemplate;
use crate::traits::fetcher::FetchStrategy;

/// Everything needed to turn one page into a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Registry id (e.g. `mcp-so/feed`)
    pub id: String,

    /// Feed title
    pub title: String,

    /// Page to fetch; also the feed link and the default item link
    pub link: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub strategy: FetchStrategy,

    pub schema: Schema,

    /// Cache key for the extraction
    pub cache_key: String,

    /// Cache lifetime (seconds)
    pub ttl_secs: u64,

    pub items: ItemTemplate,
}

impl SourceDefinition {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Compile the schema.
    pub fn compile(&self) -> SchemaResult<CompiledSchema> {
        self.schema.compile()
    }

    /// Check the definition is usable.
    ///
    /// Selectors must parse, the link must be an absolute URL, and the
    /// item template may only reference fields the schema extracts.
    pub fn validate(&self) -> SchemaResult<()> {
        self.compile()?;

        Url::parse(&self.link).map_err(|e| self.invalid(format!("link `{}`: {}", self.link, e)))?;

        if self.cache_key.trim().is_empty() {
            return Err(self.invalid("cache_key is empty"));
        }

        let fields = self.schema.fields();
        for field in self.items.referenced_fields() {
            if !fields.iter().any(|(name, _)| *name == field) {
                return Err(self.invalid(format!("item template references unknown field `{}`", field)));
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidSource {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }
}

/// The five built-in sources.
pub fn builtin() -> Vec<SourceDefinition> {
    vec![
        mcp_so::feed(),
        tispy::home(),
        tispy::pricing(),
        mspy::home(),
        mspy::pricing(),
    ]
}

/// Look up a built-in source.
pub fn by_id(id: &str) -> Option<SourceDefinition> {
    builtin().into_iter().find(|source| source.id == id)
}

/// Load and validate source definitions from a JSON array.
pub fn load_file(path: impl AsRef<Path>) -> SchemaResult<Vec<SourceDefinition>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let sources = parse_definitions(&content)?;
    info!(path = %path.display(), count = sources.len(), "Loaded source definitions");
    Ok(sources)
}

/// Parse and validate source definitions from JSON.
pub fn parse_definitions(json: &str) -> SchemaResult<Vec<SourceDefinition>> {
    let sources: Vec<SourceDefinition> = serde_json::from_str(json)?;
    for source in &sources {
        source.validate()?;
    }
    Ok(sources)
}

/// Sources by id, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: IndexMap<String, SourceDefinition>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in sources.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for source in builtin() {
            registry.insert(source);
        }
        registry
    }

    /// Add or replace a source.
    pub fn insert(&mut self, source: SourceDefinition) {
        if self.sources.contains_key(&source.id) {
            debug!(id = %source.id, "Replacing source definition");
        }
        self.sources.insert(source.id.clone(), source);
    }

    /// Load definitions from a file on top of the current set.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> SchemaResult<usize> {
        let loaded = load_file(path)?;
        let count = loaded.len();
        for source in loaded {
            self.insert(source);
        }
        Ok(count)
    }

    pub fn get(&self, id: &str) -> Result<&SourceDefinition> {
        self.sources
            .get(id)
            .ok_or_else(|| SourceError::UnknownSource(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceDefinition> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
