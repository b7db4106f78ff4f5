//! Declarative field schemas.
//!
//! Schemas are plain configuration (usually JSON). They are compiled once
//! at load time; every selector is parsed there so extraction itself can
//! never fail on a bad selector.

use indexmap::IndexMap;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

/// Post-processing applied to each extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Transform {
    /// Keep only ASCII digits ("90 days" -> "90")
    DigitsOnly,
    /// Remove a leading label, case-insensitively, then trim
    StripPrefix(String),
    /// Remove the first occurrence of a label, case-insensitively, then
    /// trim; empty when the label is missing
    RequireLabel(String),
}

impl Transform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Transform::DigitsOnly => value.chars().filter(|c| c.is_ascii_digit()).collect(),
            Transform::StripPrefix(prefix) => {
                let matches = value
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
                if matches {
                    value[prefix.len()..].trim().to_string()
                } else {
                    value.trim().to_string()
                }
            }
            Transform::RequireLabel(label) => {
                // ASCII lowercasing keeps byte offsets aligned with `value`.
                match value.to_ascii_lowercase().find(&label.to_ascii_lowercase()) {
                    Some(start) => {
                        let end = start + label.len();
                        format!("{}{}", &value[..start], &value[end..]).trim().to_string()
                    }
                    None => String::new(),
                }
            }
        }
    }
}

/// How to pull one field out of the matched element(s).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// CSS selector, evaluated against the document or a container
    pub selector: String,

    /// Attribute to read; text content when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Collect every match (joined with ", ") instead of the first
    #[serde(default)]
    pub multiple: bool,

    /// Take inner HTML instead of text content
    #[serde(default)]
    pub html: bool,

    /// Applied to each value before joining
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

impl FieldRule {
    /// Text content of the first match.
    pub fn text(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attribute: None,
            multiple: false,
            html: false,
            transform: None,
        }
    }

    /// Attribute of the first match.
    pub fn attr(selector: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            attribute: Some(attribute.into()),
            ..Self::text(selector)
        }
    }

    /// Collect all matches.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Read inner HTML.
    pub fn html(mut self) -> Self {
        self.html = true;
        self
    }

    /// Set a transform.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Ordered mapping of field name to rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema(IndexMap<String, FieldRule>);

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder pattern).
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.0.insert(name.into(), rule);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldRule)> {
        self.0.iter()
    }

    fn compile(&self) -> SchemaResult<Vec<CompiledField>> {
        if self.is_empty() {
            return Err(SchemaError::Empty);
        }
        self.iter()
            .map(|(name, rule)| {
                Ok(CompiledField {
                    name: name.clone(),
                    selector: parse_selector(name, &rule.selector)?,
                    rule: rule.clone(),
                })
            })
            .collect()
    }
}

/// Flat (one record) or repeating (one record per container) schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Schema {
    /// Every rule evaluated against the whole document
    Flat { fields: FieldSchema },
    /// Rules evaluated inside each element matching `container`
    Repeating {
        container: String,
        fields: FieldSchema,
    },
}

impl Schema {
    pub fn flat(fields: FieldSchema) -> Self {
        Schema::Flat { fields }
    }

    pub fn repeating(container: impl Into<String>, fields: FieldSchema) -> Self {
        Schema::Repeating {
            container: container.into(),
            fields,
        }
    }

    pub fn fields(&self) -> &FieldSchema {
        match self {
            Schema::Flat { fields } | Schema::Repeating { fields, .. } => fields,
        }
    }

    /// Parse every selector, failing on the first invalid one.
    pub fn compile(&self) -> SchemaResult<CompiledSchema> {
        let scope = match self {
            Schema::Flat { .. } => Scope::Document,
            Schema::Repeating { container, .. } => {
                Scope::Containers(parse_selector("<container>", container)?)
            }
        };
        Ok(CompiledSchema {
            scope,
            fields: self.fields().compile()?,
        })
    }
}

fn parse_selector(field: &str, selector: &str) -> SchemaResult<Selector> {
    Selector::parse(selector).map_err(|e| SchemaError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Where field rules are evaluated.
#[derive(Debug, Clone)]
pub(crate) enum Scope {
    Document,
    Containers(Selector),
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledField {
    pub(crate) name: String,
    pub(crate) selector: Selector,
    pub(crate) rule: FieldRule,
}

/// A schema with all selectors parsed, ready for extraction.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub(crate) scope: Scope,
    pub(crate) fields: Vec<CompiledField>,
}

impl CompiledSchema {
    /// Field names in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn is_repeating(&self) -> bool {
        matches!(self.scope, Scope::Containers(_))
    }
}
