//! Extractor output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Delimiter joining the matches of a `multiple` field into its value.
pub const MULTIPLE_DELIMITER: &str = ", ";

/// One extracted record: field name to string value, in schema order.
///
/// Fields whose selector matched nothing hold the empty string. Fields
/// collecting several matches also keep each match, in document order,
/// so the match boundaries survive the joined value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    fields: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    matches: IndexMap<String, Vec<String>>,
}

impl ExtractedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field (builder pattern).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a multi-match field (builder pattern).
    pub fn with_matches<I, S>(mut self, field: impl Into<String>, matches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_matches(field, matches);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        self.matches.shift_remove(&field);
        self.fields.insert(field, value.into());
    }

    /// Store every match of a field. Empty matches keep their position
    /// but are left out of the joined value.
    pub fn insert_matches<I, S>(&mut self, field: impl Into<String>, matches: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field = field.into();
        let matches: Vec<String> = matches.into_iter().map(Into::into).collect();
        let joined = matches
            .iter()
            .filter(|value| !value.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(MULTIPLE_DELIMITER);

        self.fields.insert(field.clone(), joined);
        self.matches.insert(field, matches);
    }

    /// Value of `field`, or "" when absent.
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    /// Each match of `field` in document order.
    ///
    /// A single-valued field yields its value alone, or nothing when empty.
    pub fn matches(&self, field: &str) -> Vec<&str> {
        match self.matches.get(field) {
            Some(matches) => matches.iter().map(String::as_str).collect(),
            None => match self.get(field) {
                "" => Vec::new(),
                value => vec![value],
            },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractedRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            matches: IndexMap::new(),
        }
    }
}

/// Result of evaluating a schema against a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "records", rename_all = "snake_case")]
pub enum Extraction {
    /// Flat schema: exactly one record
    Single(ExtractedRecord),
    /// Repeating schema: one record per container, in document order
    Many(Vec<ExtractedRecord>),
}

impl Extraction {
    /// Records in document order.
    pub fn records(&self) -> &[ExtractedRecord] {
        match self {
            Extraction::Single(record) => std::slice::from_ref(record),
            Extraction::Many(records) => records,
        }
    }

    pub fn into_records(self) -> Vec<ExtractedRecord> {
        match self {
            Extraction::Single(record) => vec![record],
            Extraction::Many(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}
