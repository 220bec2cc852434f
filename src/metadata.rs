//! Defines [`Metadata`], the typed view of a post's header block.
//!
//! Headers are author-supplied and loosely structured, so extraction is total:
//! every field falls back to an empty value and any scalar is stringified.

use serde_yaml::{Mapping, Value};

/// The typed fields extracted from a header block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    /// The title of the post.
    pub title: String,

    /// The date of the post, kept verbatim.
    pub date: String,

    /// The category of the post. Selects both the catalog bucket and the
    /// output subdirectory.
    pub category: String,

    /// A short description for listings.
    pub description: String,

    /// The tags associated with the post, in header order.
    pub tags: Vec<String>,
}

impl Metadata {
    /// Extracts [`Metadata`] from a parsed header. Never fails.
    pub fn from_header(header: &Mapping) -> Metadata {
        Metadata {
            title: string_field(header, "title"),
            date: string_field(header, "date"),
            category: string_field(header, "category"),
            description: string_field(header, "description"),
            tags: string_seq_field(header, "tags"),
        }
    }
}

fn lookup<'a>(header: &'a Mapping, key: &str) -> Option<&'a Value> {
    header.get(&Value::String(key.to_owned()))
}

fn string_field(header: &Mapping, key: &str) -> String {
    lookup(header, key).map(stringify).unwrap_or_default()
}

fn string_seq_field(header: &Mapping, key: &str) -> Vec<String> {
    match lookup(header, key) {
        Some(Value::Sequence(items)) => items.iter().map(stringify).collect(),
        _ => Vec::new(),
    }
}

/// Renders any YAML value as text. Sequences print as `[a b]` and mappings as
/// `map[k:v]`.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => format!(
            "[{}]",
            items.iter().map(stringify).collect::<Vec<_>>().join(" ")
        ),
        Value::Mapping(m) => format!(
            "map[{}]",
            m.iter()
                .map(|(k, v)| format!("{}:{}", stringify(k), stringify(v)))
                .collect::<Vec<_>>()
                .join(" ")
        ),
    }
}
