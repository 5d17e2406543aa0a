//! Read-only view of the host's resolved content query.

use serde::{Deserialize, Deserializer, Serialize};

use super::template::TemplateType;
use crate::cache_control::{leading_integer, truncate_unsigned};

/// A content item matched by the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_id")]
    pub author: i64,
}

impl ContentItem {
    pub fn new(id: i64, author: i64) -> Self {
        Self { id, author }
    }
}

/// A taxonomy term attached to a content item. Terms without an identifier
/// are tolerated and contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Term {
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub id: Option<i64>,
}

impl Term {
    pub fn new(id: i64) -> Self {
        Self { id: Some(id) }
    }
}

/// The single object an archive view was queried for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueriedObject {
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub taxonomy: Option<String>,
}

impl QueriedObject {
    pub fn term(id: i64, taxonomy: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            taxonomy: Some(taxonomy.into()),
        }
    }

    /// The term identifier, when both the id and the taxonomy are present
    /// and non-empty.
    pub fn term_id(&self) -> Option<u64> {
        let id = self.id.map(non_negative_id).filter(|id| *id > 0)?;
        let taxonomy = self.taxonomy.as_deref().map(str::trim)?;
        (!taxonomy.is_empty()).then_some(id)
    }
}

/// Capabilities the collector needs from the host query.
pub trait QueryResult {
    /// Items matched by the query, in display order.
    fn matched_items(&self) -> &[ContentItem];

    /// Whether the query can be classified at all. Queries built outside a
    /// normal rendering context return `false` and get no template key.
    fn supports_classification(&self) -> bool {
        true
    }

    /// Evaluate one template predicate. `None` means the predicate does not
    /// exist for this query and is skipped during classification.
    fn is_template(&self, template: TemplateType) -> Option<bool>;

    fn is_single_view(&self) -> bool;

    /// Category, tag, or custom taxonomy archive.
    fn is_term_archive(&self) -> bool;
}

/// Taxonomy accessors supplied by the host.
pub trait TaxonomySource {
    /// Every registered taxonomy name.
    fn taxonomies(&self) -> Vec<String>;

    /// Terms for `item_id` in `taxonomy`. `None` covers both "no terms" and
    /// term data the host could not resolve.
    fn terms_for(&self, item_id: i64, taxonomy: &str) -> Option<Vec<Term>>;

    fn queried_object(&self) -> Option<QueriedObject>;
}

/// Coerce a host identifier to its absolute value.
pub fn non_negative_id(value: i64) -> u64 {
    value.unsigned_abs()
}

/// Identifiers as hosts hand them over. Anything that is not an integer is
/// coerced rather than rejected: fractions are truncated, text uses its
/// leading integer and booleans count as 0 or 1.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientId {
    Integer(i64),
    Fractional(f64),
    Text(String),
    Flag(bool),
}

impl LenientId {
    fn value(self) -> i64 {
        let magnitude = match self {
            LenientId::Integer(id) => return id,
            LenientId::Fractional(id) => truncate_unsigned(id),
            LenientId::Text(text) => leading_integer(&text),
            LenientId::Flag(flag) => u64::from(flag),
        };
        i64::try_from(magnitude).unwrap_or(i64::MAX)
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    LenientId::deserialize(deserializer).map(LenientId::value)
}

fn lenient_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<LenientId>::deserialize(deserializer).map(|id| id.map(LenientId::value))
}
