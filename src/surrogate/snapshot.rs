//! A pre-resolved query captured as plain data.
//!
//! Hosts that already know everything about the current request can hand the
//! collector a `QuerySnapshot` instead of implementing [`QueryResult`] and
//! [`TaxonomySource`] themselves. The command-line tool reads snapshots from
//! JSON files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::query::{ContentItem, QueriedObject, QueryResult, TaxonomySource, Term};
use super::template::TemplateType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySnapshot {
    pub items: Vec<ContentItem>,
    /// Template predicates that hold for this query.
    pub templates: Vec<TemplateType>,
    /// Predicates the query provides at all. `None` means every predicate.
    pub available_templates: Option<Vec<TemplateType>>,
    pub classifiable: bool,
    /// Defaults to the `single` template flag.
    pub single_view: Option<bool>,
    /// Defaults to any of the `category`, `tag` or `tax` template flags.
    pub term_archive: Option<bool>,
    /// Registered taxonomies. When empty, the taxonomies named in `terms`
    /// are used.
    pub taxonomies: Vec<String>,
    /// Terms keyed by taxonomy, then by content item id.
    pub terms: BTreeMap<String, BTreeMap<i64, Vec<Term>>>,
    pub queried_object: Option<QueriedObject>,
}

impl Default for QuerySnapshot {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            templates: Vec::new(),
            available_templates: None,
            classifiable: true,
            single_view: None,
            term_archive: None,
            taxonomies: Vec::new(),
            terms: BTreeMap::new(),
            queried_object: None,
        }
    }
}

impl QuerySnapshot {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn with_item(mut self, item: ContentItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_template(mut self, template: TemplateType) -> Self {
        self.templates.push(template);
        self
    }

    pub fn with_terms(mut self, taxonomy: &str, item_id: i64, terms: Vec<Term>) -> Self {
        self.terms
            .entry(taxonomy.to_string())
            .or_default()
            .insert(item_id, terms);
        self
    }

    pub fn with_queried_object(mut self, object: QueriedObject) -> Self {
        self.queried_object = Some(object);
        self
    }
}

impl QueryResult for QuerySnapshot {
    fn matched_items(&self) -> &[ContentItem] {
        &self.items
    }

    fn supports_classification(&self) -> bool {
        self.classifiable
    }

    fn is_template(&self, template: TemplateType) -> Option<bool> {
        let available = self
            .available_templates
            .as_ref()
            .is_none_or(|available| available.contains(&template));
        available.then(|| self.templates.contains(&template))
    }

    fn is_single_view(&self) -> bool {
        self.single_view
            .unwrap_or_else(|| self.templates.contains(&TemplateType::Single))
    }

    fn is_term_archive(&self) -> bool {
        self.term_archive.unwrap_or_else(|| {
            self.templates
                .iter()
                .any(|template| template.is_term_archive())
        })
    }
}

impl TaxonomySource for QuerySnapshot {
    fn taxonomies(&self) -> Vec<String> {
        if self.taxonomies.is_empty() {
            self.terms.keys().cloned().collect()
        } else {
            self.taxonomies.clone()
        }
    }

    fn terms_for(&self, item_id: i64, taxonomy: &str) -> Option<Vec<Term>> {
        self.terms.get(taxonomy)?.get(&item_id).cloned()
    }

    fn queried_object(&self) -> Option<QueriedObject> {
        self.queried_object.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surrogate::SurrogateKeyCollection;

    const SINGLE_POST: &str = r#"{
        "items": [{"id": 42, "author": 7}],
        "templates": ["single", "singular"],
        "taxonomies": ["category", "post_tag"],
        "terms": {
            "category": {"42": [{"id": 3}]},
            "post_tag": {"42": [{"id": 3}, {"id": 15}, {}]}
        }
    }"#;

    #[test]
    fn single_post_snapshot_collects_expected_keys() {
        let snapshot = QuerySnapshot::from_json(SINGLE_POST).expect("valid snapshot");
        let keys = SurrogateKeyCollection::from_query(&snapshot, &snapshot);
        assert_eq!(keys.keys(), ["p-42", "tm-single", "t-3", "t-15", "a-7"]);
    }

    #[test]
    fn string_ids_are_coerced_not_rejected() {
        let snapshot =
            QuerySnapshot::from_json(r#"{"items":[{"id":"42","author":"7"}],"templates":["single"]}"#)
                .expect("string ids are accepted");
        let keys = SurrogateKeyCollection::from_query(&snapshot, &snapshot);
        assert_eq!(keys.keys(), ["p-42", "tm-single", "a-7"]);
    }

    #[test]
    fn empty_object_is_a_valid_snapshot() {
        let snapshot = QuerySnapshot::from_json("{}").expect("valid snapshot");
        assert_eq!(snapshot, QuerySnapshot::default());
        assert!(snapshot.supports_classification());
        assert!(SurrogateKeyCollection::from_query(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn unavailable_templates_are_not_probed() {
        let snapshot = QuerySnapshot {
            templates: vec![TemplateType::CommentsPopup, TemplateType::Paged],
            available_templates: Some(vec![TemplateType::Paged]),
            ..Default::default()
        };
        assert_eq!(snapshot.is_template(TemplateType::CommentsPopup), None);
        assert_eq!(snapshot.is_template(TemplateType::Paged), Some(true));
        assert_eq!(snapshot.is_template(TemplateType::Home), None);
    }

    #[test]
    fn explicit_view_flags_override_templates() {
        let snapshot = QuerySnapshot {
            single_view: Some(false),
            term_archive: Some(true),
            ..Default::default()
        }
        .with_template(TemplateType::Single)
        .with_item(ContentItem::new(1, 1))
        .with_queried_object(QueriedObject::term(9, "genre"));

        let keys = SurrogateKeyCollection::from_query(&snapshot, &snapshot);
        assert_eq!(keys.keys(), ["p-1", "tm-single", "t-9"]);
    }

    #[test]
    fn taxonomies_fall_back_to_term_map() {
        let snapshot = QuerySnapshot::default()
            .with_terms("series", 1, vec![Term::new(2)])
            .with_terms("category", 1, vec![Term::new(3)]);
        assert_eq!(snapshot.taxonomies(), ["category", "series"]);
        assert_eq!(snapshot.terms_for(1, "series"), Some(vec![Term::new(2)]));
        assert_eq!(snapshot.terms_for(2, "series"), None);
    }
}
