//! Surrogate key derivation.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::filter::TaxonomyFilter;
use super::query::{ContentItem, QueryResult, TaxonomySource, non_negative_id};
use super::template::{self, TemplateType};

/// A typed surrogate key before it is rendered into a tag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurrogateKey {
    Post(u64),
    Term(u64),
    Author(u64),
    Template(TemplateType),
}

impl SurrogateKey {
    /// Keys pointing at identifier zero carry no information and are dropped.
    pub fn is_blank(&self) -> bool {
        match self {
            SurrogateKey::Post(id) | SurrogateKey::Term(id) | SurrogateKey::Author(id) => *id == 0,
            SurrogateKey::Template(_) => false,
        }
    }
}

impl fmt::Display for SurrogateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurrogateKey::Post(id) => write!(f, "p-{id}"),
            SurrogateKey::Term(id) => write!(f, "t-{id}"),
            SurrogateKey::Author(id) => write!(f, "a-{id}"),
            SurrogateKey::Template(template) => write!(f, "tm-{template}"),
        }
    }
}

/// Derives surrogate keys for a single response.
#[derive(Debug, Clone, Default)]
pub struct SurrogateKeyCollector {
    filter: TaxonomyFilter,
}

impl SurrogateKeyCollector {
    pub fn new(filter: TaxonomyFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &TaxonomyFilter {
        &self.filter
    }

    pub fn collect<Q, S>(&self, query: &Q, source: &S) -> SurrogateKeyCollection
    where
        Q: QueryResult + ?Sized,
        S: TaxonomySource + ?Sized,
    {
        let mut keys = post_keys(query.matched_items());
        let template = template_key(query);
        keys.extend(template);

        if query.is_single_view() {
            if let Some(item) = query.matched_items().first() {
                keys.extend(self.single_term_keys(item, source));
                keys.extend(author_key(item));
            }
        } else if query.is_term_archive() {
            keys.extend(archive_term_key(source));
        }

        let collection = SurrogateKeyCollection::from_typed(keys);
        let template_name = template.map(|key| key.to_string()).unwrap_or_default();
        debug!(
            items = query.matched_items().len(),
            template = %template_name,
            keys = collection.len(),
            "collected surrogate keys"
        );
        collection
    }

    fn single_term_keys<S>(&self, item: &ContentItem, source: &S) -> Vec<SurrogateKey>
    where
        S: TaxonomySource + ?Sized,
    {
        let taxonomies = self.filter.apply(source.taxonomies());
        let mut keys = Vec::new();

        for taxonomy in taxonomies {
            let Some(terms) = source.terms_for(item.id, &taxonomy) else {
                debug!(taxonomy = %taxonomy, item = item.id, "no terms resolved");
                continue;
            };

            keys.extend(
                terms
                    .iter()
                    .filter_map(|term| term.id)
                    .map(|id| SurrogateKey::Term(non_negative_id(id))),
            );
        }

        keys
    }
}

fn post_keys(items: &[ContentItem]) -> Vec<SurrogateKey> {
    items
        .iter()
        .map(|item| SurrogateKey::Post(non_negative_id(item.id)))
        .collect()
}

fn template_key<Q>(query: &Q) -> Option<SurrogateKey>
where
    Q: QueryResult + ?Sized,
{
    if !query.supports_classification() {
        return None;
    }

    template::classify(|template| query.is_template(template)).map(SurrogateKey::Template)
}

fn author_key(item: &ContentItem) -> Option<SurrogateKey> {
    let author = non_negative_id(item.author);
    (author > 0).then_some(SurrogateKey::Author(author))
}

fn archive_term_key<S>(source: &S) -> Option<SurrogateKey>
where
    S: TaxonomySource + ?Sized,
{
    source
        .queried_object()
        .and_then(|object| object.term_id())
        .map(SurrogateKey::Term)
}

/// The surrogate keys attached to one response, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SurrogateKeyCollection {
    keys: Vec<String>,
}

impl SurrogateKeyCollection {
    /// Collect with every registered taxonomy.
    pub fn from_query<Q, S>(query: &Q, source: &S) -> Self
    where
        Q: QueryResult + ?Sized,
        S: TaxonomySource + ?Sized,
    {
        SurrogateKeyCollector::default().collect(query, source)
    }

    fn from_typed(keys: Vec<SurrogateKey>) -> Self {
        let mut seen = HashSet::with_capacity(keys.len());
        let keys = keys
            .into_iter()
            .filter(|key| seen.insert(*key))
            .filter(|key| !key.is_blank())
            .map(|key| key.to_string())
            .collect();
        Self { keys }
    }

    /// Replace every key.
    pub fn set_keys<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
    }

    /// Append one key. Duplicates are kept.
    pub fn add_key(&mut self, key: impl Into<String>) {
        self.keys.push(key.into());
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn join(&self, delimiter: &str) -> String {
        self.keys.join(delimiter)
    }
}

impl<K: Into<String>> FromIterator<K> for SurrogateKeyCollection {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut collection = Self::default();
        collection.set_keys(iter);
        collection
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::surrogate::query::{QueriedObject, Term};

    #[derive(Default)]
    struct FakeQuery {
        items: Vec<ContentItem>,
        templates: Vec<TemplateType>,
        unavailable: Vec<TemplateType>,
        classifiable: bool,
    }

    impl FakeQuery {
        fn new(items: Vec<ContentItem>, templates: Vec<TemplateType>) -> Self {
            Self {
                items,
                templates,
                unavailable: Vec::new(),
                classifiable: true,
            }
        }
    }

    impl QueryResult for FakeQuery {
        fn matched_items(&self) -> &[ContentItem] {
            &self.items
        }

        fn supports_classification(&self) -> bool {
            self.classifiable
        }

        fn is_template(&self, template: TemplateType) -> Option<bool> {
            if self.unavailable.contains(&template) {
                return None;
            }
            Some(self.templates.contains(&template))
        }

        fn is_single_view(&self) -> bool {
            self.templates.contains(&TemplateType::Single)
        }

        fn is_term_archive(&self) -> bool {
            self.templates.iter().any(|t| t.is_term_archive())
        }
    }

    #[derive(Default)]
    struct FakeTaxonomies {
        taxonomies: Vec<String>,
        terms: HashMap<(i64, String), Vec<Term>>,
        queried: Option<QueriedObject>,
    }

    impl FakeTaxonomies {
        fn with_terms(mut self, item: i64, taxonomy: &str, ids: &[i64]) -> Self {
            if !self.taxonomies.iter().any(|t| t == taxonomy) {
                self.taxonomies.push(taxonomy.to_string());
            }
            self.terms.insert(
                (item, taxonomy.to_string()),
                ids.iter().copied().map(Term::new).collect(),
            );
            self
        }
    }

    impl TaxonomySource for FakeTaxonomies {
        fn taxonomies(&self) -> Vec<String> {
            self.taxonomies.clone()
        }

        fn terms_for(&self, item_id: i64, taxonomy: &str) -> Option<Vec<Term>> {
            self.terms.get(&(item_id, taxonomy.to_string())).cloned()
        }

        fn queried_object(&self) -> Option<QueriedObject> {
            self.queried.clone()
        }
    }

    #[test]
    fn single_view_collects_items_template_terms_and_author() {
        let query = FakeQuery::new(vec![ContentItem::new(42, 7)], vec![TemplateType::Single]);
        let source = FakeTaxonomies::default().with_terms(42, "category", &[3]);

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["p-42", "tm-single", "t-3", "a-7"]);
    }

    #[test]
    fn category_archive_uses_queried_object() {
        let query = FakeQuery::new(Vec::new(), vec![TemplateType::Category]);
        let source = FakeTaxonomies {
            queried: Some(QueriedObject::term(9, "category")),
            ..Default::default()
        };

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["tm-category", "t-9"]);
    }

    #[test]
    fn archive_with_items_lists_posts_first() {
        let query = FakeQuery::new(
            vec![ContentItem::new(5, 1), ContentItem::new(6, 2)],
            vec![TemplateType::Archive, TemplateType::Tag],
        );
        let source = FakeTaxonomies {
            queried: Some(QueriedObject::term(11, "post_tag")),
            ..Default::default()
        };

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["p-5", "p-6", "tm-archive", "t-11"]);
    }

    #[test]
    fn archive_without_taxonomy_name_has_no_term_key() {
        let query = FakeQuery::new(Vec::new(), vec![TemplateType::Tax]);
        let source = FakeTaxonomies {
            queried: Some(QueriedObject {
                id: Some(9),
                taxonomy: Some(String::new()),
            }),
            ..Default::default()
        };

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["tm-tax"]);
    }

    #[test]
    fn single_and_singular_yield_only_single() {
        let query = FakeQuery::new(
            vec![ContentItem::new(1, 0)],
            vec![TemplateType::Singular, TemplateType::Single],
        );
        let keys = SurrogateKeyCollection::from_query(&query, &FakeTaxonomies::default());

        let templates: Vec<&String> = keys.keys().iter().filter(|k| k.starts_with("tm-")).collect();
        assert_eq!(templates, ["tm-single"]);
    }

    #[test]
    fn unclassifiable_query_has_no_template_key() {
        let mut query = FakeQuery::new(vec![ContentItem::new(3, 0)], vec![TemplateType::Home]);
        query.classifiable = false;

        let keys = SurrogateKeyCollection::from_query(&query, &FakeTaxonomies::default());
        assert_eq!(keys.keys(), ["p-3"]);
    }

    #[test]
    fn missing_predicate_falls_through_to_next_match() {
        let mut query = FakeQuery::new(
            Vec::new(),
            vec![TemplateType::Home, TemplateType::CommentsPopup],
        );
        query.unavailable = vec![TemplateType::Home];

        let keys = SurrogateKeyCollection::from_query(&query, &FakeTaxonomies::default());
        assert_eq!(keys.keys(), ["tm-comments_popup"]);
    }

    #[test]
    fn zero_ids_are_dropped() {
        let query = FakeQuery::new(vec![ContentItem::new(0, 0)], vec![TemplateType::Single]);
        let source = FakeTaxonomies::default().with_terms(0, "category", &[0, 4]);

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["tm-single", "t-4"]);
    }

    #[test]
    fn negative_ids_use_absolute_value() {
        let query = FakeQuery::new(vec![ContentItem::new(-42, -7)], vec![TemplateType::Single]);
        let source = FakeTaxonomies::default().with_terms(-42, "category", &[-3]);

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["p-42", "tm-single", "t-3", "a-7"]);
    }

    #[test]
    fn duplicates_across_steps_appear_once() {
        let query = FakeQuery::new(
            vec![ContentItem::new(8, 2), ContentItem::new(8, 2)],
            vec![TemplateType::Single],
        );
        let source = FakeTaxonomies::default()
            .with_terms(8, "category", &[3, 3])
            .with_terms(8, "post_tag", &[3, 5]);

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["p-8", "tm-single", "t-3", "t-5", "a-2"]);
    }

    #[test]
    fn unresolved_taxonomy_does_not_stop_collection() {
        let query = FakeQuery::new(vec![ContentItem::new(42, 7)], vec![TemplateType::Single]);
        let mut source = FakeTaxonomies::default().with_terms(42, "post_tag", &[12]);
        source.taxonomies.insert(0, "broken".to_string());
        source
            .terms
            .insert((42, "post_format".to_string()), vec![Term::default()]);
        source.taxonomies.push("post_format".to_string());

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["p-42", "tm-single", "t-12", "a-7"]);
    }

    #[test]
    fn filter_limits_taxonomies() {
        let query = FakeQuery::new(vec![ContentItem::new(42, 7)], vec![TemplateType::Single]);
        let source = FakeTaxonomies::default()
            .with_terms(42, "category", &[3])
            .with_terms(42, "post_tag", &[12]);

        let collector = SurrogateKeyCollector::new(TaxonomyFilter::allow_only(["post_tag"]));
        let keys = collector.collect(&query, &source);
        assert_eq!(keys.keys(), ["p-42", "tm-single", "t-12", "a-7"]);
    }

    #[test]
    fn single_view_without_items_skips_terms() {
        let query = FakeQuery::new(Vec::new(), vec![TemplateType::Single]);
        let source = FakeTaxonomies::default().with_terms(42, "category", &[3]);

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["tm-single"]);
    }

    #[test]
    fn plain_page_has_no_term_keys() {
        let query = FakeQuery::new(vec![ContentItem::new(2, 1)], vec![TemplateType::Page]);
        let source = FakeTaxonomies {
            queried: Some(QueriedObject::term(9, "category")),
            ..Default::default()
        }
        .with_terms(2, "category", &[3]);

        let keys = SurrogateKeyCollection::from_query(&query, &source);
        assert_eq!(keys.keys(), ["p-2", "tm-page"]);
    }

    #[test]
    fn keys_are_stable_between_reads() {
        let query = FakeQuery::new(vec![ContentItem::new(42, 7)], vec![TemplateType::Single]);
        let keys = SurrogateKeyCollection::from_query(&query, &FakeTaxonomies::default());
        assert_eq!(keys.keys(), keys.keys());
        assert_eq!(keys.keys().to_vec(), keys.clone().keys().to_vec());
    }

    #[test]
    fn add_key_does_not_deduplicate() {
        let mut keys: SurrogateKeyCollection = ["p-1", "tm-home"].into_iter().collect();
        keys.add_key("p-1");
        assert_eq!(keys.keys(), ["p-1", "tm-home", "p-1"]);

        keys.set_keys(["custom"]);
        assert_eq!(keys.join(" "), "custom");
    }
}
