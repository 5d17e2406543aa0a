//! Host policy over which taxonomies contribute term keys.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::config::SurrogateKeySettings;

type FilterFn = dyn Fn(Vec<String>) -> Vec<String> + Send + Sync;

/// Rewrites the registered taxonomy list before term lookup.
#[derive(Clone)]
pub struct TaxonomyFilter {
    inner: Option<Arc<FilterFn>>,
}

impl TaxonomyFilter {
    /// Pass every taxonomy through unchanged.
    pub fn identity() -> Self {
        Self { inner: None }
    }

    pub fn new<F>(filter: F) -> Self
    where
        F: Fn(Vec<String>) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            inner: Some(Arc::new(filter)),
        }
    }

    /// Keep only the named taxonomies, preserving host order.
    pub fn allow_only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: HashSet<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |taxonomies| {
            taxonomies
                .into_iter()
                .filter(|taxonomy| allowed.contains(taxonomy))
                .collect()
        })
    }

    pub fn exclude<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let excluded: HashSet<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |taxonomies| {
            taxonomies
                .into_iter()
                .filter(|taxonomy| !excluded.contains(taxonomy))
                .collect()
        })
    }

    /// Run `self`, then `next` on its output.
    pub fn then(self, next: TaxonomyFilter) -> Self {
        match (self.inner, next.inner) {
            (None, None) => Self::identity(),
            (Some(inner), None) | (None, Some(inner)) => Self { inner: Some(inner) },
            (Some(first), Some(second)) => {
                Self::new(move |taxonomies| second(first(taxonomies)))
            }
        }
    }

    pub fn from_settings(settings: &SurrogateKeySettings) -> Self {
        let allow = match settings.taxonomies.as_ref() {
            Some(names) => Self::allow_only(names.iter().cloned()),
            None => Self::identity(),
        };

        if settings.exclude_taxonomies.is_empty() {
            allow
        } else {
            allow.then(Self::exclude(settings.exclude_taxonomies.iter().cloned()))
        }
    }

    pub fn apply(&self, taxonomies: Vec<String>) -> Vec<String> {
        match self.inner.as_ref() {
            Some(filter) => filter(taxonomies),
            None => taxonomies,
        }
    }
}

impl Default for TaxonomyFilter {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for TaxonomyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.inner.is_some() {
            "custom"
        } else {
            "identity"
        };
        f.debug_tuple("TaxonomyFilter").field(&kind).finish()
    }
}
