//! Serialization of derived metadata into response headers.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use tracing::debug;

use crate::cache_control::{CacheControlBuilder, Directives};
use crate::config::{CacheControlSettings, SurrogateKeySettings};
use crate::error::AppError;
use crate::surrogate::SurrogateKeyCollection;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControlHeader {
    directives: Directives,
}

impl CacheControlHeader {
    pub fn new(directives: Directives) -> Self {
        Self { directives }
    }

    pub fn from_settings(settings: &CacheControlSettings) -> Self {
        Self::new(CacheControlBuilder::new(settings.ttl).build())
    }

    pub fn name(&self) -> HeaderName {
        header::CACHE_CONTROL
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    pub fn directives_mut(&mut self) -> &mut Directives {
        &mut self.directives
    }

    pub fn value(&self) -> Option<String> {
        self.directives.render()
    }

    /// Write the header. Returns `false` when there were no directives.
    ///
    /// An existing `Cache-Control` value is merged rather than replaced: its
    /// directives stay as they are and only the names it lacks are added.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<bool, AppError> {
        if self.directives.is_empty() {
            return Ok(false);
        }

        let merged = match headers.get(header::CACHE_CONTROL) {
            Some(existing) => {
                let existing = existing.to_str().map_err(|err| {
                    AppError::header(header::CACHE_CONTROL.as_str(), err.to_string())
                })?;
                let mut merged = Directives::parse(existing);
                merged.merge_missing(&self.directives);
                merged
            }
            None => self.directives.clone(),
        };
        let Some(value) = merged.render() else {
            return Ok(false);
        };

        let value = HeaderValue::from_str(&value)
            .map_err(|err| AppError::header(header::CACHE_CONTROL.as_str(), err.to_string()))?;
        headers.insert(header::CACHE_CONTROL, value);
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurrogateKeyHeader {
    name: HeaderName,
    delimiter: String,
}

impl SurrogateKeyHeader {
    pub fn new(name: HeaderName, delimiter: impl Into<String>) -> Self {
        Self {
            name,
            delimiter: delimiter.into(),
        }
    }

    pub fn from_settings(settings: &SurrogateKeySettings) -> Self {
        Self::new(settings.header_name.clone(), settings.delimiter.clone())
    }

    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn render(&self, keys: &SurrogateKeyCollection) -> Option<String> {
        (!keys.is_empty()).then(|| keys.join(&self.delimiter))
    }

    /// Write the header. Returns `false` when there were no keys.
    pub fn apply(
        &self,
        headers: &mut HeaderMap,
        keys: &SurrogateKeyCollection,
    ) -> Result<bool, AppError> {
        let Some(value) = self.render(keys) else {
            return Ok(false);
        };

        let value = HeaderValue::from_str(&value)
            .map_err(|err| AppError::header(self.name.as_str(), err.to_string()))?;
        headers.insert(self.name.clone(), value);
        debug!(header = %self.name, keys = keys.len(), "surrogate keys attached");
        Ok(true)
    }
}

impl Default for SurrogateKeyHeader {
    fn default() -> Self {
        Self::from_settings(&SurrogateKeySettings::default())
    }
}
