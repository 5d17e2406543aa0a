//! `Cache-Control` directive building.
//!
//! Each builder owns a fixed set of directives and only ever returns those;
//! the final header is the merge of every builder's [`Directives`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub const MAX_AGE: &str = "max-age";

/// A TTL as it appears in configuration.
///
/// `false` is the "not configured" sentinel. Every other value is coerced to
/// a non-negative number of seconds: negatives take their absolute value,
/// fractions are truncated, and text uses its leading integer (or zero).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TtlSetting {
    Flag(bool),
    Seconds(i64),
    Fractional(f64),
    Text(String),
}

impl TtlSetting {
    pub fn seconds(&self) -> Option<u64> {
        match self {
            TtlSetting::Flag(false) => None,
            TtlSetting::Flag(true) => Some(1),
            TtlSetting::Seconds(seconds) => Some(seconds.unsigned_abs()),
            TtlSetting::Fractional(seconds) => Some(truncate_unsigned(*seconds)),
            TtlSetting::Text(text) => Some(leading_integer(text)),
        }
    }
}

/// Absolute value with the fraction dropped; non-finite values become zero.
pub(crate) fn truncate_unsigned(value: f64) -> u64 {
    if value.is_finite() {
        // `as` saturates at the u64 bounds.
        value.abs().trunc() as u64
    } else {
        0
    }
}

/// Magnitude of the integer `text` starts with, ignoring its sign.
pub(crate) fn leading_integer(text: &str) -> u64 {
    let trimmed = text.trim_start();
    let digits = trimmed
        .strip_prefix(['-', '+'])
        .unwrap_or(trimmed);

    digits
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0u64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u64::from(digit))
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DirectiveValue {
    /// A bare directive such as `public`.
    Flag,
    Seconds(u64),
    Token(String),
}

impl fmt::Display for DirectiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveValue::Flag => Ok(()),
            DirectiveValue::Seconds(seconds) => write!(f, "{seconds}"),
            DirectiveValue::Token(token) => f.write_str(token),
        }
    }
}

/// Ordered `Cache-Control` directives with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    entries: Vec<(String, DirectiveValue)>,
}

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a directive, replacing an existing one of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: DirectiveValue) {
        let name = name.into().to_ascii_lowercase();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Fold another builder's directives into this set. Directives the other
    /// set does not name are left untouched.
    pub fn merge(&mut self, other: Directives) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }

    /// Add the directives of `other` this set does not already name.
    pub fn merge_missing(&mut self, other: &Directives) {
        for (name, value) in &other.entries {
            if self.get(name).is_none() {
                self.entries.push((name.clone(), value.clone()));
            }
        }
    }

    /// Read a `Cache-Control` value. Quoted arguments are kept verbatim and
    /// empty members are skipped.
    pub fn parse(value: &str) -> Self {
        let mut directives = Self::new();
        for member in value.split(',').map(str::trim).filter(|m| !m.is_empty()) {
            let (name, value) = match member.split_once('=') {
                Some((name, argument)) => {
                    let argument = argument.trim();
                    let value = match argument.parse::<u64>() {
                        Ok(seconds) => DirectiveValue::Seconds(seconds),
                        Err(_) => DirectiveValue::Token(argument.to_string()),
                    };
                    (name.trim(), value)
                }
                None => (member, DirectiveValue::Flag),
            };
            if !name.is_empty() {
                directives.insert(name, value);
            }
        }
        directives
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectiveValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Header value, or `None` when there is nothing to send.
    pub fn render(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(name, value)| match value {
                DirectiveValue::Flag => name.clone(),
                _ => format!("{name}={value}"),
            })
            .collect();
        Some(parts.join(", "))
    }
}

impl Serialize for Directives {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Builds the `max-age` directive from the configured TTL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControlBuilder {
    ttl: Option<u64>,
}

impl CacheControlBuilder {
    pub fn new(ttl: Option<u64>) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Option<u64> {
        self.ttl
    }

    pub fn build(&self) -> Directives {
        build(self.ttl)
    }
}

/// `max-age=<ttl>` when a TTL is configured, otherwise nothing.
pub fn build(ttl: Option<u64>) -> Directives {
    let mut directives = Directives::new();
    if let Some(seconds) = ttl {
        directives.insert(MAX_AGE, DirectiveValue::Seconds(seconds));
    }
    directives
}
