//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::str::FromStr;

use axum::http::HeaderName;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache_control::TtlSetting;

pub use cli::{CliArgs, Command, HeaderOverrides, HeadersArgs, KeysArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tessera";
const ENV_PREFIX: &str = "TESSERA";
pub const DEFAULT_SURROGATE_HEADER: &str = "surrogate-key";
pub const DEFAULT_KEY_DELIMITER: &str = " ";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache_control: CacheControlSettings,
    pub surrogate_keys: SurrogateKeySettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControlSettings {
    /// `None` when no TTL is configured.
    pub ttl: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurrogateKeySettings {
    pub header_name: HeaderName,
    pub delimiter: String,
    /// Allow-list of taxonomies; `None` keeps every registered taxonomy.
    pub taxonomies: Option<Vec<String>>,
    pub exclude_taxonomies: Vec<String>,
}

impl Default for SurrogateKeySettings {
    fn default() -> Self {
        Self {
            header_name: HeaderName::from_static(DEFAULT_SURROGATE_HEADER),
            delimiter: DEFAULT_KEY_DELIMITER.to_string(),
            taxonomies: None,
            exclude_taxonomies: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("surrogate_keys.taxonomies")
            .with_list_parse_key("surrogate_keys.exclude_taxonomies"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(cli.command.overrides());

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache_control: RawCacheControlSettings,
    surrogate_keys: RawSurrogateKeySettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheControlSettings {
    ttl: Option<TtlSetting>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSurrogateKeySettings {
    header_name: Option<String>,
    delimiter: Option<String>,
    taxonomies: Option<Vec<String>>,
    exclude_taxonomies: Option<Vec<String>>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &HeaderOverrides) {
        if let Some(ttl) = overrides.ttl {
            self.cache_control.ttl = Some(TtlSetting::Seconds(ttl));
        }
        if overrides.no_ttl {
            self.cache_control.ttl = Some(TtlSetting::Flag(false));
        }
        if let Some(name) = overrides.surrogate_header.as_ref() {
            self.surrogate_keys.header_name = Some(name.clone());
        }
        if let Some(delimiter) = overrides.delimiter.as_ref() {
            self.surrogate_keys.delimiter = Some(delimiter.clone());
        }
        if !overrides.taxonomies.is_empty() {
            self.surrogate_keys.taxonomies = Some(overrides.taxonomies.clone());
        }
        if !overrides.exclude_taxonomies.is_empty() {
            self.surrogate_keys.exclude_taxonomies = Some(overrides.exclude_taxonomies.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache_control,
            surrogate_keys,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            cache_control: build_cache_control_settings(cache_control),
            surrogate_keys: build_surrogate_key_settings(surrogate_keys)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_control_settings(cache_control: RawCacheControlSettings) -> CacheControlSettings {
    CacheControlSettings {
        ttl: cache_control.ttl.as_ref().and_then(TtlSetting::seconds),
    }
}

fn build_surrogate_key_settings(
    keys: RawSurrogateKeySettings,
) -> Result<SurrogateKeySettings, LoadError> {
    let header_name = match keys.header_name {
        Some(name) => HeaderName::from_bytes(name.trim().as_bytes()).map_err(|err| {
            LoadError::invalid("surrogate_keys.header_name", format!("{err}"))
        })?,
        None => HeaderName::from_static(DEFAULT_SURROGATE_HEADER),
    };

    let delimiter = keys
        .delimiter
        .unwrap_or_else(|| DEFAULT_KEY_DELIMITER.to_string());
    if delimiter.is_empty() {
        return Err(LoadError::invalid(
            "surrogate_keys.delimiter",
            "delimiter must not be empty",
        ));
    }
    if !delimiter
        .bytes()
        .all(|byte| byte == b' ' || byte.is_ascii_graphic())
    {
        return Err(LoadError::invalid(
            "surrogate_keys.delimiter",
            "delimiter must be visible ASCII or a space",
        ));
    }

    Ok(SurrogateKeySettings {
        header_name,
        delimiter,
        taxonomies: keys.taxonomies.map(clean_names),
        exclude_taxonomies: keys.exclude_taxonomies.map(clean_names).unwrap_or_default(),
    })
}

fn clean_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
