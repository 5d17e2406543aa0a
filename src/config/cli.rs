use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the tessera binary.
#[derive(Debug, Parser)]
#[command(
    name = "tessera",
    version,
    about = "Derive Cache-Control and Surrogate-Key headers for a rendered query"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TESSERA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the response headers derived from a query snapshot.
    Headers(HeadersArgs),
    /// Print one surrogate key per line for a query snapshot.
    Keys(KeysArgs),
}

impl Command {
    pub fn overrides(&self) -> &HeaderOverrides {
        match self {
            Command::Headers(args) => &args.overrides,
            Command::Keys(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct HeadersArgs {
    #[command(flatten)]
    pub overrides: HeaderOverrides,

    /// Emit the headers as a JSON object instead of `Name: value` lines.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,

    /// JSON file describing the resolved query.
    #[arg(value_name = "SNAPSHOT", value_hint = ValueHint::FilePath)]
    pub snapshot: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct KeysArgs {
    #[command(flatten)]
    pub overrides: HeaderOverrides,

    /// JSON file describing the resolved query.
    #[arg(value_name = "SNAPSHOT", value_hint = ValueHint::FilePath)]
    pub snapshot: PathBuf,
}

#[derive(Debug, Args, Default, Clone)]
pub struct HeaderOverrides {
    /// Override the Cache-Control TTL in seconds.
    #[arg(
        long = "ttl",
        value_name = "SECONDS",
        conflicts_with = "no_ttl",
        allow_negative_numbers = true
    )]
    pub ttl: Option<i64>,

    /// Send no max-age directive regardless of configuration.
    #[arg(long = "no-ttl", action = clap::ArgAction::SetTrue)]
    pub no_ttl: bool,

    /// Override the surrogate-key header name.
    #[arg(long = "surrogate-header", value_name = "NAME")]
    pub surrogate_header: Option<String>,

    /// Override the delimiter placed between surrogate keys.
    #[arg(long = "delimiter", value_name = "TEXT")]
    pub delimiter: Option<String>,

    /// Only collect term keys from these taxonomies (repeatable).
    #[arg(long = "taxonomy", value_name = "NAME")]
    pub taxonomies: Vec<String>,

    /// Never collect term keys from these taxonomies (repeatable).
    #[arg(long = "exclude-taxonomy", value_name = "NAME")]
    pub exclude_taxonomies: Vec<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}
