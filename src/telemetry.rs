//! Logging and metric setup for the binary.
//!
//! Output always goes to stderr; stdout is reserved for derived headers and
//! keys.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};
use crate::error::AppError;

pub const SURROGATE_KEYS_METRIC: &str = "tessera_surrogate_keys";
pub const TTL_MISSING_METRIC: &str = "tessera_cache_control_ttl_missing_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global subscriber. `RUST_LOG` directives, when present, are
/// layered over the configured level.
pub fn init(logging: &LoggingSettings) -> Result<(), AppError> {
    describe_metrics();

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    subscriber(logging, directives.as_deref())
        .try_init()
        .map_err(|err| AppError::telemetry(format!("tracing subscriber already set: {err}")))
}

/// Build the subscriber without installing it.
pub fn subscriber(
    logging: &LoggingSettings,
    directives: Option<&str>,
) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(level_filter(logging.level, directives))
        .with(ErrorLayer::default())
        .with(stderr_layer(logging.format))
}

fn level_filter(level: LevelFilter, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn stderr_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    match format {
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_histogram!(
            SURROGATE_KEYS_METRIC,
            Unit::Count,
            "Number of surrogate keys attached to a response."
        );
        describe_counter!(
            TTL_MISSING_METRIC,
            Unit::Count,
            "Responses sent without a configured Cache-Control TTL."
        );
    });
}
