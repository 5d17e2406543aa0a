//! Response header middleware.
//!
//! Handlers attach a [`SurrogateKeyCollection`] to their response (it
//! implements `IntoResponseParts`, so returning `(keys, body)` is enough).
//! The layer turns it into the surrogate-key header and adds `Cache-Control`
//! from the configured TTL. When the handler already sent `Cache-Control`
//! the two are merged and the handler's own directives win.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponseParts, Response, ResponseParts},
};
use metrics::{counter, histogram};
use tracing::{instrument, warn};

use crate::config::Settings;
use crate::headers::{CacheControlHeader, SurrogateKeyHeader};
use crate::surrogate::SurrogateKeyCollection;
use crate::telemetry::{SURROGATE_KEYS_METRIC, TTL_MISSING_METRIC};

/// Shared header configuration for the middleware.
#[derive(Debug, Clone, Default)]
pub struct HeaderState {
    pub cache_control: CacheControlHeader,
    pub surrogate_keys: SurrogateKeyHeader,
}

impl HeaderState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            cache_control: CacheControlHeader::from_settings(&settings.cache_control),
            surrogate_keys: SurrogateKeyHeader::from_settings(&settings.surrogate_keys),
        }
    }
}

impl IntoResponseParts for SurrogateKeyCollection {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}

/// Middleware writing `Cache-Control` and surrogate-key headers.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn cache_headers_layer(
    State(state): State<HeaderState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if let Some(keys) = response.extensions_mut().remove::<SurrogateKeyCollection>() {
        histogram!(SURROGATE_KEYS_METRIC).record(keys.len() as f64);
        if let Err(err) = state.surrogate_keys.apply(response.headers_mut(), &keys) {
            warn!(error = %err, "dropping surrogate-key header");
        }
    }

    match state.cache_control.apply(response.headers_mut()) {
        Ok(true) => {}
        Ok(false) => counter!(TTL_MISSING_METRIC).increment(1),
        Err(err) => warn!(error = %err, "leaving cache-control as sent"),
    }

    response
}
