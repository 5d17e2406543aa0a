//! Cache metadata for content-managed sites behind an edge cache.
//!
//! - [`cache_control`] turns the configured TTL into `Cache-Control`
//!   directives.
//! - [`surrogate`] derives purge tags from the content a response renders.
//! - [`headers`] and [`middleware`] write both onto HTTP responses.

pub mod cache_control;
pub mod config;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod surrogate;
pub mod telemetry;
