use std::path::PathBuf;

use thiserror::Error;

use crate::config::LoadError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] LoadError),
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid query snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("invalid header `{name}`: {reason}")]
    Header { name: String, reason: String },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
