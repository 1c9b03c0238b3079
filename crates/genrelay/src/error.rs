//! Error types for record construction, text parsing and configuration.

use thiserror::Error;

/// Display text could not be turned into a typed value.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("{field}: no number in {text:?}")]
    NotNumeric { field: &'static str, text: String },

    #[error("{field}: {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("unrecognised date/time {text:?}")]
    Timestamp { text: String },
}

/// A record or payload line violates the wire contract.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("telemetry record is missing {0}")]
    MissingField(&'static str),

    #[error("{field}: {value} is not a valid reading")]
    InvalidValue { field: &'static str, value: f64 },

    #[error("payload must be a single line")]
    Multiline,

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration values supplied out of band are missing or inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(String),

    #[error("environment variable {0} is set but empty")]
    Empty(String),

    #[error("{set} is set but {unset} is not; set both or neither")]
    Partial { set: String, unset: String },

    #[error("failed to load env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}
