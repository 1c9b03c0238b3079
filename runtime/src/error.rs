//! Extractor failure taxonomy.
//!
//! Every variant is fatal for the run. [`RunError`] pins the failure to the
//! stage it happened in so the log and the snapshot name say where it broke.

use crate::scrape::Stage;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Sign-in control missing or unclickable, or credentials rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// An expected element never showed up.
    #[error("timed out after {waited:?} waiting for {what}{}", suffix(.last_error))]
    Timeout {
        what: String,
        waited: Duration,
        last_error: Option<String>,
    },

    /// Display text did not have the expected shape.
    #[error("parse failure: {0}")]
    Parse(#[from] genrelay::ParseError),

    /// The assembled record violates the payload contract.
    #[error("invalid record: {0}")]
    Record(#[from] genrelay::PayloadError),

    /// An in-page script ran but reported failure or returned garbage.
    #[error("{what}: {detail}")]
    Script { what: String, detail: String },

    /// Browser, session or network failure.
    #[error("browser: {0:#}")]
    Browser(anyhow::Error),
}

impl ScrapeError {
    pub fn browser(err: impl Into<anyhow::Error>) -> Self {
        Self::Browser(err.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

fn suffix(last_error: &Option<String>) -> String {
    last_error
        .as_deref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

/// A [`ScrapeError`] together with the stage that produced it.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct RunError {
    pub stage: Stage,
    #[source]
    pub source: ScrapeError,
}
