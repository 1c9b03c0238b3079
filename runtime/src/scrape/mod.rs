//! One extraction run: sign in, walk the dashboard, read three values, emit
//! one payload line.
//!
//! The run is a linear state machine over [`Stage`]. Any error moves it to
//! [`Stage::Failed`]; there is no retry inside a run.

mod flow;

pub use flow::Scraper;

use crate::diagnostics::SnapshotWriter;
use crate::error::{RunError, ScrapeError};
use crate::live::session::Session;
use crate::portal::PortalProfile;
use crate::renderer::Renderer;
use crate::stealth::behavior::Pacing;
use genrelay::config::Credentials;
use genrelay::TelemetryRecord;
use std::fmt;
use std::time::Duration;
use tracing::error;

/// Where a run is. Ordered: a run only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    Authenticating,
    NavigatingDashboard,
    ExtractingMetrics,
    NavigatingEvents,
    ExtractingExerciseDate,
    Serializing,
    Done,
    Failed,
}

impl Stage {
    /// File-name friendly form.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Authenticating => "authenticating",
            Self::NavigatingDashboard => "navigating-dashboard",
            Self::ExtractingMetrics => "extracting-metrics",
            Self::NavigatingEvents => "navigating-events",
            Self::ExtractingExerciseDate => "extracting-exercise-date",
            Self::Serializing => "serializing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Authenticating => "authenticating",
            Self::NavigatingDashboard => "navigating to dashboard",
            Self::ExtractingMetrics => "extracting metrics",
            Self::NavigatingEvents => "navigating to events",
            Self::ExtractingExerciseDate => "extracting exercise date",
            Self::Serializing => "serializing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Per-run knobs.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub credentials: Credentials,
    /// Bound on every element wait.
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    /// Bound on each top-level navigation.
    pub nav_timeout: Duration,
    pub pacing: Pacing,
}

impl ScrapeOptions {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            wait_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
            nav_timeout: Duration::from_secs(30),
            pacing: Pacing::HUMAN,
        }
    }
}

/// A successful run.
#[derive(Debug, Clone)]
pub struct ScrapeOutput {
    pub record: TelemetryRecord,
    /// The serialized payload, one line, no trailing newline.
    pub line: String,
}

/// Open a session on `renderer`, run the flow, snapshot on failure and close
/// the session on every path.
pub async fn run_once(
    renderer: &dyn Renderer,
    profile: &PortalProfile,
    options: &ScrapeOptions,
    snapshots: Option<&SnapshotWriter>,
) -> Result<ScrapeOutput, RunError> {
    let mut session = Session::open(renderer).await.map_err(|e| RunError {
        stage: Stage::Start,
        source: ScrapeError::browser(e.context("opening browser context")),
    })?;

    let outcome = Scraper::new(&mut session, profile, options).run().await;

    if let Err(failure) = &outcome {
        error!(session = %session.id, stage = %failure.stage, "run failed: {}", failure.source);
        if let Some(writer) = snapshots {
            writer.capture(session.context(), failure.stage).await;
        }
    }
    session.close().await;
    outcome
}
