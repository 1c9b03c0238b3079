//! The browser context owned by one extraction run.

use crate::renderer::{RenderContext, Renderer};
use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// An isolated page with its cookies and state, alive for one run.
pub struct Session {
    /// Short identifier used in logs.
    pub id: String,
    context: Box<dyn RenderContext>,
    created_at: Instant,
}

impl Session {
    pub fn new(id: impl Into<String>, context: Box<dyn RenderContext>) -> Self {
        Self {
            id: id.into(),
            context,
            created_at: Instant::now(),
        }
    }

    /// Open a fresh context on `renderer`.
    pub async fn open(renderer: &dyn Renderer) -> Result<Self> {
        let context = renderer.new_context().await?;
        let id = format!("run-{}", chrono::Local::now().format("%Y%m%dT%H%M%S"));
        debug!(session = %id, "browser context opened");
        Ok(Self::new(id, context))
    }

    pub fn context(&self) -> &dyn RenderContext {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> &mut dyn RenderContext {
        self.context.as_mut()
    }

    /// How long the session has been alive.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Release the page. Failures are logged, not returned; by the time a
    /// session closes the run's outcome is already decided.
    pub async fn close(self) {
        let age = self.age();
        let id = self.id;
        match self.context.close().await {
            Ok(()) => debug!(session = %id, ?age, "browser context closed"),
            Err(e) => warn!(session = %id, "closing browser context: {e:#}"),
        }
    }
}
