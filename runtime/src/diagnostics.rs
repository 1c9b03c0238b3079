//! Viewport snapshots for failed runs.

use crate::renderer::RenderContext;
use crate::scrape::Stage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Writes `<stage>-<timestamp>.png` files into one directory.
///
/// Capturing is best effort: every failure is logged and swallowed, and the
/// whole capture is bounded by `timeout` so a wedged browser cannot hold up
/// termination.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    timeout: Duration,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Default location under the user's home directory.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".genrelay")
            .join("snapshots")
    }

    /// Capture the current viewport. Returns the written path, or `None` if
    /// anything went wrong.
    pub async fn capture(&self, ctx: &dyn RenderContext, stage: Stage) -> Option<PathBuf> {
        let png = match tokio::time::timeout(self.timeout, ctx.screenshot()).await {
            Ok(Ok(png)) => png,
            Ok(Err(e)) => {
                warn!(stage = %stage, "snapshot not captured: {e:#}");
                return None;
            }
            Err(_) => {
                warn!(stage = %stage, timeout = ?self.timeout, "snapshot not captured: browser did not respond");
                return None;
            }
        };

        let name = format!(
            "{}-{}.png",
            stage.slug(),
            chrono::Local::now().format("%Y%m%dT%H%M%S%.3f")
        );
        let path = self.dir.join(name);
        let written = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, &png).await
        };
        match written.await {
            Ok(()) => {
                info!(stage = %stage, path = %path.display(), bytes = png.len(), "diagnostic snapshot written");
                Some(path)
            }
            Err(e) => {
                warn!(stage = %stage, path = %path.display(), "snapshot not written: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fake::{FakePage, FakeRenderer};
    use crate::renderer::Renderer;

    #[tokio::test]
    async fn test_capture_writes_stage_named_png() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::new(FakePage::new());
        let ctx = renderer.new_context().await.unwrap();

        let writer = SnapshotWriter::new(dir.path().join("nested"));
        let path = writer.capture(ctx.as_ref(), Stage::ExtractingMetrics).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("extracting-metrics-"), "{name}");
        assert!(name.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), crate::renderer::fake::FAKE_PNG);
    }

    #[tokio::test]
    async fn test_capture_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::new(FakePage::new().without_screenshots());
        let ctx = renderer.new_context().await.unwrap();

        let writer = SnapshotWriter::new(dir.path());
        assert!(writer.capture(ctx.as_ref(), Stage::Authenticating).await.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_capture_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FakeRenderer::new(FakePage::new().stalled());
        let ctx = renderer.new_context().await.unwrap();

        let writer = SnapshotWriter::new(dir.path()).with_timeout(Duration::from_millis(30));
        let started = std::time::Instant::now();
        assert!(writer.capture(ctx.as_ref(), Stage::Start).await.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
