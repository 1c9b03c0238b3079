//! Browser abstraction.
//!
//! The scrape flow only talks to [`RenderContext`]; the chromium backend and
//! the test fake both implement it.

pub mod chromium;
#[cfg(test)]
pub mod fake;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of a top-level navigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The URL after redirects.
    pub final_url: String,
    /// Time until the load event, in milliseconds.
    pub load_time_ms: u64,
}

/// Launches isolated browser contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh page with no shared state.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;

    /// Terminate the browser process.
    async fn shutdown(&self) -> Result<()>;
}

/// One live page.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate and wait for the load event, bounded by `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Evaluate an expression in the page and return its JSON value.
    /// Promises are awaited; `undefined` comes back as `null`.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;

    /// Current document URL.
    async fn get_url(&self) -> Result<String>;

    /// PNG of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Close the page and release its resources.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Find a Chromium binary by checking multiple locations.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. Explicit override
    if let Ok(p) = std::env::var("GENRELAY_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Well-known install locations (Raspberry Pi OS, macOS)
    let common = [
        "/usr/lib/chromium-browser/chromium-browser",
        "/usr/lib/chromium/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    ];
    common.iter().map(PathBuf::from).find(|p| p.exists())
}
