//! Extractor side of genrelay.
//!
//! Drives a headless Chromium session through the generator portal, finds
//! the readings wherever they sit in the shadow-DOM tree, and turns them into
//! one [`genrelay::TelemetryRecord`].

pub mod cli;
pub mod diagnostics;
pub mod error;
pub mod extraction;
pub mod live;
pub mod portal;
pub mod renderer;
pub mod scrape;
pub mod stealth;

pub use error::{RunError, ScrapeError};
pub use portal::PortalProfile;
pub use scrape::{run_once, ScrapeOptions, ScrapeOutput, Scraper, Stage};
