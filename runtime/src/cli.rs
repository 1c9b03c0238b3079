//! Command-line surface of `genrelay-scrape`.

use crate::portal::DEFAULT_PORTAL_URL;
use chrono::{FixedOffset, Offset, Utc};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;

/// Sign into the generator portal, read runtime hours, battery voltage and
/// the last exercise date, and print one JSON payload line on stdout.
///
/// Portal credentials come from PORTAL_USERNAME / PORTAL_PASSWORD, either in
/// the environment or in an env file. Exits 0 with the payload printed, 1 on
/// any failure (a viewport snapshot is saved), 2 on a usage error.
#[derive(Debug, Parser)]
#[command(name = "genrelay-scrape", version, about, long_about = None)]
pub struct Cli {
    /// Portal entry page
    #[arg(long, env = "GENRELAY_PORTAL_URL", default_value = DEFAULT_PORTAL_URL)]
    pub portal_url: String,

    /// Open this URL after signing in instead of using the landing page
    #[arg(long, env = "GENRELAY_DASHBOARD_URL")]
    pub dashboard_url: Option<String>,

    /// Chromium/Chrome executable [default: discovered]
    #[arg(long, env = "GENRELAY_CHROMIUM_PATH", value_name = "PATH")]
    pub chromium: Option<PathBuf>,

    /// Seconds to wait for each expected element
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    pub wait_timeout_secs: u64,

    /// Seconds to wait for each page load
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub nav_timeout_secs: u64,

    /// Milliseconds between element polls
    #[arg(long, default_value_t = 250, value_parser = clap::value_parser!(u64).range(10..))]
    pub poll_interval_ms: u64,

    /// Where failure snapshots go [default: ~/.genrelay/snapshots]
    #[arg(long, env = "GENRELAY_SNAPSHOT_DIR", value_name = "DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Do not save a snapshot on failure
    #[arg(long)]
    pub no_snapshot: bool,

    /// Run with a visible browser window
    #[arg(long)]
    pub show_browser: bool,

    /// Skip the randomized pauses between UI actions
    #[arg(long)]
    pub no_pacing: bool,

    /// UTC offset the portal displays dates in, e.g. -05:00
    #[arg(long, value_parser = parse_offset, default_value = "+00:00", allow_hyphen_values = true)]
    pub display_offset: FixedOffset,

    /// Env file holding PORTAL_USERNAME / PORTAL_PASSWORD [default: ./.env if present]
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH", env = "GENRELAY_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

/// `+HH:MM`, `-HH:MM`, `Z` or `UTC`.
pub fn parse_offset(raw: &str) -> Result<FixedOffset, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    raw.parse::<FixedOffset>()
        .map_err(|_| format!("{raw:?} is not a UTC offset like +00:00 or -05:00"))
}

/// Write the payload as a single line and flush. A closed pipe surfaces as
/// an error instead of a panic.
pub fn write_payload(mut out: impl Write, line: &str) -> io::Result<()> {
    writeln!(out, "{line}")?;
    out.flush()
}
