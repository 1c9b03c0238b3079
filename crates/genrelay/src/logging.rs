//! Tracing setup shared by the `genrelay-*` binaries.
//!
//! Diagnostics go to stderr or a log file, never stdout: stdout is reserved
//! for the payload line.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where and how to write logs.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

/// Install the global subscriber. `RUST_LOG` refines the default
/// `genrelay=info` directive.
pub fn init(options: &LogOptions) -> std::io::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(
        "genrelay=info"
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?,
    );

    match &options.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            if options.json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
        None => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            if options.json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
    }
    Ok(())
}
