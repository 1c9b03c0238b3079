use anyhow::{anyhow, Context, Result};
use clap::Parser;
use genrelay::config::{self, Credentials};
use genrelay::logging::{self, LogOptions};
use genrelay_runtime::cli::{write_payload, Cli};
use genrelay_runtime::diagnostics::SnapshotWriter;
use genrelay_runtime::renderer::chromium::{ChromiumRenderer, LaunchOptions};
use genrelay_runtime::renderer::{find_chromium, Renderer};
use genrelay_runtime::stealth::behavior::Pacing;
use genrelay_runtime::{run_once, PortalProfile, ScrapeOptions};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&LogOptions {
        file: cli.log_file.clone(),
        json: cli.log_json,
    }) {
        eprintln!("error: cannot initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    config::load_env_file(cli.env_file.as_deref())?;
    let credentials = Credentials::from_env(config::PORTAL_USERNAME, config::PORTAL_PASSWORD)
        .context("portal credentials")?;

    let profile = PortalProfile {
        dashboard_url: cli.dashboard_url,
        display_offset: cli.display_offset,
        ..PortalProfile::default().with_entry_url(cli.portal_url)
    };
    let options = ScrapeOptions {
        wait_timeout: Duration::from_secs(cli.wait_timeout_secs),
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
        nav_timeout: Duration::from_secs(cli.nav_timeout_secs),
        pacing: if cli.no_pacing { Pacing::OFF } else { Pacing::HUMAN },
        ..ScrapeOptions::new(credentials)
    };
    let snapshots = (!cli.no_snapshot).then(|| {
        SnapshotWriter::new(cli.snapshot_dir.unwrap_or_else(SnapshotWriter::default_dir))
    });
    if let Some(w) = &snapshots {
        debug!(dir = %w.dir().display(), "failure snapshots enabled");
    }

    let executable = cli
        .chromium
        .or_else(find_chromium)
        .ok_or_else(|| anyhow!("no Chromium found; install chromium or pass --chromium"))?;
    let launch = LaunchOptions {
        executable: Some(executable),
        headful: cli.show_browser,
        ..LaunchOptions::default()
    };
    let renderer = ChromiumRenderer::launch(&launch).await?;

    let outcome = run_once(&renderer, &profile, &options, snapshots.as_ref()).await;
    if let Err(e) = renderer.shutdown().await {
        warn!("browser shutdown: {e:#}");
    }
    let output = outcome?;

    // stdout carries the payload and nothing else
    write_payload(std::io::stdout().lock(), &output.line).context("writing payload to stdout")?;
    info!(payload = %output.line, "payload written");
    Ok(())
}
