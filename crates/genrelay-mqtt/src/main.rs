use anyhow::{Context, Result};
use clap::Parser;
use genrelay::config::{self, Credentials};
use genrelay::logging::{self, LogOptions};
use genrelay_mqtt::cli::Cli;
use genrelay_mqtt::input::{accept_payload, validate_schema};
use genrelay_mqtt::{publish_once, read_payload, PublishOptions, PublishTarget};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // usage errors exit with status 2 here, before anything touches the network
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

    let payload = match &cli.message {
        Some(text) => accept_payload(text)?,
        None => read_payload(std::io::stdin().lock()).context("reading payload from stdin")?,
    };
    if cli.validate {
        validate_schema(&payload)?;
    }

    let credentials = Credentials::optional_from_env(config::MQTT_USERNAME, config::MQTT_PASSWORD)?;
    let mut options = PublishOptions {
        keep_alive: Duration::from_secs(cli.keep_alive_secs),
        timeout: Duration::from_secs(cli.timeout_secs),
        retain: !cli.no_retain,
        credentials,
        ..PublishOptions::default()
    };
    if let Some(id) = cli.client_id {
        options.client_id = id;
    }

    let target = PublishTarget {
        host: cli.broker,
        port: cli.port,
        topic: cli.topic,
    };

    let receipt = publish_once(&target, &options, &payload)
        .await
        .with_context(|| format!("publishing to {} on {target}", target.topic))?;

    info!(
        topic = %receipt.topic,
        mid = receipt.pkid,
        elapsed_ms = receipt.elapsed.as_millis() as u64,
        "done"
    );
    Ok(())
}
