//! Command-line surface of `genrelay-publish`.

use crate::publish::DEFAULT_PORT;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

/// Relay one generator telemetry payload from stdin to an MQTT topic.
///
/// Exits 0 once the broker acknowledges the message, 1 on any runtime
/// failure, 2 on a usage error.
#[derive(Debug, Parser)]
#[command(name = "genrelay-publish", version, about, long_about = None)]
pub struct Cli {
    /// Broker address (IPv4, IPv6 or host name)
    #[arg(value_parser = parse_broker)]
    pub broker: String,

    /// Topic to publish to, e.g. home/generator
    #[arg(value_parser = parse_topic)]
    pub topic: String,

    /// Broker port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Publish this text instead of reading stdin
    #[arg(long, value_name = "TEXT")]
    pub message: Option<String>,

    /// Check the payload against the generator schema before connecting
    #[arg(long)]
    pub validate: bool,

    /// Do not ask the broker to retain the message
    #[arg(long)]
    pub no_retain: bool,

    /// MQTT client identifier [default: genrelay-<random>]
    #[arg(long)]
    pub client_id: Option<String>,

    /// Keep-alive interval in seconds
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(5..))]
    pub keep_alive_secs: u64,

    /// Seconds to wait for the connect handshake and for the publish ack
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Env file holding MQTT_USERNAME / MQTT_PASSWORD [default: ./.env if present]
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH", env = "GENRELAY_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

/// Accept an IP literal or a plausible host name.
pub fn parse_broker(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if raw.parse::<IpAddr>().is_ok() {
        return Ok(raw.to_string());
    }
    let valid_host = !raw.is_empty()
        && raw.len() <= 253
        && raw.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    if valid_host {
        Ok(raw.to_string())
    } else {
        Err(format!(
            "invalid broker address {raw:?}: expected an IP address or host name"
        ))
    }
}

/// Topics to publish to must be non-empty and free of wildcards.
pub fn parse_topic(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Err("topic must not be empty".to_string());
    }
    if raw.contains(['+', '#']) {
        return Err(format!("topic {raw:?} contains a wildcard"));
    }
    Ok(raw.to_string())
}
