//! Publisher failure taxonomy.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("no payload received on input")]
    EmptyPayload,

    #[error("payload spans more than one line")]
    MultilinePayload,

    #[error("failed to read payload: {0}")]
    Read(#[from] std::io::Error),

    #[error("payload does not match the generator schema: {0}")]
    Schema(#[from] genrelay::PayloadError),

    #[error("cannot connect to broker {broker}: {source}")]
    Connect {
        broker: String,
        #[source]
        source: rumqttc::ConnectionError,
    },

    #[error("broker {broker} refused the connection: {code}")]
    Refused { broker: String, code: String },

    #[error("timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        after: Duration,
    },

    #[error("mqtt client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
}
