//! One connection, one QoS 1 publish, one acknowledgment, one disconnect.

use crate::error::PublishError;
use genrelay::config::Credentials;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, Incoming, MqttOptions,
    Outgoing, QoS,
};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Standard unencrypted MQTT port.
pub const DEFAULT_PORT: u16 = 1883;

/// Where the payload goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub host: String,
    pub port: u16,
    pub topic: String,
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// How the single connection behaves.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub client_id: String,
    pub keep_alive: Duration,
    /// Bound on the connect handshake and, separately, on the publish ack.
    pub timeout: Duration,
    /// Ask the broker to keep the message for late subscribers.
    pub retain: bool,
    pub credentials: Option<Credentials>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            client_id: format!("genrelay-{}", uuid::Uuid::new_v4()),
            keep_alive: Duration::from_secs(60),
            timeout: Duration::from_secs(10),
            retain: true,
            credentials: None,
        }
    }
}

/// Proof that the broker accepted the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Packet identifier the broker acknowledged.
    pub pkid: u16,
    pub topic: String,
    pub elapsed: Duration,
}

/// Publish `payload` to `target.topic` with at-least-once delivery and
/// return once the broker's PUBACK has been observed.
///
/// The connection is always torn down before returning, on success or
/// failure.
pub async fn publish_once(
    target: &PublishTarget,
    options: &PublishOptions,
    payload: &str,
) -> Result<PublishReceipt, PublishError> {
    let started = Instant::now();

    let mut mqtt = MqttOptions::new(&options.client_id, &target.host, target.port);
    mqtt.set_keep_alive(options.keep_alive);
    mqtt.set_clean_session(true);
    if let Some(creds) = &options.credentials {
        mqtt.set_credentials(&creds.username, &creds.password);
    }

    let (client, mut eventloop) = AsyncClient::new(mqtt, 10);

    info!(
        broker = %target,
        client_id = %options.client_id,
        authenticated = options.credentials.is_some(),
        "connecting to broker"
    );

    let mut connected = false;
    let result = async {
        timeout(options.timeout, wait_for_connack(&mut eventloop, target))
            .await
            .map_err(|_| PublishError::Timeout {
                waiting_for: "broker CONNACK",
                after: options.timeout,
            })??;
        connected = true;
        info!(broker = %target, "connected");

        info!(topic = %target.topic, bytes = payload.len(), retain = options.retain, "publishing");
        client
            .publish(
                target.topic.as_str(),
                QoS::AtLeastOnce,
                options.retain,
                payload.as_bytes().to_vec(),
            )
            .await?;

        let pkid = timeout(options.timeout, wait_for_puback(&mut eventloop, target))
            .await
            .map_err(|_| PublishError::Timeout {
                waiting_for: "broker PUBACK",
                after: options.timeout,
            })??;
        info!(topic = %target.topic, mid = pkid, "publish confirmed by broker");
        Ok::<_, PublishError>(pkid)
    }
    .await;

    // a dropped connection has nothing left to close
    let link_lost = matches!(result, Err(PublishError::Connect { .. }));
    if connected && !link_lost {
        disconnect(&client, &mut eventloop, options.timeout).await;
    }

    let pkid = result?;
    Ok(PublishReceipt {
        pkid,
        topic: target.topic.clone(),
        elapsed: started.elapsed(),
    })
}

async fn wait_for_connack(
    eventloop: &mut EventLoop,
    target: &PublishTarget,
) -> Result<(), PublishError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    return Ok(());
                }
                return Err(PublishError::Refused {
                    broker: target.to_string(),
                    code: format!("{:?}", ack.code),
                });
            }
            Ok(event) => debug!(?event, "event before connack"),
            Err(ConnectionError::ConnectionRefused(code)) => {
                return Err(PublishError::Refused {
                    broker: target.to_string(),
                    code: format!("{code:?}"),
                });
            }
            Err(source) => {
                return Err(PublishError::Connect {
                    broker: target.to_string(),
                    source,
                });
            }
        }
    }
}

/// Drive the event loop until the PUBACK for our publish arrives.
async fn wait_for_puback(
    eventloop: &mut EventLoop,
    target: &PublishTarget,
) -> Result<u16, PublishError> {
    let mut sent = None;
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                debug!(mid = pkid, "publish written to socket");
                sent = Some(pkid);
            }
            Ok(Event::Incoming(Incoming::PubAck(ack))) if Some(ack.pkid) == sent => {
                return Ok(ack.pkid);
            }
            Ok(event) => debug!(?event, "event while awaiting puback"),
            Err(source) => {
                return Err(PublishError::Connect {
                    broker: target.to_string(),
                    source,
                });
            }
        }
    }
}

/// Best-effort clean disconnect; failures here never change the outcome.
async fn disconnect(client: &AsyncClient, eventloop: &mut EventLoop, bound: Duration) {
    if let Err(e) = client.try_disconnect() {
        debug!("disconnect request not queued: {e}");
        return;
    }
    let drained = timeout(bound, async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("connection closed during disconnect: {e}");
                    break;
                }
            }
        }
    })
    .await;
    match drained {
        Ok(()) => info!("disconnected from broker"),
        Err(_) => warn!("broker did not confirm disconnect within {bound:?}"),
    }
}
