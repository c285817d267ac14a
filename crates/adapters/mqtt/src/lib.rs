//! # tempo-adapter-mqtt
//!
//! MQTT adapter — delivers retained device commands to the broker.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker with credentials from configuration
//! - Implement the [`CommandSink`](tempo_app::ports::CommandSink) port:
//!   QoS 1 publishes with the retain flag and a bounded timeout
//! - Drive the rumqttc event loop in a background task, logging connection
//!   lifecycle events (connack, disconnect, errors, stray inbound messages)
//!   for observability
//!
//! ## Dependency rule
//! Depends on `tempo-app` (port traits) and `tempo-domain` only. The `app`
//! and `domain` crates must never reference this adapter.

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttError;

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;

use tempo_app::ports::CommandSink;
use tempo_domain::error::TempoError;

/// MQTT-backed command sink.
///
/// Cheap to clone; all clones share the underlying client channel.
#[derive(Clone)]
pub struct MqttCommandSink {
    client: AsyncClient,
    publish_timeout: Duration,
}

impl MqttCommandSink {
    /// Connect to the broker described by `config`.
    ///
    /// Returns the sink and the handle of the spawned event-loop driver
    /// task. The driver owns reconnection: rumqttc re-establishes the
    /// session on the next poll after a connection error.
    #[must_use]
    pub fn connect(config: &MqttConfig) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username.clone(), password.clone());
        }

        let (client, event_loop) = AsyncClient::new(options, 16);
        let driver = tokio::spawn(drive(event_loop));

        (
            Self {
                client,
                publish_timeout: Duration::from_secs(u64::from(config.publish_timeout_secs)),
            },
            driver,
        )
    }
}

/// Poll the event loop forever, logging the connection lifecycle.
///
/// The dispatch core never consumes these events; they exist so operators
/// can see broker state in the logs.
async fn drive(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("MQTT client connected");
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::warn!("MQTT broker requested disconnect");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::debug!(topic = %publish.topic, "received MQTT message");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, "MQTT connection error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

impl CommandSink for MqttCommandSink {
    async fn publish(&self, topic: &str, payload: &[u8], retain: bool) -> Result<(), TempoError> {
        let request = self
            .client
            .publish(topic, QoS::AtLeastOnce, retain, payload.to_vec());
        match tokio::time::timeout(self.publish_timeout, request).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(MqttError::Client(err).into()),
            Err(_) => Err(MqttError::Timeout.into()),
        }
    }
}
