//! MQTT transport adapter.
//!
//! Implements [`StatusPort`] on top of `esp_idf_svc::mqtt::client`.  A
//! dedicated receiver thread pumps the connection and turns broker
//! activity into queue events:
//!
//! | Broker event             | Queue event                              |
//! |--------------------------|------------------------------------------|
//! | connected                | `Event::Transport(Connected)`            |
//! | disconnected             | `Event::Transport(Disconnected)`         |
//! | message on command topic | `Event::Message { topic, payload }`      |
//!
//! The receiver never touches the client; the main loop calls
//! [`MqttTransport::subscribe_commands`] when it sees `Connected`, so the
//! command filter is re-subscribed after every reconnect.
//!
//! Host builds keep the same API and log publishes instead of sending.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};

use crate::app::ports::{PublishError, StatusPort};

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
use crate::config::MqttConfig;
#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event, TransportStatus};
#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};

/// Inbound payloads larger than this are dropped.
pub const MAX_PAYLOAD_BYTES: usize = 512;

pub struct MqttTransport {
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    command_filter: String,
    connected: Arc<AtomicBool>,
    closed: bool,
}

impl MqttTransport {
    /// Create the client and start the receiver thread.
    #[cfg(target_os = "espidf")]
    pub fn connect(cfg: &MqttConfig, command_filter: String) -> anyhow::Result<Self> {
        let conf = MqttClientConfiguration {
            client_id: Some(cfg.client_id.as_str()),
            username: cfg.username.as_deref(),
            password: cfg.password.as_deref(),
            ..Default::default()
        };
        let (client, conn) = EspMqttClient::new(cfg.url.as_str(), &conf)?;
        let connected = Arc::new(AtomicBool::new(false));
        spawn_receiver(conn, connected.clone())?;
        info!("MQTT: client created for {}", cfg.url);

        Ok(Self {
            client: Some(client),
            command_filter,
            connected,
            closed: false,
        })
    }

    /// Host simulation: always "connected", publishes are logged.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated(command_filter: String) -> Self {
        Self {
            command_filter,
            connected: Arc::new(AtomicBool::new(true)),
            closed: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.closed && self.connected.load(Ordering::Relaxed)
    }

    /// (Re)subscribe to the command namespace.
    pub fn subscribe_commands(&mut self) {
        if self.closed {
            return;
        }
        #[cfg(target_os = "espidf")]
        if let Some(client) = self.client.as_mut() {
            if let Err(e) = client.subscribe(&self.command_filter, QoS::AtMostOnce) {
                warn!("MQTT: subscribe {} failed: {:?}", self.command_filter, e);
                return;
            }
        }
        info!("MQTT: subscribed to {}", self.command_filter);
    }
}

impl StatusPort for MqttTransport {
    fn publish(&mut self, topic: &str, payload: &str, retained: bool) -> Result<(), PublishError> {
        if !self.is_connected() {
            return Err(PublishError::NotConnected);
        }
        debug!("MQTT: {} <- {} (retain={})", topic, payload, retained);

        #[cfg(target_os = "espidf")]
        {
            let client = self.client.as_mut().ok_or(PublishError::NotConnected)?;
            client
                .publish(topic, QoS::AtLeastOnce, retained, payload.as_bytes())
                .map_err(|e| {
                    warn!("MQTT: publish {} failed: {:?}", topic, e);
                    PublishError::Rejected
                })?;
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        #[cfg(target_os = "espidf")]
        {
            // Dropping the client ends the connection; the receiver thread
            // sees the error and exits.
            self.client = None;
        }
        info!("MQTT: transport closed");
    }
}

#[cfg(target_os = "espidf")]
fn spawn_receiver(mut conn: EspMqttConnection, connected: Arc<AtomicBool>) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("mqtt-rx".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            loop {
                let event = match conn.next() {
                    Ok(event) => event,
                    Err(e) => {
                        info!("MQTT: connection closed ({:?})", e);
                        break;
                    }
                };
                match event.payload() {
                    EventPayload::Connected(_) => {
                        connected.store(true, Ordering::Relaxed);
                        push_event(Event::Transport(TransportStatus::Connected));
                    }
                    EventPayload::Disconnected => {
                        connected.store(false, Ordering::Relaxed);
                        push_event(Event::Transport(TransportStatus::Disconnected));
                    }
                    EventPayload::Received {
                        topic: Some(topic),
                        data,
                        details,
                        ..
                    } => {
                        if !matches!(details, Details::Complete) {
                            continue;
                        }
                        if data.len() > MAX_PAYLOAD_BYTES {
                            warn!("MQTT: dropping {} byte payload on {}", data.len(), topic);
                            continue;
                        }
                        let Ok(text) = core::str::from_utf8(data) else {
                            warn!("MQTT: non-UTF-8 payload on {}, dropped", topic);
                            continue;
                        };
                        let queued = push_event(Event::Message {
                            topic: topic.to_string(),
                            payload: text.to_string(),
                        });
                        if !queued {
                            warn!("MQTT: event queue full, {} dropped", topic);
                        }
                    }
                    EventPayload::Error(e) => warn!("MQTT: client error {:?}", e),
                    _ => {}
                }
            }
        })?;
    Ok(())
}
