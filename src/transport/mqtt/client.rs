//! Impure I/O operations for the MQTT client
//!
//! This module owns the rumqttc event loop. It runs in its own task,
//! forwards inbound publishes to the bridge as [`BridgeEvent::Inbound`],
//! keeps the subscriptions alive across reconnects and publishes the
//! connection state for [`MqttPublisher`].

use super::connection::{configure_mqtt_options, ConnectionState, MqttError};
use super::message_handler::{EventRoute, MessageHandler};
use super::reconnect::{Reconnect, ReconnectSupervisor};
use crate::bridge::{BridgeEvent, OutboundCommand};
use crate::config::MqttSection;
use crate::protocol::TopicNamespace;
use crate::transport::CommandPublisher;
use async_trait::async_trait;
use rumqttc::v5::{mqttbytes::QoS, AsyncClient, EventLoop};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

/// Capacity of the rumqttc request channel
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// MQTT side of the bridge
pub struct MqttClient {
    client_id: String,
    client: AsyncClient,
    event_loop: Option<EventLoop>,
    topics: Vec<String>,
    supervisor: ReconnectSupervisor,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    event_loop_handle: Option<JoinHandle<()>>,
}

impl MqttClient {
    pub fn new(
        client_id: &str,
        config: &MqttSection,
        namespace: &TopicNamespace,
        supervisor: ReconnectSupervisor,
    ) -> Result<Self, MqttError> {
        let mqtt_options = configure_mqtt_options(client_id, config)?;
        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            client_id: client_id.to_string(),
            client,
            event_loop: Some(event_loop),
            topics: namespace.subscription_topics(),
            supervisor,
            state_tx,
            state_rx,
            shutdown_tx,
            event_loop_handle: None,
        })
    }

    /// Non-blocking publisher handle for the bridge event loop
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher {
            client: self.client.clone(),
            state_rx: self.state_rx.clone(),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Spawn the event loop task; inbound messages are sent to `events`
    pub fn start(&mut self, events: mpsc::Sender<BridgeEvent>) -> Result<(), MqttError> {
        let event_loop = self.event_loop.take().ok_or_else(|| {
            MqttError::ConnectionFailedStr("Event loop already started".to_string())
        })?;

        let client = self.client.clone();
        let topics = self.topics.clone();
        let supervisor = self.supervisor.clone();
        let state_tx = self.state_tx.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let span = crate::mqtt_span!(client_id = %self.client_id);

        let handle = tokio::spawn(
            async move {
                info!("Starting MQTT event loop");
                run_event_loop(
                    event_loop,
                    client,
                    topics,
                    events,
                    state_tx,
                    supervisor,
                    shutdown_rx,
                )
                .await;
                info!("MQTT event loop stopped");
            }
            .instrument(span),
        );
        self.event_loop_handle = Some(handle);
        Ok(())
    }

    /// Disconnect from the broker and stop the event loop task
    pub async fn disconnect(&mut self) -> Result<(), MqttError> {
        let _ = self.shutdown_tx.send(true);

        if self.state_rx.borrow().is_connected() {
            self.client
                .disconnect()
                .await
                .map_err(|e| MqttError::ConnectionFailed(Box::new(e)))?;
        }
        let _ = self
            .state_tx
            .send(ConnectionState::Disconnected("Client disconnected".to_string()));

        if let Some(mut handle) = self.event_loop_handle.take() {
            match tokio::time::timeout(Duration::from_secs(2), &mut handle).await {
                Ok(Ok(())) => info!("Event loop task shut down gracefully"),
                Ok(Err(e)) if !e.is_cancelled() => warn!("Event loop task ended with error: {}", e),
                Err(_) => {
                    warn!("Event loop task didn't shut down gracefully, aborting");
                    handle.abort();
                }
                _ => {}
            }
        }

        info!("MQTT client disconnected");
        Ok(())
    }
}

impl Drop for MqttClient {
    fn drop(&mut self) {
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    topics: Vec<String>,
    events: mpsc::Sender<BridgeEvent>,
    state_tx: watch::Sender<ConnectionState>,
    supervisor: ReconnectSupervisor,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let polled = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("Shutdown signal received, stopping MQTT event loop");
                    return;
                }
                continue;
            }
            polled = event_loop.poll() => polled,
        };

        let reason = match polled {
            Ok(event) => match MessageHandler::route_mqtt_event(&event) {
                EventRoute::ConnectionAcknowledged => {
                    info!("MQTT connected to broker");
                    let _ = state_tx.send(ConnectionState::Connected);
                    subscribe(&client, &topics);
                    continue;
                }
                EventRoute::MessageReceived(message) => {
                    debug!(topic = %message.topic, "Received MQTT message");
                    if events.send(BridgeEvent::Inbound(message)).await.is_err() {
                        info!("Bridge event loop gone, stopping MQTT event loop");
                        return;
                    }
                    continue;
                }
                EventRoute::SubscriptionConfirmed { packet_id } => {
                    debug!(packet_id, "Subscription confirmed");
                    continue;
                }
                EventRoute::InfrastructureEvent(event) => {
                    debug!(target: "mqtt_transport", "MQTT event: {}", event);
                    continue;
                }
                EventRoute::OutgoingEvent => continue,
                EventRoute::Disconnected => "Broker disconnected".to_string(),
            },
            Err(e) => e.to_string(),
        };

        warn!("MQTT disconnected: {}", reason);
        let _ = state_tx.send(ConnectionState::Disconnected(reason));

        let mut connection = EventLoopConnection {
            event_loop: &mut event_loop,
        };
        let report = tokio::select! {
            _ = shutdown_rx.changed() => {
                info!("Shutdown signal received during reconnection, stopping");
                return;
            }
            report = supervisor.run(&mut connection, &state_tx) => report,
        };
        debug!(failed_attempts = report.failed_attempts, "Reconnection complete");
        subscribe(&client, &topics);
    }
}

/// Queue subscriptions without waiting on the request channel
fn subscribe(client: &AsyncClient, topics: &[String]) {
    for topic in topics {
        match client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
            Ok(()) => debug!(topic = %topic, "Subscribed"),
            Err(e) => error!(topic = %topic, "Failed to subscribe: {}", e),
        }
    }
}

/// Drives a rumqttc event loop until the broker acknowledges a new connection
struct EventLoopConnection<'a> {
    event_loop: &'a mut EventLoop,
}

#[async_trait]
impl Reconnect for EventLoopConnection<'_> {
    async fn reconnect(&mut self) -> Result<(), MqttError> {
        loop {
            match self.event_loop.poll().await {
                Ok(event) => {
                    if matches!(
                        MessageHandler::route_mqtt_event(&event),
                        EventRoute::ConnectionAcknowledged
                    ) {
                        return Ok(());
                    }
                }
                Err(e) => return Err(MqttError::ConnectionFailed(Box::new(e))),
            }
        }
    }
}

/// Fire-and-forget command publisher backed by the shared rumqttc client
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    state_rx: watch::Receiver<ConnectionState>,
}

impl CommandPublisher for MqttPublisher {
    fn is_connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    fn try_publish(&self, command: &OutboundCommand) -> Result<(), MqttError> {
        let state = self.state_rx.borrow().clone();
        if !state.is_connected() {
            return Err(MqttError::NotConnected { state });
        }

        self.client
            .try_publish(
                command.topic.as_str(),
                QoS::AtMostOnce,
                false,
                command.payload.clone(),
            )
            .map_err(|e| MqttError::PublishFailed(Box::new(e)))?;

        debug!(topic = %command.topic, payload = %command.payload, "Published command");
        Ok(())
    }
}
