//! Translation and liveness engine
//!
//! [`Bridge`] owns the [`PropertyStateMirror`] and is its only writer. All
//! inputs reach it as [`BridgeEvent`]s on one channel: inbound MQTT messages
//! from the transport task and externally initiated property writes from the
//! property service. A fixed-period tick drives the liveness watchdog and the
//! `/UpdateIndex` heartbeat.

pub mod coercion;
pub mod commands;
pub mod properties;
pub mod state;
pub mod watchdog;

pub use coercion::{coerce, ChargeMode, ParseError, PropertyUpdate};
pub use commands::{ChargeCommand, CommandTranslator, OutboundCommand, WriteRejection};
pub use properties::{property_table, DeviceIdentity, PropertyDecl, PropertyValue, Unit};
pub use state::{PropertyStateMirror, StateError};
pub use watchdog::{LivenessWatchdog, WatchdogState};

use crate::error::{BridgeError, BridgeResult};
use crate::property::PropertyBus;
use crate::protocol::{TopicNamespace, TopicRoute, TopicRouter};
use crate::transport::mqtt::InboundMessage;
use crate::transport::CommandPublisher;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Period of the watchdog and heartbeat tick
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Capacity of the bridge event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Input to the bridge event loop
#[derive(Debug)]
pub enum BridgeEvent {
    /// Message received from the broker
    Inbound(InboundMessage),
    /// Write initiated by a consumer of the property service
    PropertyWrite(PropertyWrite),
}

/// Externally initiated property write awaiting an accepted/rejected answer
#[derive(Debug)]
pub struct PropertyWrite {
    pub path: String,
    pub value: PropertyValue,
    pub reply: Option<oneshot::Sender<bool>>,
}

/// Cloneable entry point for property service consumers
#[derive(Debug, Clone)]
pub struct PropertyWriteHandle {
    tx: mpsc::Sender<BridgeEvent>,
}

impl PropertyWriteHandle {
    pub fn new(tx: mpsc::Sender<BridgeEvent>) -> Self {
        Self { tx }
    }

    /// Submit a write and wait for the bridge to accept or reject it.
    ///
    /// Returns `false` if the bridge is no longer running.
    pub async fn write(&self, path: impl Into<String>, value: impl Into<PropertyValue>) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = BridgeEvent::PropertyWrite(PropertyWrite {
            path: path.into(),
            value: value.into(),
            reply: Some(reply_tx),
        });
        if self.tx.send(event).await.is_err() {
            return false;
        }
        reply_rx.await.unwrap_or(false)
    }
}

pub struct Bridge<B: PropertyBus, P: CommandPublisher> {
    namespace: TopicNamespace,
    mirror: PropertyStateMirror<B>,
    watchdog: LivenessWatchdog,
    publisher: P,
}

impl<B: PropertyBus, P: CommandPublisher> Bridge<B, P> {
    /// Declare the full property table on `bus` and arm the watchdog at `now`
    pub fn new(
        namespace: TopicNamespace,
        identity: &DeviceIdentity,
        bus: B,
        publisher: P,
        timeout: Duration,
        now: Instant,
    ) -> BridgeResult<Self> {
        let mirror = PropertyStateMirror::declare(property_table(identity), bus)?;
        info!(
            service = %identity.service_name(),
            prefix = namespace.prefix(),
            chargepoint = namespace.chargepoint_id(),
            "Declared bridge properties"
        );
        Ok(Self {
            namespace,
            mirror,
            watchdog: LivenessWatchdog::new(timeout, now),
            publisher,
        })
    }

    pub fn mirror(&self) -> &PropertyStateMirror<B> {
        &self.mirror
    }

    pub fn watchdog(&self) -> &LivenessWatchdog {
        &self.watchdog
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn handle_event(&mut self, event: BridgeEvent, now: Instant) {
        match event {
            BridgeEvent::Inbound(message) => self.handle_inbound(&message, now),
            BridgeEvent::PropertyWrite(write) => {
                let accepted = self.handle_write(&write.path, write.value);
                if let Some(reply) = write.reply {
                    let _ = reply.send(accepted);
                }
            }
        }
    }

    /// Apply one inbound message; errors are logged and never propagate
    pub fn handle_inbound(&mut self, message: &InboundMessage, now: Instant) {
        let route = TopicRouter::route(&self.namespace, &message.topic);
        if !route.is_match() {
            debug!(topic = %message.topic, "Ignoring unrelated topic");
            return;
        }
        self.watchdog.touch(now);

        let Some(field) = route.field() else {
            if let TopicRoute::Telemetry { key, .. } = &route {
                debug!(topic = %message.topic, key = %key, "Ignoring unknown field");
            }
            return;
        };

        let payload = message.payload_str();
        match coerce(field, &payload) {
            Ok(updates) => {
                for update in updates {
                    if let Err(e) = self.mirror.set(update.path, update.value) {
                        error!(path = update.path, "Failed to update property: {}", e);
                    }
                }
            }
            Err(e) => {
                error!(
                    topic = %message.topic,
                    payload = %payload,
                    field = %field,
                    "Failed to parse payload: {}", e
                );
            }
        }
    }

    /// Handle an externally initiated write; returns whether it was accepted.
    ///
    /// Writes to undeclared or read-only paths are rejected. A write whose
    /// command cannot be sent because MQTT is down is rejected as well, so the
    /// property keeps showing the wallbox's real state. Writeable paths
    /// without a command are stored locally.
    pub fn handle_write(&mut self, path: &str, value: PropertyValue) -> bool {
        match self.try_write(path, value) {
            Ok(()) => true,
            Err(rejection) => {
                warn!(path, "Rejected property write: {}", rejection);
                false
            }
        }
    }

    fn try_write(&mut self, path: &str, value: PropertyValue) -> Result<(), WriteRejection> {
        let writeable = self.mirror.is_writeable(path).unwrap_or(false);
        if !writeable {
            return Err(WriteRejection::NotWriteable {
                path: path.to_string(),
            });
        }

        match CommandTranslator::translate(&self.namespace, path, &value) {
            Ok(command) => {
                if !self.publisher.is_connected() {
                    return Err(WriteRejection::NotConnected {
                        path: path.to_string(),
                    });
                }
                if let Err(e) = self.publisher.try_publish(&command) {
                    error!(topic = %command.topic, "Failed to publish command: {}", e);
                    return Err(WriteRejection::NotConnected {
                        path: path.to_string(),
                    });
                }
                info!(topic = %command.topic, payload = %command.payload, "Forwarded property write");
            }
            Err(WriteRejection::NoCommand { .. }) => {
                debug!(path, "No command for property, storing locally");
            }
            Err(rejection) => return Err(rejection),
        }

        if let Err(e) = self.mirror.set(path, value) {
            error!(path, "Failed to store written value: {}", e);
        }
        Ok(())
    }

    /// One watchdog tick: fail on a stalled feed, otherwise advance the heartbeat
    pub fn tick(&mut self, now: Instant) -> BridgeResult<()> {
        match self.watchdog.check(now) {
            WatchdogState::Dead { silence } => {
                let timeout = self.watchdog.timeout().unwrap_or_default();
                error!(
                    silence_secs = silence.as_secs(),
                    timeout_secs = timeout.as_secs(),
                    "MQTT timeout, exiting"
                );
                Err(BridgeError::LivenessTimeout { silence, timeout })
            }
            WatchdogState::Alive => {
                self.mirror.advance_update_index()?;
                Ok(())
            }
        }
    }

    /// Serve events and ticks until the watchdog fires or the channel closes
    pub async fn run(
        &mut self,
        events: &mut mpsc::Receiver<BridgeEvent>,
        tick_period: Duration,
    ) -> BridgeResult<()> {
        let mut ticker = tokio::time::interval_at(Instant::now() + tick_period, tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            tick_ms = tick_period.as_millis() as u64,
            timeout_secs = self.watchdog.timeout().map(|t| t.as_secs()),
            "Bridge event loop started"
        );

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, Instant::now()),
                    None => return Err(BridgeError::EventChannelClosed),
                },
                _ = ticker.tick() => self.tick(Instant::now())?,
            }
        }
    }
}
