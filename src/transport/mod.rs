//! Transport layer towards the openWB MQTT broker
//!
//! This module provides the publisher abstraction used by the bridge and the
//! rumqttc-based MQTT implementation.

use crate::bridge::OutboundCommand;

pub mod mqtt;

pub use mqtt::MqttError;

/// Outbound command path of the message bus
///
/// Both methods are called from the bridge event loop and must return
/// immediately. A command that cannot be handed to the transport right away
/// is dropped, never queued.
pub trait CommandPublisher: Send {
    /// Check if the transport is currently connected
    fn is_connected(&self) -> bool;

    /// Hand `command` to the transport without waiting
    fn try_publish(&self, command: &OutboundCommand) -> Result<(), MqttError>;
}
