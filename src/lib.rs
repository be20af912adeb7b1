//! openWB MQTT bridge
//!
//! Mirrors the telemetry of an openWB wallbox charge point, received over
//! MQTT, into a fixed set of typed properties for an energy-management
//! property service, and turns writes to the control properties back into
//! openWB command messages.
//!
//! # Overview
//!
//! - [`protocol`]: openWB field identifiers, topic namespace and routing
//! - [`bridge`]: payload coercion, property state, command translation,
//!   liveness watchdog and the event loop tying them together
//! - [`property`]: the property service collaborator
//! - [`transport`]: rumqttc client with reconnect supervision
//!
//! # Quick Start
//!
//! ```rust
//! use openwb_bridge::bridge::{Bridge, DeviceIdentity, PropertyValue};
//! use openwb_bridge::property::LocalPropertyBus;
//! use openwb_bridge::protocol::TopicNamespace;
//! use openwb_bridge::testing::MockPublisher;
//! use openwb_bridge::transport::mqtt::InboundMessage;
//! use std::time::Duration;
//! use tokio::time::Instant;
//!
//! let identity = DeviceIdentity {
//!     device_instance: 43,
//!     device_name: "openWB".to_string(),
//!     max_current: 32,
//! };
//! let bus = LocalPropertyBus::new(identity.service_name());
//! let mut bridge = Bridge::new(
//!     TopicNamespace::new("openWB/#", 5),
//!     &identity,
//!     bus.clone(),
//!     MockPublisher::connected(),
//!     Duration::from_secs(60),
//!     Instant::now(),
//! )
//! .unwrap();
//!
//! let message = InboundMessage::new("openWB/chargepoint/5/get/power", "1200");
//! bridge.handle_inbound(&message, Instant::now());
//! assert_eq!(bus.get("/Ac/Power").unwrap().value, PropertyValue::Float(1200.0));
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod observability;
pub mod property;
pub mod protocol;
pub mod testing;
pub mod transport;

pub use bridge::{Bridge, BridgeEvent, PropertyWriteHandle};
pub use config::{BridgeConfig, ConfigError};
pub use error::{BridgeError, BridgeResult};
pub use property::{LocalPropertyBus, PropertyBus};
pub use protocol::{FieldId, TopicNamespace, TopicRoute, TopicRouter};
pub use transport::mqtt::MqttClient;
