//! MQTT client implementation for the openWB bridge
//!
//! The module is split into focused sub-modules:
//!
//! - [`connection`] - Pure connection state and option construction
//! - [`message_handler`] - Pure event routing
//! - [`reconnect`] - Fixed-delay reconnection supervisor
//! - [`client`] - Impure I/O: the rumqttc event loop task and publisher
//!
//! # Usage
//!
//! ```rust,no_run
//! use openwb_bridge::config::MqttSection;
//! use openwb_bridge::protocol::TopicNamespace;
//! use openwb_bridge::transport::mqtt::{MqttClient, ReconnectSupervisor};
//!
//! # tokio_test::block_on(async {
//! let config = MqttSection {
//!     broker_url: "mqtt://localhost:1883".to_string(),
//!     topic: "openWB/#".to_string(),
//!     username_env: None,
//!     password_env: None,
//!     tls_ca_path: None,
//!     keep_alive_secs: 60,
//! };
//! let namespace = TopicNamespace::new(&config.topic, 5);
//!
//! let (events_tx, _events_rx) = tokio::sync::mpsc::channel(64);
//! let mut client = MqttClient::new("MqttOpenWB_1", &config, &namespace, ReconnectSupervisor::default())?;
//! client.start(events_tx)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod client;
pub mod connection;
pub mod message_handler;
pub mod reconnect;

pub use client::{MqttClient, MqttPublisher};
pub use connection::{client_id, parse_broker_url, BrokerEndpoint, ConnectionState, MqttError};
pub use message_handler::{EventRoute, InboundMessage, MessageHandler};
pub use reconnect::{Reconnect, ReconnectReport, ReconnectSupervisor, DEFAULT_RECONNECT_DELAY};
