//! Mock implementations for testing
//!
//! Provides mock CommandPublisher, Reconnect and PropertyBus implementations
//! to exercise the bridge without a broker or a real property service.

use crate::bridge::properties::{PropertyDecl, PropertyValue};
use crate::bridge::OutboundCommand;
use crate::property::{PropertyBus, PropertyBusError};
use crate::transport::mqtt::{ConnectionState, MqttError, Reconnect};
use crate::transport::CommandPublisher;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock command publisher; clones share the recorded history
#[derive(Debug, Clone, Default)]
pub struct MockPublisher {
    connected: Arc<AtomicBool>,
    published: Arc<Mutex<Vec<OutboundCommand>>>,
    pub should_fail: bool,
}

impl MockPublisher {
    pub fn connected() -> Self {
        let publisher = Self::default();
        publisher.set_connected(true);
        publisher
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Connected, but every publish fails
    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::connected()
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<OutboundCommand> {
        lock(&self.published).clone()
    }

    pub fn clear_history(&self) {
        lock(&self.published).clear();
    }
}

impl CommandPublisher for MockPublisher {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn try_publish(&self, command: &OutboundCommand) -> Result<(), MqttError> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected {
                state: ConnectionState::Disconnected("mock".to_string()),
            });
        }
        if self.should_fail {
            return Err(MqttError::ConnectionFailedStr(
                "Mock publish failure".to_string(),
            ));
        }
        lock(&self.published).push(command.clone());
        Ok(())
    }
}

/// Broker connection that refuses a fixed number of attempts before succeeding
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    failures_left: Arc<AtomicU32>,
    attempts: Arc<Mutex<Vec<Instant>>>,
}

impl MockConnector {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures_left: Arc::new(AtomicU32::new(failures)),
            attempts: Arc::default(),
        }
    }

    /// Time of every attempt, in order
    pub fn attempts(&self) -> Vec<Instant> {
        lock(&self.attempts).clone()
    }
}

#[async_trait]
impl Reconnect for MockConnector {
    async fn reconnect(&mut self) -> Result<(), MqttError> {
        lock(&self.attempts).push(Instant::now());
        let refused = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            Err(MqttError::ConnectionFailedStr(
                "Mock connection refused".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// One call observed by [`RecordingPropertyBus`]
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyCall {
    Declare {
        path: String,
        initial: PropertyValue,
        text: String,
        writeable: bool,
    },
    Publish {
        path: String,
        value: PropertyValue,
        text: String,
    },
}

/// Property service that records every call; clones share the recording
#[derive(Debug, Clone, Default)]
pub struct RecordingPropertyBus {
    calls: Arc<Mutex<Vec<PropertyCall>>>,
    unavailable: Arc<AtomicBool>,
}

impl RecordingPropertyBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with [`PropertyBusError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PropertyCall> {
        lock(&self.calls).clone()
    }

    pub fn declared_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PropertyCall::Declare { path, .. } => Some(path),
                PropertyCall::Publish { .. } => None,
            })
            .collect()
    }

    /// Values published to `path`, oldest first
    pub fn published_values(&self, path: &str) -> Vec<PropertyValue> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PropertyCall::Publish { path: p, value, .. } if p == path => Some(value),
                _ => None,
            })
            .collect()
    }

    fn check_available(&self, path: &str) -> Result<(), PropertyBusError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(PropertyBusError::Unavailable(path.to_string()))
        } else {
            Ok(())
        }
    }
}

impl PropertyBus for RecordingPropertyBus {
    fn declare(&mut self, decl: &PropertyDecl, text: &str) -> Result<(), PropertyBusError> {
        self.check_available(decl.path)?;
        lock(&self.calls).push(PropertyCall::Declare {
            path: decl.path.to_string(),
            initial: decl.initial.clone(),
            text: text.to_string(),
            writeable: decl.writeable,
        });
        Ok(())
    }

    fn publish(
        &mut self,
        path: &str,
        value: &PropertyValue,
        text: &str,
    ) -> Result<(), PropertyBusError> {
        self.check_available(path)?;
        lock(&self.calls).push(PropertyCall::Publish {
            path: path.to_string(),
            value: value.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_publisher_records_when_connected() {
        let publisher = MockPublisher::disconnected();
        let command = OutboundCommand {
            topic: "openWB/chargepoint/5/set/current".to_string(),
            payload: "16".to_string(),
        };

        assert!(publisher.try_publish(&command).is_err());
        publisher.set_connected(true);
        publisher.try_publish(&command).unwrap();
        assert_eq!(publisher.published(), vec![command]);

        publisher.clear_history();
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_mock_connector_fails_then_succeeds() {
        let mut connector = MockConnector::failing(2);
        assert!(connector.reconnect().await.is_err());
        assert!(connector.reconnect().await.is_err());
        assert!(connector.reconnect().await.is_ok());
        assert!(connector.reconnect().await.is_ok());
        assert_eq!(connector.attempts().len(), 4);
    }

    #[test]
    fn test_recording_bus_unavailable() {
        let mut bus = RecordingPropertyBus::new();
        bus.set_unavailable(true);
        let result = bus.publish("/Ac/Power", &PropertyValue::Float(1.0), "1.0W");
        assert_eq!(
            result,
            Err(PropertyBusError::Unavailable("/Ac/Power".to_string()))
        );
        assert!(bus.calls().is_empty());
    }
}
