//! In-process property service
//!
//! Keeps every declared property in a shared map. Cloning the bus yields
//! another handle onto the same map, so a caller can keep one clone for
//! inspection while the bridge owns the other. Writes from consumers go
//! through [`LocalPropertyBus::write`] into the bridge event loop.

use super::{PropertyBus, PropertyBusError};
use crate::bridge::properties::{PropertyDecl, PropertyValue};
use crate::bridge::PropertyWriteHandle;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// One property as seen by consumers of the service
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedProperty {
    pub value: PropertyValue,
    pub text: String,
    pub writeable: bool,
}

/// Property service living inside the bridge process
#[derive(Debug, Clone)]
pub struct LocalPropertyBus {
    service_name: String,
    properties: Arc<Mutex<BTreeMap<String, PublishedProperty>>>,
    writer: Option<PropertyWriteHandle>,
}

impl LocalPropertyBus {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            properties: Arc::new(Mutex::new(BTreeMap::new())),
            writer: None,
        }
    }

    /// Route consumer writes to the bridge behind `writer`
    pub fn with_writer(mut self, writer: PropertyWriteHandle) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Write `value` to `path` on behalf of a consumer.
    ///
    /// The bridge decides; `true` means the write was accepted. A bus without
    /// a writer rejects every write.
    pub async fn write(&self, path: &str, value: impl Into<PropertyValue>) -> bool {
        let Some(writer) = &self.writer else {
            warn!(service = %self.service_name, path, "Write rejected, no bridge attached");
            return false;
        };
        let accepted = writer.write(path, value).await;
        debug!(service = %self.service_name, path, accepted, "Consumer write");
        accepted
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Current value of `path` as a consumer would read it
    pub fn get(&self, path: &str) -> Option<PublishedProperty> {
        self.lock().get(path).cloned()
    }

    /// Copy of every published property, ordered by path
    pub fn snapshot(&self) -> BTreeMap<String, PublishedProperty> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PublishedProperty>> {
        self.properties
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PropertyBus for LocalPropertyBus {
    fn declare(&mut self, decl: &PropertyDecl, text: &str) -> Result<(), PropertyBusError> {
        let mut properties = self.lock();
        if properties.contains_key(decl.path) {
            return Err(PropertyBusError::AlreadyDeclared(decl.path.to_string()));
        }
        properties.insert(
            decl.path.to_string(),
            PublishedProperty {
                value: decl.initial.clone(),
                text: text.to_string(),
                writeable: decl.writeable,
            },
        );
        debug!(service = %self.service_name, path = decl.path, "Declared property");
        Ok(())
    }

    fn publish(
        &mut self,
        path: &str,
        value: &PropertyValue,
        text: &str,
    ) -> Result<(), PropertyBusError> {
        let mut properties = self.lock();
        let property = properties
            .get_mut(path)
            .ok_or_else(|| PropertyBusError::Undeclared(path.to_string()))?;
        if property.value != *value {
            info!(path, value = %text, "Property changed");
        }
        property.value = value.clone();
        property.text = text.to_string();
        Ok(())
    }
}
