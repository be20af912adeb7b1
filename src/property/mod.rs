//! Property service collaborator
//!
//! The bridge exposes its state as a fixed set of named, typed properties.
//! How those properties reach the consumer (D-Bus on Venus OS, an in-process
//! store in tests) is hidden behind [`PropertyBus`]. Externally initiated
//! writes travel the other way as [`crate::bridge::BridgeEvent::PropertyWrite`]
//! events so that a single task owns all property mutation.

use crate::bridge::properties::{PropertyDecl, PropertyValue};
use thiserror::Error;

pub mod local;

pub use local::{LocalPropertyBus, PublishedProperty};

/// Errors reported by a property service
#[derive(Debug, Error, PartialEq)]
pub enum PropertyBusError {
    #[error("Property already declared: {0}")]
    AlreadyDeclared(String),

    #[error("Property not declared: {0}")]
    Undeclared(String),

    #[error("Property service unavailable: {0}")]
    Unavailable(String),
}

/// Outbound half of the property service
///
/// Implementations must not block: both methods are called from the bridge
/// event loop.
pub trait PropertyBus: Send {
    /// Register one property with its initial value and text form
    fn declare(&mut self, decl: &PropertyDecl, text: &str) -> Result<(), PropertyBusError>;

    /// Publish a changed value and notify subscribers
    fn publish(
        &mut self,
        path: &str,
        value: &PropertyValue,
        text: &str,
    ) -> Result<(), PropertyBusError>;
}
