//! Testing utilities and mock implementations
//!
//! Mocks for the bridge's collaborators so the translation engine can be
//! tested without an MQTT broker or a real property service.

pub mod mocks;

pub use mocks::*;
