//! openWB MQTT protocol vocabulary
//!
//! Field identifiers published by the charge point and the topic namespace
//! they live in. Nothing in here performs I/O.

pub mod fields;
pub mod topics;

pub use fields::*;
pub use topics::*;
