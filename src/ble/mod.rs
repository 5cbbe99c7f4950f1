//! BLE communication module.
//!
//! This module provides the session-transport layer for talking to a
//! CometBlue thermostat: locating and connecting to the peripheral,
//! PIN authentication, and handle-addressed characteristic access.

pub mod session;
pub mod transport;
pub mod uuids;

pub use session::BleSession;
pub use transport::{SessionState, Transport};
pub use uuids::*;
