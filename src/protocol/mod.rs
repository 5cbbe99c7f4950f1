//! Protocol module for encoding and decoding characteristic payloads.
//!
//! This module contains the implementations for:
//! - Temperature characteristic decoding and setpoint write construction
//! - Authentication PIN encoding
//!
//! Everything here is pure byte manipulation with no I/O; the transport
//! layer in [`crate::ble`] moves the payloads over the air.

pub mod pin;
pub mod temperature;

pub use pin::{encode_pin, PIN_PAYLOAD_LEN};
pub use temperature::{
    encode_setpoint_write, CodecError, HalfDegrees, TemperatureRecord, TEMPERATURE_PAYLOAD_LEN,
};
