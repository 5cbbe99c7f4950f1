//! Authentication PIN payload.
//!
//! The thermostat gates characteristic access behind a numeric PIN that
//! must be rewritten on every new connection. Until a valid PIN has been
//! written, reads and writes are answered with an insufficient
//! authentication error.

/// Length of the PIN characteristic payload in bytes.
pub const PIN_PAYLOAD_LEN: usize = 4;

/// Encode a PIN for the authentication characteristic.
///
/// The device expects the PIN as an unsigned 32-bit little-endian value.
/// Factory default is `0`.
///
/// # Example
///
/// ```
/// use cometblue_ble::protocol::encode_pin;
///
/// assert_eq!(encode_pin(0), [0, 0, 0, 0]);
/// assert_eq!(encode_pin(1234), [0xD2, 0x04, 0, 0]);
/// ```
pub fn encode_pin(pin: u32) -> [u8; PIN_PAYLOAD_LEN] {
    pin.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pin_little_endian() {
        assert_eq!(encode_pin(0), [0, 0, 0, 0]);
        assert_eq!(encode_pin(1), [1, 0, 0, 0]);
        assert_eq!(encode_pin(0x0102_0304), [4, 3, 2, 1]);
        assert_eq!(encode_pin(u32::MAX), [0xFF, 0xFF, 0xFF, 0xFF]);
    }
}
