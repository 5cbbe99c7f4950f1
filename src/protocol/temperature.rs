//! Temperature characteristic payload encoding and decoding.
//!
//! The thermostat exposes its whole temperature state as a single 7-byte
//! characteristic of signed bytes, in this fixed field order:
//!
//! 1. current temperature (half-degrees)
//! 2. manual-mode setpoint (half-degrees)
//! 3. scheduled target, low bound (half-degrees)
//! 4. scheduled target, high bound (half-degrees)
//! 5. calibration offset (half-degrees)
//! 6. window-open detection sensitivity (raw)
//! 7. window-open duration in minutes (raw)
//!
//! Write payloads reuse the same layout; a field set to
//! [`HalfDegrees::UNCHANGED`] tells the firmware to leave that slot as-is.

use thiserror::Error;

/// Length of the temperature characteristic payload in bytes.
pub const TEMPERATURE_PAYLOAD_LEN: usize = 7;

/// Errors produced while encoding or decoding characteristic payloads.
///
/// These indicate protocol drift or misuse rather than transient
/// connectivity problems, and are surfaced to callers instead of being
/// absorbed into the availability flag.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CodecError {
    /// The payload length did not match the characteristic's fixed layout.
    #[error("unexpected temperature payload length: got {actual} bytes, expected {expected}")]
    WrongLength {
        /// The length the layout requires.
        expected: usize,
        /// The length actually received.
        actual: usize,
    },

    /// A temperature does not fit the device's signed half-degree encoding.
    #[error("temperature {celsius}°C is outside the encodable range")]
    OutOfRange {
        /// The temperature that failed to encode.
        celsius: f64,
    },
}

/// A temperature in the device's native unit: signed half-degrees Celsius.
///
/// The firmware stores every temperature as one signed byte worth half a
/// degree, so `41` means 20.5 °C and `-3` means -1.5 °C.
///
/// # Example
///
/// ```
/// use cometblue_ble::protocol::HalfDegrees;
///
/// let setpoint = HalfDegrees::from_celsius(20.5).unwrap();
/// assert_eq!(setpoint.raw_value(), 41);
/// assert_eq!(setpoint.to_celsius(), 20.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HalfDegrees(pub i8);

impl HalfDegrees {
    /// Sentinel raw value meaning "leave this field unchanged".
    ///
    /// Only meaningful in write payloads: the firmware skips any slot set
    /// to this value. Decoded records never use it for a real temperature.
    pub const UNCHANGED: Self = Self(-128);

    /// Encode a Celsius value, rounding to the nearest half degree.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::OutOfRange`] if the rounded value does not fit
    /// a signed byte. The device's operational setpoint limits (8–28 °C)
    /// are a policy of the calling layer and are not checked here.
    pub fn from_celsius(celsius: f64) -> Result<Self, CodecError> {
        let raw = (celsius * 2.0).round();
        if !(f64::from(i8::MIN)..=f64::from(i8::MAX)).contains(&raw) {
            return Err(CodecError::OutOfRange { celsius });
        }
        Ok(Self(raw as i8))
    }

    /// Convert back to degrees Celsius.
    pub fn to_celsius(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// Check whether this is the "leave unchanged" sentinel.
    pub fn is_unchanged(self) -> bool {
        self == Self::UNCHANGED
    }

    /// Get the raw signed byte value.
    pub fn raw_value(self) -> i8 {
        self.0
    }
}

/// Decoded snapshot of the temperature characteristic.
///
/// Fields appear in wire order. The window-open fields are not
/// temperatures and are passed through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemperatureRecord {
    /// Sensor-measured current temperature.
    pub current_temperature: HalfDegrees,
    /// Manual-mode target temperature.
    pub manual_setpoint: HalfDegrees,
    /// Lower scheduled target temperature.
    pub target_low: HalfDegrees,
    /// Upper scheduled target temperature.
    pub target_high: HalfDegrees,
    /// Calibration offset applied by the firmware.
    pub offset: HalfDegrees,
    /// Window-open detection sensitivity.
    pub window_open_sensitivity: i8,
    /// Minutes the valve stays closed after a detected open window.
    pub window_open_minutes: i8,
}

impl TemperatureRecord {
    /// Decode a temperature characteristic payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::WrongLength`] unless `data` is exactly
    /// [`TEMPERATURE_PAYLOAD_LEN`] bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use cometblue_ble::protocol::TemperatureRecord;
    ///
    /// let record = TemperatureRecord::decode(&[42, 41, 32, 42, 0, 12, 10]).unwrap();
    /// assert_eq!(record.current_temperature.to_celsius(), 21.0);
    /// assert_eq!(record.manual_setpoint.to_celsius(), 20.5);
    /// ```
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() != TEMPERATURE_PAYLOAD_LEN {
            return Err(CodecError::WrongLength {
                expected: TEMPERATURE_PAYLOAD_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            current_temperature: HalfDegrees(data[0] as i8),
            manual_setpoint: HalfDegrees(data[1] as i8),
            target_low: HalfDegrees(data[2] as i8),
            target_high: HalfDegrees(data[3] as i8),
            offset: HalfDegrees(data[4] as i8),
            window_open_sensitivity: data[5] as i8,
            window_open_minutes: data[6] as i8,
        })
    }

    /// Encode this record back into the characteristic layout.
    pub fn to_bytes(&self) -> [u8; TEMPERATURE_PAYLOAD_LEN] {
        [
            self.current_temperature.0 as u8,
            self.manual_setpoint.0 as u8,
            self.target_low.0 as u8,
            self.target_high.0 as u8,
            self.offset.0 as u8,
            self.window_open_sensitivity as u8,
            self.window_open_minutes as u8,
        ]
    }
}

/// Build a write payload that changes only the manual-mode setpoint.
///
/// Every other slot carries [`HalfDegrees::UNCHANGED`] so the firmware
/// keeps its current values regardless of what they are, which is why a
/// setpoint write never needs to know the rest of the record.
pub fn encode_setpoint_write(setpoint: HalfDegrees) -> [u8; TEMPERATURE_PAYLOAD_LEN] {
    let mut payload = [HalfDegrees::UNCHANGED.0 as u8; TEMPERATURE_PAYLOAD_LEN];
    payload[1] = setpoint.0 as u8;
    payload
}
