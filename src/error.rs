//! Error types for the cometblue-ble crate.

use thiserror::Error;

use crate::ble::uuids::Handle;
use crate::protocol::CodecError;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No peripheral with the configured address was found.
    #[error("Thermostat not found: {address}")]
    DeviceNotFound {
        /// The address that was searched for.
        address: String,
    },

    /// Failed to establish a connection to the thermostat.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Operation requires a connection but no session is open.
    #[error("Not connected to the thermostat")]
    NotConnected,

    /// The device rejected an operation for lack of authentication.
    ///
    /// The thermostat answers reads and writes with an insufficient
    /// authentication error until the correct PIN has been written on the
    /// current connection. Kept distinct from [`Error::Bluetooth`] so the
    /// client can tell a wrong PIN from a flaky link.
    #[error("Operation rejected: device requires authentication (wrong PIN?)")]
    AuthRejected,

    /// Characteristic for a protocol handle was not found on the device.
    #[error("Characteristic not found for handle {handle}")]
    CharacteristicNotFound {
        /// The protocol handle that could not be resolved.
        handle: Handle,
    },

    /// A characteristic payload could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
