//! Session transport abstraction.
//!
//! The thermostat client drives one update cycle through this trait, which
//! keeps the state machine testable without Bluetooth hardware. The
//! production implementation is [`crate::ble::session::BleSession`].

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::ble::uuids::Handle;
use crate::error::Result;

/// Lifecycle state of the physical link to one thermostat.
///
/// There is no authenticated state: the PIN write that follows a
/// successful connection causes no transition, and authentication success
/// is only observable through the outcome of the next read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No link to the thermostat.
    #[default]
    Disconnected,
    /// Currently attempting to establish the link.
    Connecting,
    /// Link established; characteristic access is possible.
    Connected,
}

impl SessionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in the transitional establishment state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// One physical BLE session to a thermostat.
///
/// Implementations are not safe for concurrent use; callers serialize
/// operations per device, which the `&mut self` receivers enforce.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send {
    /// Establish the link and authenticate.
    ///
    /// Retries a failed connection attempt before giving up. After the
    /// link is up the PIN is written to the authentication characteristic;
    /// a failed PIN write is logged but not fatal here, since the next
    /// characteristic access surfaces the rejection with the real error
    /// kind.
    async fn connect(&mut self) -> Result<()>;

    /// Read the raw bytes of a characteristic.
    ///
    /// Fails with [`crate::Error::AuthRejected`] when the device refuses
    /// the read for lack of authentication, distinct from generic I/O
    /// failure.
    async fn read_characteristic(&mut self, handle: Handle) -> Result<Vec<u8>>;

    /// Write raw bytes to a characteristic with acknowledged delivery.
    async fn write_characteristic(&mut self, handle: Handle, payload: &[u8]) -> Result<()>;

    /// Tear down the link unconditionally.
    ///
    /// Idempotent and best-effort: never fails observably, and leaves the
    /// session in [`SessionState::Disconnected`] from any state.
    async fn disconnect(&mut self);

    /// Get the current session state.
    fn state(&self) -> SessionState;
}
