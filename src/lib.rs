// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # cometblue-ble
//!
//! A cross-platform Rust library for communicating with Eurotronic
//! CometBlue radiator thermostats via Bluetooth Low Energy.
//!
//! The same firmware ships under several brands (THERMy Blue, Sygonix,
//! Xavax); all of them speak the protocol implemented here.
//!
//! ## Features
//!
//! - **PIN-authenticated sessions**: connect and unlock the device's
//!   characteristics in one step
//! - **Temperature state**: read current temperature, manual setpoint,
//!   schedule bounds, offset and window-open parameters in one snapshot
//! - **Deferred setpoint writes**: stage a new manual setpoint locally and
//!   flush it on the next update cycle
//! - **Availability tracking**: transient device problems degrade to a
//!   stale-but-readable state instead of errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cometblue_ble::{CometBlue, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // PIN 0 is the factory default.
//!     let mut thermostat = CometBlue::new("11:22:33:44:55:66", 0).await?;
//!
//!     // One update cycle: connect, authenticate, read, disconnect.
//!     thermostat.update().await?;
//!
//!     if let Some(current) = thermostat.current_temperature() {
//!         println!("Current temperature: {:.1}°C", current);
//!     }
//!
//!     // Stage a new setpoint; the next update writes it to the device.
//!     thermostat.set_target_temperature(21.0);
//!     thermostat.update().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Peripherals are addressed by platform
//! UUID rather than MAC address. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for protocol data types

// Public modules
pub mod ble;
pub mod error;
pub mod protocol;
pub mod thermostat;

// Re-exports for convenience
pub use error::{Error, Result};
pub use thermostat::{CometBlue, MAX_TARGET_TEMPERATURE, MIN_TARGET_TEMPERATURE};

// Re-export commonly used types from submodules
pub use ble::session::BleSession;
pub use ble::transport::{SessionState, Transport};
pub use ble::uuids::{Handle, PIN_HANDLE, TEMPERATURE_HANDLE};
pub use protocol::{CodecError, HalfDegrees, TemperatureRecord};
