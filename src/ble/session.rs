//! BLE session management.
//!
//! [`BleSession`] is the production [`Transport`]: it owns the physical
//! link to one thermostat, locating the peripheral on the adapter,
//! establishing the connection with a bounded retry, authenticating with
//! the PIN, and moving raw characteristic payloads.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use tracing::{debug, error, info, trace, warn};

use crate::ble::transport::{SessionState, Transport};
use crate::ble::uuids::{handle_for_uuid, Handle, PIN_HANDLE};
use crate::error::{Error, Result};
use crate::protocol::encode_pin;

/// btleplug-backed session transport for one CometBlue thermostat.
///
/// One instance manages exactly one peripheral, identified by its address
/// (MAC-like on Linux and Windows, platform UUID on macOS). The peripheral
/// handle is looked up lazily on the first connect and cached afterwards.
pub struct BleSession {
    /// The BLE adapter the peripheral lives on.
    adapter: Adapter,
    /// Address of the thermostat.
    address: String,
    /// PIN written to the authentication characteristic on every connect.
    pin: u32,
    /// Cached peripheral handle once located.
    peripheral: Option<Peripheral>,
    /// Protocol characteristics discovered on the current connection.
    characteristics: HashMap<Handle, Characteristic>,
    /// Current session state.
    state: SessionState,
    /// Extra connection attempts after the first failure.
    connect_retries: u32,
    /// How long the locate scan may run before giving up.
    discovery_timeout: Duration,
}

impl BleSession {
    /// Default number of extra connection attempts.
    pub const DEFAULT_CONNECT_RETRIES: u32 = 1;

    /// Default deadline for locating the peripheral by address.
    pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a session on the system's default Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new(address: impl Into<String>, pin: u32) -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter, address, pin))
    }

    /// Create a session on a specific adapter.
    pub fn with_adapter(adapter: Adapter, address: impl Into<String>, pin: u32) -> Self {
        Self {
            adapter,
            address: address.into(),
            pin,
            peripheral: None,
            characteristics: HashMap::new(),
            state: SessionState::Disconnected,
            connect_retries: Self::DEFAULT_CONNECT_RETRIES,
            discovery_timeout: Self::DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    /// Get the address this session is bound to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Set how many extra connection attempts follow a failed one.
    pub fn set_connect_retries(&mut self, retries: u32) {
        self.connect_retries = retries;
    }

    /// Set the deadline for the locate-by-address scan.
    pub fn set_discovery_timeout(&mut self, timeout: Duration) {
        self.discovery_timeout = timeout;
    }

    /// Check whether a peripheral is the one this session is bound to.
    fn matches(&self, peripheral: &Peripheral) -> bool {
        peripheral
            .address()
            .to_string()
            .eq_ignore_ascii_case(&self.address)
            || peripheral
                .id()
                .to_string()
                .eq_ignore_ascii_case(&self.address)
    }

    /// Find the peripheral for the configured address.
    ///
    /// Checks the adapter's peripheral cache first, then runs a bounded
    /// scan watching discovery events.
    async fn locate_peripheral(&self) -> Result<Peripheral> {
        for peripheral in self.adapter.peripherals().await.map_err(Error::Bluetooth)? {
            if self.matches(&peripheral) {
                debug!("Peripheral {} already known to the adapter", self.address);
                return Ok(peripheral);
            }
        }

        debug!("Scanning for thermostat {}", self.address);

        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        let found = tokio::time::timeout(self.discovery_timeout, async {
            while let Some(event) = events.next().await {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    _ => continue,
                };
                if let Ok(peripheral) = self.adapter.peripheral(&id).await {
                    if self.matches(&peripheral) {
                        return Some(peripheral);
                    }
                }
            }
            None
        })
        .await
        .unwrap_or(None);

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        found.ok_or_else(|| Error::DeviceNotFound {
            address: self.address.clone(),
        })
    }

    /// Cache the protocol characteristics from the discovered services.
    fn cache_characteristics(&mut self, peripheral: &Peripheral) {
        self.characteristics.clear();

        for service in peripheral.services() {
            for characteristic in service.characteristics {
                if let Some(handle) = handle_for_uuid(&characteristic.uuid) {
                    trace!(
                        "Found characteristic {} at handle {}",
                        characteristic.uuid,
                        handle
                    );
                    self.characteristics.insert(handle, characteristic);
                }
            }
        }

        debug!(
            "Cached {} protocol characteristics for {}",
            self.characteristics.len(),
            self.address
        );
    }

    /// Write the PIN to the authentication characteristic.
    ///
    /// A failure here is not fatal: the device only reveals a bad PIN by
    /// rejecting the next characteristic access, which carries the precise
    /// error kind.
    async fn authenticate(&self, peripheral: &Peripheral) {
        let payload = encode_pin(self.pin);

        let result = match self.characteristics.get(&PIN_HANDLE) {
            Some(characteristic) => peripheral
                .write(characteristic, &payload, WriteType::WithResponse)
                .await
                .map_err(classify_gatt_error),
            None => Err(Error::CharacteristicNotFound { handle: PIN_HANDLE }),
        };

        match result {
            Ok(()) => debug!("PIN written to {}", self.address),
            Err(e) => error!("Writing the PIN to {} failed: {}", self.address, e),
        }
    }
}

#[async_trait]
impl Transport for BleSession {
    async fn connect(&mut self) -> Result<()> {
        if self.state.is_connected() {
            debug!("Already connected to {}", self.address);
            return Ok(());
        }

        self.state = SessionState::Connecting;

        let peripheral = match self.peripheral.clone() {
            Some(peripheral) => peripheral,
            None => {
                let located = self.locate_peripheral().await;
                match located {
                    Ok(peripheral) => {
                        self.peripheral = Some(peripheral.clone());
                        peripheral
                    }
                    Err(e) => {
                        self.state = SessionState::Disconnected;
                        return Err(e);
                    }
                }
            }
        };

        if !peripheral.is_connected().await.unwrap_or(false) {
            let attempts = self.connect_retries + 1;
            let mut connected = false;

            for attempt in 1..=attempts {
                debug!(
                    "Connection attempt {} of {} to {}",
                    attempt, attempts, self.address
                );

                match peripheral.connect().await {
                    Ok(()) => {
                        connected = true;
                        break;
                    }
                    Err(e) => {
                        warn!(
                            "Connection attempt {} to {} failed: {}",
                            attempt, self.address, e
                        );
                    }
                }
            }

            if !connected {
                self.state = SessionState::Disconnected;
                return Err(Error::ConnectionFailed {
                    reason: format!("no connection after {attempts} attempts"),
                });
            }
        }

        if let Err(e) = peripheral.discover_services().await {
            warn!("Failed to discover services on {}: {}", self.address, e);
        }

        self.cache_characteristics(&peripheral);
        self.state = SessionState::Connected;
        info!("Connected to thermostat {}", self.address);

        self.authenticate(&peripheral).await;

        Ok(())
    }

    async fn read_characteristic(&mut self, handle: Handle) -> Result<Vec<u8>> {
        if !self.state.is_connected() {
            return Err(Error::NotConnected);
        }
        let peripheral = self.peripheral.as_ref().ok_or(Error::NotConnected)?;

        let characteristic = self
            .characteristics
            .get(&handle)
            .ok_or(Error::CharacteristicNotFound { handle })?;

        let data = peripheral
            .read(characteristic)
            .await
            .map_err(classify_gatt_error)?;

        trace!("Read {} bytes from handle {}", data.len(), handle);

        Ok(data)
    }

    async fn write_characteristic(&mut self, handle: Handle, payload: &[u8]) -> Result<()> {
        if !self.state.is_connected() {
            return Err(Error::NotConnected);
        }
        let peripheral = self.peripheral.as_ref().ok_or(Error::NotConnected)?;

        let characteristic = self
            .characteristics
            .get(&handle)
            .ok_or(Error::CharacteristicNotFound { handle })?;

        peripheral
            .write(characteristic, payload, WriteType::WithResponse)
            .await
            .map_err(classify_gatt_error)?;

        trace!("Wrote {} bytes to handle {}", payload.len(), handle);

        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }

        self.state = SessionState::Disconnected;
        self.characteristics.clear();

        if let Some(peripheral) = &self.peripheral {
            match peripheral.disconnect().await {
                Ok(()) => debug!("Disconnected from {}", self.address),
                Err(e) => warn!("Failed to disconnect from {} cleanly: {}", self.address, e),
            }
        }
    }

    fn state(&self) -> SessionState {
        self.state
    }
}

/// Map a BLE stack error onto the crate error, pulling authentication
/// rejections out as their own kind.
fn classify_gatt_error(err: btleplug::Error) -> Error {
    if is_auth_rejection(&err) {
        Error::AuthRejected
    } else {
        Error::Bluetooth(err)
    }
}

/// Check whether a BLE stack error is the device refusing access for lack
/// of authentication.
///
/// Backends differ: some report a dedicated permission error, others relay
/// the ATT insufficient-authentication status as a message string.
fn is_auth_rejection(err: &btleplug::Error) -> bool {
    match err {
        btleplug::Error::PermissionDenied { .. } => true,
        btleplug::Error::RuntimeError(message) => mentions_auth(message),
        btleplug::Error::Other(other) => mentions_auth(&other.to_string()),
        _ => false,
    }
}

fn mentions_auth(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("authent")
        || message.contains("insufficient")
        || message.contains("not permitted")
}
