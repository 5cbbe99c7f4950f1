//! Thermostat client.
//!
//! [`CometBlue`] wraps one session transport and exposes the thermostat's
//! decoded state. All I/O happens inside [`CometBlue::update`]; between
//! updates the accessors serve the cached snapshot, and a new setpoint is
//! staged locally until the next update flushes it to the device.

use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::ble::session::BleSession;
use crate::ble::transport::{SessionState, Transport};
use crate::ble::uuids::TEMPERATURE_HANDLE;
use crate::error::{Error, Result};
use crate::protocol::{encode_setpoint_write, HalfDegrees, TemperatureRecord};

/// Lowest manual setpoint the thermostat accepts, in degrees Celsius.
///
/// Operational limits are enforced by the calling layer, not by this
/// client or the codec.
pub const MIN_TARGET_TEMPERATURE: f64 = 8.0;

/// Highest manual setpoint the thermostat accepts, in degrees Celsius.
pub const MAX_TARGET_TEMPERATURE: f64 = 28.0;

/// Client for one CometBlue thermostat.
///
/// The client owns a [`Transport`] for the physical link and keeps the
/// last decoded [`TemperatureRecord`], an availability flag, and the
/// staged setpoint. One full device interaction is one [`update`] call:
/// connect, settle, read, flush a staged setpoint if any, disconnect.
///
/// Callers serialize updates per device; the `&mut self` receiver
/// enforces this, and the client performs no internal locking or
/// concurrency.
///
/// [`update`]: CometBlue::update
pub struct CometBlue<T = BleSession> {
    /// Address of the thermostat, for log context.
    address: String,
    /// Session transport for the physical link.
    transport: T,
    /// Pause after connect before the first characteristic access.
    settle_delay: Duration,
    /// Last successfully decoded snapshot.
    record: Option<TemperatureRecord>,
    /// Setpoint staged by the caller, not yet flushed to the device.
    pending_setpoint: Option<f64>,
    /// Whether the last update reached the device.
    available: bool,
    /// Locally cached manual-mode flag; never written to the device.
    manual_mode: bool,
}

impl CometBlue {
    /// Create a client for a thermostat on the default Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available. The device itself
    /// is not contacted until the first [`CometBlue::update`].
    pub async fn new(address: impl Into<String>, pin: u32) -> Result<Self> {
        let address = address.into();
        let session = BleSession::new(address.clone(), pin).await?;
        Ok(Self::with_transport(address, session))
    }
}

impl<T: Transport> CometBlue<T> {
    /// Default pause between connecting and the first characteristic
    /// access, giving the peripheral's GATT server time to become ready.
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

    /// Create a client over an existing transport.
    pub fn with_transport(address: impl Into<String>, transport: T) -> Self {
        Self {
            address: address.into(),
            transport,
            settle_delay: Self::DEFAULT_SETTLE_DELAY,
            record: None,
            pending_setpoint: None,
            available: false,
            manual_mode: false,
        }
    }

    /// Get the address of the thermostat.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Set the post-connect settle delay.
    pub fn set_settle_delay(&mut self, delay: Duration) {
        self.settle_delay = delay;
    }

    /// Whether the last update reached the device.
    ///
    /// When `false`, the temperature accessors keep serving the previous
    /// snapshot so callers can tell "known but stale" from "never known".
    pub fn available(&self) -> bool {
        self.available
    }

    /// Get the current state of the underlying session.
    pub fn session_state(&self) -> SessionState {
        self.transport.state()
    }

    /// Sensor-measured current temperature in degrees Celsius.
    ///
    /// `None` until a record has been decoded at least once.
    pub fn current_temperature(&self) -> Option<f64> {
        self.record.map(|r| r.current_temperature.to_celsius())
    }

    /// Manual-mode target temperature in degrees Celsius.
    ///
    /// Reflects the device's value from the last read, or the value of the
    /// last successful setpoint write.
    pub fn target_temperature(&self) -> Option<f64> {
        self.record.map(|r| r.manual_setpoint.to_celsius())
    }

    /// Stage a new manual-mode setpoint in degrees Celsius.
    ///
    /// Performs no I/O: the value is written to the device during the next
    /// [`CometBlue::update`]. Staging again before that overwrites the
    /// previous value.
    pub fn set_target_temperature(&mut self, celsius: f64) {
        debug!("Staging setpoint {} for {}", celsius, self.address);
        self.pending_setpoint = Some(celsius);
    }

    /// Get the staged setpoint, if one is waiting to be flushed.
    pub fn pending_target_temperature(&self) -> Option<f64> {
        self.pending_setpoint
    }

    /// Get the locally cached manual-mode flag.
    pub fn manual_mode(&self) -> bool {
        self.manual_mode
    }

    /// Set the locally cached manual-mode flag.
    ///
    /// Presentation state only; the device is not informed.
    pub fn set_manual_mode(&mut self, manual: bool) {
        self.manual_mode = manual;
    }

    /// Whether a record has been decoded at least once.
    ///
    /// Callers use this as one of their refresh triggers; the other,
    /// elapsed wall-clock time, is caller-owned.
    pub fn should_update(&self) -> bool {
        self.record.is_some()
    }

    /// Get the full decoded snapshot from the last successful read.
    pub fn record(&self) -> Option<TemperatureRecord> {
        self.record
    }

    /// Run one full update cycle.
    ///
    /// Connects, waits for the settle delay, reads and decodes the
    /// temperature characteristic, flushes a staged setpoint if one
    /// exists, and disconnects. Once the connection is up, disconnect is
    /// guaranteed to run before this returns, whatever happens in between.
    ///
    /// # Errors
    ///
    /// Connection failures and codec errors propagate. Authentication
    /// rejections and read I/O failures are absorbed: the client flips
    /// [`CometBlue::available`] to `false`, keeps the previous snapshot,
    /// and returns `Ok(())`. A failed setpoint write keeps the value
    /// staged for the next cycle.
    pub async fn update(&mut self) -> Result<()> {
        debug!("Connecting to thermostat {}", self.address);
        self.transport.connect().await?;

        tokio::time::sleep(self.settle_delay).await;

        let outcome = self.refresh().await;

        self.transport.disconnect().await;
        debug!("Disconnected from thermostat {}", self.address);

        match outcome {
            Ok(()) => Ok(()),
            Err(Error::AuthRejected) => {
                self.available = false;
                error!(
                    "Can't read thermostat data ({}). Did you set the correct PIN?",
                    self.address
                );
                Ok(())
            }
            Err(e @ Error::Codec(_)) => Err(e),
            Err(e) => {
                self.available = false;
                warn!("Reading thermostat {} failed: {}", self.address, e);
                Ok(())
            }
        }
    }

    /// Read and decode the temperature characteristic, then flush any
    /// staged setpoint.
    async fn refresh(&mut self) -> Result<()> {
        let data = self
            .transport
            .read_characteristic(TEMPERATURE_HANDLE)
            .await?;
        let record = TemperatureRecord::decode(&data)?;

        trace!("Decoded record for {}: {:?}", self.address, record);

        self.record = Some(record);
        self.available = true;

        self.flush_pending().await
    }

    /// Write the staged setpoint, if any.
    ///
    /// Runs only after a successful read: the write payload carries the
    /// unchanged sentinel in every other slot, so the device keeps the
    /// rest of its state regardless of what was just read.
    async fn flush_pending(&mut self) -> Result<()> {
        if let Some(celsius) = self.pending_setpoint {
            let setpoint = HalfDegrees::from_celsius(celsius)?;
            let payload = encode_setpoint_write(setpoint);

            match self
                .transport
                .write_characteristic(TEMPERATURE_HANDLE, &payload)
                .await
            {
                Ok(()) => {
                    self.pending_setpoint = None;
                    if let Some(record) = self.record.as_mut() {
                        record.manual_setpoint = setpoint;
                    }
                    info!("Updated setpoint of {} to {}", self.address, celsius);
                }
                Err(Error::AuthRejected) => {
                    self.available = false;
                    error!(
                        "Setpoint write to {} rejected, keeping it staged. Did you set the correct PIN?",
                        self.address
                    );
                }
                Err(e) => {
                    warn!(
                        "Writing setpoint to {} failed, keeping it staged: {}",
                        self.address, e
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::transport::MockTransport;
    use crate::protocol::CodecError;
    use mockall::predicate::eq;
    use mockall::Sequence;

    const ADDRESS: &str = "11:22:33:44:55:66";

    /// Payload decoding to current 21.0, manual setpoint 20.5.
    const DEVICE_STATE: [u8; 7] = [42, 41, 32, 42, 0, 12, 10];

    fn client_with(mock: MockTransport) -> CometBlue<MockTransport> {
        let mut client = CometBlue::with_transport(ADDRESS, mock);
        client.set_settle_delay(Duration::ZERO);
        client
    }

    #[tokio::test]
    async fn test_update_reads_and_caches_state() {
        let mut mock = MockTransport::new();
        let mut seq = Sequence::new();
        mock.expect_connect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        mock.expect_read_characteristic()
            .with(eq(TEMPERATURE_HANDLE))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(DEVICE_STATE.to_vec()));
        mock.expect_disconnect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| ());

        let mut client = client_with(mock);
        assert!(!client.should_update());
        assert_eq!(client.current_temperature(), None);

        client.update().await.unwrap();

        assert!(client.available());
        assert!(client.should_update());
        assert_eq!(client.current_temperature(), Some(21.0));
        assert_eq!(client.target_temperature(), Some(20.5));
    }

    #[tokio::test]
    async fn test_auth_rejection_keeps_cached_state() {
        let mut mock = MockTransport::new();
        mock.expect_connect().times(2).returning(|| Ok(()));
        let mut reads = 0;
        mock.expect_read_characteristic()
            .times(2)
            .returning(move |_| {
                reads += 1;
                if reads == 1 {
                    Ok(DEVICE_STATE.to_vec())
                } else {
                    Err(Error::AuthRejected)
                }
            });
        mock.expect_disconnect().times(2).returning(|| ());

        let mut client = client_with(mock);
        client.update().await.unwrap();
        assert!(client.available());

        // The rejection is absorbed, not surfaced as an error.
        client.update().await.unwrap();

        assert!(!client.available());
        assert_eq!(client.current_temperature(), Some(21.0));
        assert_eq!(client.target_temperature(), Some(20.5));
    }

    #[tokio::test]
    async fn test_read_io_failure_marks_unavailable() {
        let mut mock = MockTransport::new();
        mock.expect_connect().times(1).returning(|| Ok(()));
        mock.expect_read_characteristic()
            .times(1)
            .returning(|_| Err(Error::Bluetooth(btleplug::Error::NotConnected)));
        mock.expect_disconnect().times(1).returning(|| ());

        let mut client = client_with(mock);
        client.update().await.unwrap();

        assert!(!client.available());
        assert_eq!(client.current_temperature(), None);
    }

    #[tokio::test]
    async fn test_staged_setpoint_flushes_after_read() {
        let mut mock = MockTransport::new();
        let mut seq = Sequence::new();
        mock.expect_connect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        mock.expect_read_characteristic()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(DEVICE_STATE.to_vec()));
        mock.expect_write_characteristic()
            .withf(|handle, payload| {
                // 19.5 degrees = raw 39, sentinel everywhere else.
                *handle == TEMPERATURE_HANDLE
                    && payload == [0x80, 39, 0x80, 0x80, 0x80, 0x80, 0x80]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_disconnect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| ());

        let mut client = client_with(mock);
        client.set_target_temperature(19.5);
        assert_eq!(client.pending_target_temperature(), Some(19.5));

        client.update().await.unwrap();

        assert_eq!(client.pending_target_temperature(), None);
        // The cached record reflects the just-written value.
        assert_eq!(client.target_temperature(), Some(19.5));
        assert_eq!(client.current_temperature(), Some(21.0));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_setpoint_staged() {
        let mut mock = MockTransport::new();
        mock.expect_connect().times(1).returning(|| Ok(()));
        mock.expect_read_characteristic()
            .times(1)
            .returning(|_| Ok(DEVICE_STATE.to_vec()));
        mock.expect_write_characteristic()
            .times(1)
            .returning(|_, _| Err(Error::Bluetooth(btleplug::Error::NotConnected)));
        mock.expect_disconnect().times(1).returning(|| ());

        let mut client = client_with(mock);
        client.set_target_temperature(19.5);

        client.update().await.unwrap();

        // Still available (the read succeeded), value staged for retry.
        assert!(client.available());
        assert_eq!(client.pending_target_temperature(), Some(19.5));
        assert_eq!(client.target_temperature(), Some(20.5));
    }

    #[tokio::test]
    async fn test_connect_failure_propagates() {
        let mut mock = MockTransport::new();
        mock.expect_connect().times(1).returning(|| {
            Err(Error::ConnectionFailed {
                reason: "no connection after 2 attempts".to_string(),
            })
        });
        mock.expect_disconnect().times(0);
        mock.expect_state()
            .return_const(SessionState::Disconnected);

        let mut client = client_with(mock);
        let err = client.update().await.unwrap_err();

        assert!(matches!(err, Error::ConnectionFailed { .. }));
        assert!(!client.available());
        // The transport never left the disconnected state.
        assert_eq!(client.session_state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_malformed_payload_propagates_codec_error() {
        let mut mock = MockTransport::new();
        let mut seq = Sequence::new();
        mock.expect_connect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        mock.expect_read_characteristic()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![42, 41, 32, 42, 0]));
        // Disconnect still runs before the error surfaces.
        mock.expect_disconnect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| ());

        let mut client = client_with(mock);
        let err = client.update().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Codec(CodecError::WrongLength {
                expected: 7,
                actual: 5
            })
        ));
        assert!(!client.available());
    }

    #[tokio::test]
    async fn test_unencodable_setpoint_propagates_codec_error() {
        let mut mock = MockTransport::new();
        mock.expect_connect().times(1).returning(|| Ok(()));
        mock.expect_read_characteristic()
            .times(1)
            .returning(|_| Ok(DEVICE_STATE.to_vec()));
        mock.expect_disconnect().times(1).returning(|| ());

        let mut client = client_with(mock);
        client.set_target_temperature(200.0);

        let err = client.update().await.unwrap_err();

        assert!(matches!(err, Error::Codec(CodecError::OutOfRange { .. })));
        assert_eq!(client.pending_target_temperature(), Some(200.0));
    }

    #[test]
    fn test_staging_overwrites_previous_value() {
        let mut client = CometBlue::with_transport(ADDRESS, MockTransport::new());

        client.set_target_temperature(19.5);
        client.set_target_temperature(21.0);

        assert_eq!(client.pending_target_temperature(), Some(21.0));
    }

    #[test]
    fn test_manual_mode_is_local_only() {
        let mut client = CometBlue::with_transport(ADDRESS, MockTransport::new());

        assert!(!client.manual_mode());
        client.set_manual_mode(true);
        assert!(client.manual_mode());
        client.set_manual_mode(false);
        assert!(!client.manual_mode());
    }
}
