//! BLE Service and Characteristic UUIDs and protocol handles.
//!
//! The CometBlue attribute table is fixed in firmware, so the protocol is
//! traditionally described in terms of ATT handles (the PIN lives at
//! `0x48`, the temperatures at `0x3D`). The host BLE stack addresses
//! characteristics by UUID instead, so this module also carries the
//! handle-to-UUID mapping the transport resolves reads and writes through.

use std::fmt;

use uuid::Uuid;

// CometBlue custom service (Eurotronic)
/// CometBlue thermostat service UUID.
pub const COMETBLUE_SERVICE_UUID: Uuid = Uuid::from_u128(0x47e9_ee00_47e9_11e4_8939_164230d1df67);
/// Temperatures characteristic UUID (Read, Write) — handle `0x3D`.
pub const TEMPERATURES_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x47e9_ee2b_47e9_11e4_8939_164230d1df67);
/// PIN/authentication characteristic UUID (Write) — handle `0x48`.
pub const PIN_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x47e9_ee30_47e9_11e4_8939_164230d1df67);

/// The numeric address of a characteristic in the device attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u16);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Handle of the PIN/authentication characteristic.
pub const PIN_HANDLE: Handle = Handle(0x48);
/// Handle of the temperatures characteristic.
pub const TEMPERATURE_HANDLE: Handle = Handle(0x3D);

/// Fixed handle-to-UUID attribute table for the characteristics this
/// driver touches.
const ATTRIBUTE_TABLE: [(Handle, Uuid); 2] = [
    (PIN_HANDLE, PIN_CHARACTERISTIC_UUID),
    (TEMPERATURE_HANDLE, TEMPERATURES_CHARACTERISTIC_UUID),
];

/// Resolve a protocol handle to its characteristic UUID.
pub fn uuid_for_handle(handle: Handle) -> Option<Uuid> {
    ATTRIBUTE_TABLE
        .iter()
        .find(|(h, _)| *h == handle)
        .map(|(_, uuid)| *uuid)
}

/// Resolve a characteristic UUID back to its protocol handle.
pub fn handle_for_uuid(uuid: &Uuid) -> Option<Handle> {
    ATTRIBUTE_TABLE
        .iter()
        .find(|(_, u)| u == uuid)
        .map(|(handle, _)| *handle)
}

/// Check if a service UUID is the CometBlue custom service.
pub fn is_cometblue_service(uuid: &Uuid) -> bool {
    *uuid == COMETBLUE_SERVICE_UUID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        let service = COMETBLUE_SERVICE_UUID.to_string();
        assert!(service.starts_with("47e9ee00"));

        let temperatures = TEMPERATURES_CHARACTERISTIC_UUID.to_string();
        assert!(temperatures.starts_with("47e9ee2b"));

        let pin = PIN_CHARACTERISTIC_UUID.to_string();
        assert!(pin.starts_with("47e9ee30"));
    }

    #[test]
    fn test_uuid_for_handle() {
        assert_eq!(uuid_for_handle(PIN_HANDLE), Some(PIN_CHARACTERISTIC_UUID));
        assert_eq!(
            uuid_for_handle(TEMPERATURE_HANDLE),
            Some(TEMPERATURES_CHARACTERISTIC_UUID)
        );
        assert_eq!(uuid_for_handle(Handle(0x01)), None);
    }

    #[test]
    fn test_handle_for_uuid() {
        assert_eq!(handle_for_uuid(&PIN_CHARACTERISTIC_UUID), Some(PIN_HANDLE));
        assert_eq!(
            handle_for_uuid(&TEMPERATURES_CHARACTERISTIC_UUID),
            Some(TEMPERATURE_HANDLE)
        );
        assert_eq!(handle_for_uuid(&COMETBLUE_SERVICE_UUID), None);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(format!("{}", PIN_HANDLE), "0x0048");
        assert_eq!(format!("{}", TEMPERATURE_HANDLE), "0x003d");
    }

    #[test]
    fn test_is_cometblue_service() {
        assert!(is_cometblue_service(&COMETBLUE_SERVICE_UUID));
        assert!(!is_cometblue_service(&TEMPERATURES_CHARACTERISTIC_UUID));
    }
}
