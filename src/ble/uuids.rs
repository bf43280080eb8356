//! BLE identifiers used by Inkbird sensors.

use uuid::Uuid;

/// Inkbird's Bluetooth company identifier as seen in ITH-11-B advertisements.
pub const INKBIRD_MANUFACTURER_ID: u16 = 9545;

/// Vendor service advertised by Inkbird sensors (16-bit `0xFFF0`).
pub const INKBIRD_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_fff0_0000_1000_8000_00805f9b34fb);

/// Check if a service UUID is the Inkbird vendor service.
pub fn is_inkbird_service(uuid: &Uuid) -> bool {
    *uuid == INKBIRD_SERVICE_UUID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_uuid_format() {
        assert_eq!(
            INKBIRD_SERVICE_UUID.to_string(),
            "0000fff0-0000-1000-8000-00805f9b34fb"
        );
        assert!(is_inkbird_service(&INKBIRD_SERVICE_UUID));
        assert!(!is_inkbird_service(&Uuid::nil()));
    }

    #[test]
    fn test_manufacturer_id() {
        assert_eq!(INKBIRD_MANUFACTURER_ID, 0x2549);
    }
}
