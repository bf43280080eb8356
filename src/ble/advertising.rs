//! Advertisement events.
//!
//! An [`AdvertisementEvent`] is what the transport hands to the decode
//! pipeline: the source address plus the manufacturer-specific payload with
//! the advertisement framing (length, AD type, company id) already stripped.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::ble::address::DeviceAddress;
use crate::error::DecodeRejected;

/// A single observed advertisement from one device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvertisementEvent {
    /// Address the advertisement was received from.
    pub source: DeviceAddress,
    /// Device-specific manufacturer data bytes.
    pub manufacturer_data: Bytes,
    /// When the transport received the packet.
    pub received_at: DateTime<Utc>,
    /// Signal strength in dBm, if the transport reported one.
    pub rssi: Option<i16>,
}

impl AdvertisementEvent {
    /// Create a new event.
    pub fn new(
        source: DeviceAddress,
        manufacturer_data: impl Into<Bytes>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            manufacturer_data: manufacturer_data.into(),
            received_at,
            rssi: None,
        }
    }

    /// Attach a signal strength reading.
    pub fn with_rssi(mut self, rssi: Option<i16>) -> Self {
        self.rssi = rssi;
        self
    }

    /// Build an event from a company-id keyed manufacturer data map.
    ///
    /// This is the shape most BLE stacks report manufacturer data in. The
    /// block for `company_id` is isolated; if it is missing the advertisement
    /// carries nothing this crate can decode.
    pub fn from_manufacturer_data(
        source: DeviceAddress,
        manufacturer_data: &HashMap<u16, Vec<u8>>,
        company_id: u16,
        received_at: DateTime<Utc>,
    ) -> Result<Self, DecodeRejected> {
        let payload = manufacturer_data
            .get(&company_id)
            .ok_or(DecodeRejected::NoManufacturerData { company_id })?;

        Ok(Self::new(
            source,
            Bytes::copy_from_slice(payload),
            received_at,
        ))
    }

    /// Get the payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.manufacturer_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::INKBIRD_MANUFACTURER_ID;
    use chrono::TimeZone;

    fn address() -> DeviceAddress {
        DeviceAddress::new([0x49, 0x22, 0x05, 0x17, 0x2C, 0x01])
    }

    #[test]
    fn test_from_manufacturer_data_picks_company_block() {
        let mut map = HashMap::new();
        map.insert(0x004C, vec![0x02, 0x15]);
        map.insert(INKBIRD_MANUFACTURER_ID, vec![0x01, 0x02, 0x03]);
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let event =
            AdvertisementEvent::from_manufacturer_data(address(), &map, INKBIRD_MANUFACTURER_ID, at)
                .unwrap();

        assert_eq!(event.payload(), &[0x01, 0x02, 0x03]);
        assert_eq!(event.source, address());
        assert_eq!(event.received_at, at);
        assert_eq!(event.rssi, None);
    }

    #[test]
    fn test_from_manufacturer_data_missing_block() {
        let mut map = HashMap::new();
        map.insert(0x004C, vec![0x02, 0x15]);

        let result = AdvertisementEvent::from_manufacturer_data(
            address(),
            &map,
            INKBIRD_MANUFACTURER_ID,
            Utc::now(),
        );

        assert_eq!(
            result,
            Err(DecodeRejected::NoManufacturerData {
                company_id: INKBIRD_MANUFACTURER_ID
            })
        );
    }

    #[test]
    fn test_with_rssi() {
        let event = AdvertisementEvent::new(address(), vec![0u8; 9], Utc::now()).with_rssi(Some(-71));
        assert_eq!(event.rssi, Some(-71));
    }
}
