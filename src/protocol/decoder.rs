//! Manufacturer payload decoding.

use crate::data::DecodedFields;
use crate::error::DecodeRejected;
use crate::protocol::layout::{FirmwareLayout, PayloadLayout};

/// Decodes device-specific manufacturer payloads using one firmware layout.
///
/// Decoding is pure: the same bytes always give the same outcome, and a
/// decoder can be shared freely between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayloadDecoder {
    layout: FirmwareLayout,
}

impl PayloadDecoder {
    /// Create a decoder for the given firmware layout.
    pub fn new(layout: FirmwareLayout) -> Self {
        Self { layout }
    }

    /// The firmware layout in use.
    pub fn layout(&self) -> FirmwareLayout {
        self.layout
    }

    /// Minimum payload length accepted by this decoder.
    pub fn min_len(&self) -> usize {
        self.table().min_len
    }

    fn table(&self) -> &'static PayloadLayout {
        self.layout.layout()
    }

    /// Decode a payload into its measurement fields.
    ///
    /// # Arguments
    ///
    /// * `payload` - Manufacturer data with the company id already stripped
    ///
    /// # Returns
    ///
    /// The decoded fields, each absent when its bytes are implausible, or
    /// [`DecodeRejected::PayloadTooShort`] when the payload cannot hold the
    /// layout. No other rejection is produced here.
    ///
    /// # Example
    ///
    /// ```
    /// use inkbird_rust_ble::protocol::PayloadDecoder;
    ///
    /// let decoder = PayloadDecoder::default();
    /// let fields = decoder.decode(&[0xC4, 0x09, 0xC2, 0x01, 0x4E, 0x00]).unwrap();
    /// assert_eq!(fields.temperature, Some(250));
    /// assert_eq!(fields.humidity, Some(450));
    /// assert_eq!(fields.battery, Some(78));
    /// ```
    pub fn decode(&self, payload: &[u8]) -> Result<DecodedFields, DecodeRejected> {
        let table = self.table();
        if payload.len() < table.min_len {
            return Err(DecodeRejected::PayloadTooShort {
                len: payload.len(),
                min: table.min_len,
            });
        }

        // Fields are independent: one implausible value never hides another.
        Ok(DecodedFields {
            temperature: table
                .temperature
                .extract(payload)
                .and_then(|v| i16::try_from(v).ok()),
            humidity: table
                .humidity
                .extract(payload)
                .and_then(|v| u16::try_from(v).ok()),
            battery: table
                .battery
                .extract(payload)
                .and_then(|v| u8::try_from(v).ok()),
        })
    }
}
