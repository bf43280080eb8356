//! Error types for the inkbird-rust-ble crate.
//!
//! Two families live here. [`Error`] covers operational faults (Bluetooth,
//! configuration). [`DecodeRejected`] is the non-fatal outcome of the decode
//! pipeline: it is a value handed back to the caller, never a fault.

use thiserror::Error;

use crate::ble::address::DeviceAddress;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// A device address could not be parsed.
    #[error("Invalid device address: {value:?}")]
    InvalidAddress {
        /// The text that failed to parse.
        value: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// A required configuration value is missing.
    #[error("Missing configuration: {name}")]
    MissingConfig {
        /// The name of the missing setting.
        name: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Why an advertisement did not produce a reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeRejected {
    /// The advertisement came from a different device.
    #[error("Address mismatch: expected {expected}, got {observed}")]
    AddressMismatch {
        /// The configured device address.
        expected: DeviceAddress,
        /// The address the advertisement was received from.
        observed: DeviceAddress,
    },

    /// The payload is shorter than the layout requires.
    #[error("Payload too short: {len} bytes (need at least {min})")]
    PayloadTooShort {
        /// Length of the received payload.
        len: usize,
        /// Minimum length required by the active layout.
        min: usize,
    },

    /// The advertisement carried no manufacturer data for the expected company.
    #[error("No manufacturer data for company id {company_id:#06x}")]
    NoManufacturerData {
        /// The company identifier that was looked up.
        company_id: u16,
    },
}

impl DecodeRejected {
    /// Check if this rejection is ordinary traffic from another device.
    pub fn is_address_mismatch(&self) -> bool {
        matches!(self, Self::AddressMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        let err = DecodeRejected::PayloadTooShort { len: 5, min: 6 };
        assert_eq!(err.to_string(), "Payload too short: 5 bytes (need at least 6)");

        let err = DecodeRejected::NoManufacturerData { company_id: 0x2549 };
        assert_eq!(err.to_string(), "No manufacturer data for company id 0x2549");
    }

    #[test]
    fn test_is_address_mismatch() {
        let err = DecodeRejected::AddressMismatch {
            expected: DeviceAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            observed: DeviceAddress::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
        };
        assert!(err.is_address_mismatch());
        assert!(!DecodeRejected::PayloadTooShort { len: 0, min: 6 }.is_address_mismatch());
    }
}
