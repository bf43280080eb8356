//! BLE module.
//!
//! This module provides device addressing, advertisement events and the
//! transport side of the crate: the [`AdvertisementSource`] seam and its
//! `btleplug` implementation.

pub mod address;
pub mod advertising;
pub mod scanner;
pub mod source;
pub mod uuids;

pub use address::{matches, DeviceAddress};
pub use advertising::AdvertisementEvent;
pub use scanner::BleScanner;
pub use source::AdvertisementSource;
pub use uuids::*;
