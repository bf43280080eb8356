//! # inkbird-rust-ble
//!
//! A Rust library for decoding the Bluetooth Low Energy advertisements of
//! Inkbird ITH-11-B style temperature / humidity sensors.
//!
//! The sensors broadcast their measurements in manufacturer-specific
//! advertisement data. This crate turns those bytes into validated readings:
//!
//! - **Address matching**: only advertisements from the configured device are decoded
//! - **Table-driven decoding**: each firmware variant is a byte layout entry
//! - **Plausibility filtering**: implausible fields are dropped, never clamped
//! - **Partial readings**: one bad field never hides the others
//! - **Monitoring**: optional BLE scanner and monitor that keep the latest state
//!
//! The decode pipeline is pure and stateless; it performs no I/O and can be
//! called from any thread.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use inkbird_rust_ble::{AdvertisementEvent, DecodePipeline, DeviceAddress, PayloadDecoder};
//!
//! let configured: DeviceAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
//! let pipeline = DecodePipeline::new(configured, PayloadDecoder::default());
//!
//! let event = AdvertisementEvent::new(
//!     "aabbccddeeff".parse().unwrap(),
//!     vec![0xC4, 0x09, 0xC2, 0x01, 0x4E, 0x00],
//!     Utc::now(),
//! );
//!
//! let reading = pipeline.process(&event).unwrap();
//! assert_eq!(reading.temperature_celsius(), Some(25.0));
//! assert_eq!(reading.humidity_percent(), Some(45.0));
//! assert_eq!(reading.battery, Some(78));
//! ```
//!
//! ## Monitoring a sensor
//!
//! ```rust,no_run
//! use inkbird_rust_ble::{Result, SensorConfig, SensorMonitor};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SensorConfig::new("49:22:05:17:2C:01")?;
//!     let monitor = SensorMonitor::with_ble(config).await?;
//!
//!     let _handle = monitor.on_reading(|reading| {
//!         println!("{:?} °C", reading.temperature_celsius());
//!     });
//!
//!     monitor.start().await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(30)).await;
//!     monitor.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! CoreBluetooth hides hardware addresses, so advertisements arrive with
//! address `00:00:00:00:00:00`. Address matching only works on Linux and
//! Windows, or with a transport that reports real addresses.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod protocol;
pub mod utils;

// Re-exports for convenience
pub use config::SensorConfig;
pub use error::{DecodeRejected, Error, Result};
pub use monitor::{CallbackHandle, SensorMonitor, SensorState};
pub use pipeline::{DecodeOutcome, DecodePipeline};
pub use utils::celsius_to_fahrenheit;

// Re-export commonly used types from submodules
pub use ble::{matches, AdvertisementEvent, AdvertisementSource, BleScanner, DeviceAddress};
pub use data::{assemble, DecodedFields, Reading};
pub use protocol::{FirmwareLayout, PayloadDecoder};
