//! Sensor configuration.
//!
//! A [`SensorConfig`] names the one device to listen to and how to decode it.
//! It can be built in code or loaded from the environment (with `.env`
//! support):
//!
//! | Variable                      | Meaning                           | Default            |
//! |-------------------------------|-----------------------------------|--------------------|
//! | `INKBIRD_MAC`                 | Device address (required)         |                    |
//! | `INKBIRD_NAME`                | Display name                      | `Inkbird ITH-11-B` |
//! | `INKBIRD_LAYOUT`              | `ith11b` or `compact`             | `ith11b`           |
//! | `INKBIRD_STALE_TIMEOUT_SECS`  | Seconds without data before stale | `15`               |

use std::env;
use std::time::Duration;

use crate::ble::address::DeviceAddress;
use crate::error::{Error, Result};
use crate::pipeline::DecodePipeline;
use crate::protocol::{FirmwareLayout, PayloadDecoder};

/// Environment variable holding the device address.
pub const ENV_MAC: &str = "INKBIRD_MAC";
/// Environment variable holding the display name.
pub const ENV_NAME: &str = "INKBIRD_NAME";
/// Environment variable selecting the firmware layout.
pub const ENV_LAYOUT: &str = "INKBIRD_LAYOUT";
/// Environment variable holding the stale timeout in seconds.
pub const ENV_STALE_TIMEOUT: &str = "INKBIRD_STALE_TIMEOUT_SECS";

/// Configuration for monitoring a single sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Address of the device to accept advertisements from.
    pub address: DeviceAddress,
    /// Human readable name.
    pub name: String,
    /// Payload layout of the device's firmware.
    pub layout: FirmwareLayout,
    /// How long without a reading before the sensor counts as stale.
    pub stale_timeout: Duration,
}

impl SensorConfig {
    /// Name used when none is configured.
    pub const DEFAULT_NAME: &'static str = "Inkbird ITH-11-B";

    /// Default stale timeout (15 seconds).
    pub const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(15);

    /// Create a configuration for the device at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address is not six hex
    /// octets separated by `:` or `-` (or twelve bare hex digits).
    pub fn new(address: &str) -> Result<Self> {
        Ok(Self {
            address: address.parse()?,
            name: Self::DEFAULT_NAME.to_string(),
            layout: FirmwareLayout::Ith11B,
            stale_timeout: Self::DEFAULT_STALE_TIMEOUT,
        })
    }

    /// Set the display name. A blank name keeps the default.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim();
        if !name.is_empty() {
            self.name = name.to_string();
        }
        self
    }

    /// Set the firmware layout.
    pub fn with_layout(mut self, layout: FirmwareLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the stale timeout.
    pub fn with_stale_timeout(mut self, timeout: Duration) -> Self {
        self.stale_timeout = timeout;
        self
    }

    /// Load configuration from the environment, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if `INKBIRD_MAC` is missing or any value is invalid.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mac = lookup(ENV_MAC).ok_or_else(|| Error::MissingConfig {
            name: ENV_MAC.to_string(),
        })?;

        let mut config = Self::new(&mac)?;

        if let Some(name) = lookup(ENV_NAME) {
            config = config.with_name(name);
        }

        if let Some(layout) = lookup(ENV_LAYOUT) {
            config = config.with_layout(layout.parse()?);
        }

        if let Some(secs) = lookup(ENV_STALE_TIMEOUT) {
            let secs: u64 = secs.trim().parse().map_err(|_| Error::InvalidParameter {
                name: ENV_STALE_TIMEOUT.to_string(),
                value: secs.clone(),
            })?;
            config = config.with_stale_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Stable identifier for the configured device (lower-case address).
    pub fn unique_id(&self) -> String {
        self.address.to_lowercase_string()
    }

    /// Build the decode pipeline described by this configuration.
    pub fn pipeline(&self) -> DecodePipeline {
        DecodePipeline::new(self.address, PayloadDecoder::new(self.layout))
    }
}
