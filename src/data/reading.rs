//! Sensor readings.
//!
//! All measurements are fixed-point integers: temperature in tenths of a
//! degree Celsius, humidity in tenths of a percent, battery in whole percent.
//! Each one is independently optional.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};

use crate::ble::address::DeviceAddress;
use crate::utils::celsius_to_fahrenheit;

/// Plausible temperature range in tenths of a degree Celsius (-40.0 to 125.0 °C).
pub const TEMPERATURE_RANGE: RangeInclusive<i16> = -400..=1250;

/// Plausible humidity range in tenths of a percent (0.0 to 100.0 %).
pub const HUMIDITY_RANGE: RangeInclusive<u16> = 0..=1000;

/// Plausible battery range in percent.
pub const BATTERY_RANGE: RangeInclusive<u8> = 0..=100;

/// Measurements extracted from one payload, before identity and time are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedFields {
    /// Temperature in tenths of a degree Celsius.
    pub temperature: Option<i16>,
    /// Relative humidity in tenths of a percent.
    pub humidity: Option<u16>,
    /// Battery level in percent.
    pub battery: Option<u8>,
}

impl DecodedFields {
    /// Check if no field was decoded.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none() && self.battery.is_none()
    }
}

/// A validated reading from one advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Temperature in tenths of a degree Celsius, within [`TEMPERATURE_RANGE`].
    pub temperature: Option<i16>,
    /// Relative humidity in tenths of a percent, within [`HUMIDITY_RANGE`].
    pub humidity: Option<u16>,
    /// Battery level in percent, within [`BATTERY_RANGE`].
    pub battery: Option<u8>,
    /// Device the reading came from.
    pub source: DeviceAddress,
    /// When the advertisement was observed.
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    /// Temperature in degrees Celsius.
    ///
    /// # Example
    ///
    /// ```
    /// use inkbird_rust_ble::data::{assemble, DecodedFields};
    /// use inkbird_rust_ble::DeviceAddress;
    ///
    /// let fields = DecodedFields { temperature: Some(235), ..Default::default() };
    /// let reading = assemble(DeviceAddress::default(), chrono::Utc::now(), fields);
    /// assert_eq!(reading.temperature_celsius(), Some(23.5));
    /// ```
    pub fn temperature_celsius(&self) -> Option<f64> {
        self.temperature.map(|t| f64::from(t) / 10.0)
    }

    /// Temperature in degrees Fahrenheit.
    pub fn temperature_fahrenheit(&self) -> Option<f64> {
        self.temperature_celsius().map(celsius_to_fahrenheit)
    }

    /// Relative humidity in percent.
    pub fn humidity_percent(&self) -> Option<f64> {
        self.humidity.map(|h| f64::from(h) / 10.0)
    }

    /// Check if no measurement is present.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Check if all three measurements are present.
    pub fn has_all_fields(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some() && self.battery.is_some()
    }

    /// The measurement part of the reading.
    pub fn fields(&self) -> DecodedFields {
        DecodedFields {
            temperature: self.temperature,
            humidity: self.humidity,
            battery: self.battery,
        }
    }
}

/// Wrap decoded fields with source and time into a [`Reading`].
///
/// Fields are not re-validated; debug builds assert they are within bounds so
/// a decoder regression fails loudly in tests.
pub fn assemble(source: DeviceAddress, observed_at: DateTime<Utc>, fields: DecodedFields) -> Reading {
    debug_assert!(
        fields.temperature.map_or(true, |t| TEMPERATURE_RANGE.contains(&t)),
        "temperature {:?} out of range",
        fields.temperature
    );
    debug_assert!(
        fields.humidity.map_or(true, |h| HUMIDITY_RANGE.contains(&h)),
        "humidity {:?} out of range",
        fields.humidity
    );
    debug_assert!(
        fields.battery.map_or(true, |b| BATTERY_RANGE.contains(&b)),
        "battery {:?} out of range",
        fields.battery
    );

    Reading {
        temperature: fields.temperature,
        humidity: fields.humidity,
        battery: fields.battery,
        source,
        observed_at,
    }
}
