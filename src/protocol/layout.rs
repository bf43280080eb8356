//! Declarative payload layouts.
//!
//! Each firmware variant is described by a [`PayloadLayout`]: a minimum
//! payload length plus one [`FieldSpec`] per measurement. Supporting a new
//! firmware means adding a [`FirmwareLayout`] variant and its table entry;
//! the decoder itself never branches on firmware.

use std::fmt;
use std::str::FromStr;

use crate::data::reading::{BATTERY_RANGE, HUMIDITY_RANGE, TEMPERATURE_RANGE};
use crate::error::{Error, Result};

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

/// How a field's raw value is stored in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldEncoding {
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit two's complement.
    I16(ByteOrder),
    /// Unsigned 16-bit.
    U16(ByteOrder),
}

impl FieldEncoding {
    /// Number of bytes occupied by the field.
    pub const fn width(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16(_) | Self::U16(_) => 2,
        }
    }

    /// Read the raw value from exactly `width()` bytes.
    fn read(&self, bytes: &[u8]) -> Option<i64> {
        match (self, bytes) {
            (Self::U8, [b]) => Some(i64::from(*b)),
            (Self::I16(ByteOrder::Little), [lo, hi]) => Some(i64::from(i16::from_le_bytes([*lo, *hi]))),
            (Self::I16(ByteOrder::Big), [hi, lo]) => Some(i64::from(i16::from_be_bytes([*hi, *lo]))),
            (Self::U16(ByteOrder::Little), [lo, hi]) => Some(i64::from(u16::from_le_bytes([*lo, *hi]))),
            (Self::U16(ByteOrder::Big), [hi, lo]) => Some(i64::from(u16::from_be_bytes([*hi, *lo]))),
            _ => None,
        }
    }
}

/// Rational scale from raw device units to reading units.
///
/// `value = raw * numerator / denominator`, rounded half away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scale {
    numerator: i64,
    denominator: i64,
}

impl Scale {
    /// Raw units are already reading units.
    pub const IDENTITY: Self = Self::ratio(1, 1);

    /// Create a scale. A zero denominator is treated as 1.
    pub const fn ratio(numerator: i64, denominator: i64) -> Self {
        let denominator = if denominator == 0 { 1 } else { denominator };
        Self {
            numerator,
            denominator,
        }
    }

    /// Numerator and denominator with the sign moved onto the numerator.
    fn normalized(&self) -> (i128, i128) {
        let (num, den) = (i128::from(self.numerator), i128::from(self.denominator));
        if den < 0 {
            (-num, -den)
        } else {
            (num, den)
        }
    }

    /// Apply the scale to a raw value.
    ///
    /// Returns `None` if the result does not fit in an `i64`.
    pub fn apply(&self, raw: i64) -> Option<i64> {
        let (numerator, den) = self.normalized();
        let num = i128::from(raw).checked_mul(numerator)?;
        let half = den / 2;
        let rounded = if num >= 0 {
            num.checked_add(half)? / den
        } else {
            num.checked_sub(half)? / den
        };
        i64::try_from(rounded).ok()
    }

    /// Check if the exact, unrounded scaled value lies within `min..=max`.
    ///
    /// Compared as `min * den <= raw * num <= max * den` so a raw value just
    /// past a bound never rounds onto it.
    pub fn within(&self, raw: i64, min: i64, max: i64) -> bool {
        let (num, den) = self.normalized();
        let exact = i128::from(raw) * num;
        i128::from(min) * den <= exact && exact <= i128::from(max) * den
    }
}

/// Location, encoding, scale and plausible range of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldSpec {
    /// Byte offset within the device-specific payload.
    pub offset: usize,
    /// Storage encoding.
    pub encoding: FieldEncoding,
    /// Conversion to reading units.
    pub scale: Scale,
    /// Smallest plausible value, in reading units.
    pub min: i64,
    /// Largest plausible value, in reading units.
    pub max: i64,
}

impl FieldSpec {
    /// Extract the field from a payload.
    ///
    /// Returns `None` if the field's bytes lie beyond the payload or the
    /// value encoded in the payload falls outside `min..=max`. The range is
    /// checked before rounding, so out-of-range values are never clamped
    /// onto a bound.
    pub fn extract(&self, payload: &[u8]) -> Option<i64> {
        let end = self.end()?;
        let raw = self.encoding.read(payload.get(self.offset..end)?)?;
        if !self.scale.within(raw, self.min, self.max) {
            return None;
        }
        self.scale.apply(raw)
    }

    /// One past the last byte this field reads, if addressable.
    pub const fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.encoding.width())
    }
}

/// Complete byte layout of one firmware variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadLayout {
    /// Payloads shorter than this are rejected outright.
    pub min_len: usize,
    /// Temperature in tenths of a degree Celsius.
    pub temperature: FieldSpec,
    /// Relative humidity in tenths of a percent.
    pub humidity: FieldSpec,
    /// Battery level in percent.
    pub battery: FieldSpec,
}

const TEMPERATURE_MIN: i64 = *TEMPERATURE_RANGE.start() as i64;
const TEMPERATURE_MAX: i64 = *TEMPERATURE_RANGE.end() as i64;
const HUMIDITY_MIN: i64 = *HUMIDITY_RANGE.start() as i64;
const HUMIDITY_MAX: i64 = *HUMIDITY_RANGE.end() as i64;
const BATTERY_MIN: i64 = *BATTERY_RANGE.start() as i64;
const BATTERY_MAX: i64 = *BATTERY_RANGE.end() as i64;

const fn temperature_at(offset: usize, scale: Scale) -> FieldSpec {
    FieldSpec {
        offset,
        encoding: FieldEncoding::I16(ByteOrder::Little),
        scale,
        min: TEMPERATURE_MIN,
        max: TEMPERATURE_MAX,
    }
}

const fn humidity_at(offset: usize) -> FieldSpec {
    FieldSpec {
        offset,
        encoding: FieldEncoding::U16(ByteOrder::Little),
        scale: Scale::IDENTITY,
        min: HUMIDITY_MIN,
        max: HUMIDITY_MAX,
    }
}

const fn battery_at(offset: usize) -> FieldSpec {
    FieldSpec {
        offset,
        encoding: FieldEncoding::U8,
        scale: Scale::IDENTITY,
        min: BATTERY_MIN,
        max: BATTERY_MAX,
    }
}

// Temperature in hundredths at 0, humidity in tenths at 2, battery at 4.
const COMPACT: PayloadLayout = PayloadLayout {
    min_len: 6,
    temperature: temperature_at(0, Scale::ratio(1, 10)),
    humidity: humidity_at(2),
    battery: battery_at(4),
};

// ITH-11-B captures: temperature and humidity in tenths at 4 and 6, battery at 8.
const ITH11B: PayloadLayout = PayloadLayout {
    min_len: 9,
    temperature: temperature_at(4, Scale::IDENTITY),
    humidity: humidity_at(6),
    battery: battery_at(8),
};

/// Known firmware payload variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FirmwareLayout {
    /// Six-byte layout: temperature (0.01 °C) at 0, humidity (0.1 %) at 2,
    /// battery (%) at 4.
    #[default]
    Compact,
    /// Inkbird ITH-11-B layout: temperature (0.1 °C) at 4, humidity (0.1 %)
    /// at 6, battery (%) at 8.
    Ith11B,
}

impl FirmwareLayout {
    /// All supported layouts.
    pub const ALL: [Self; 2] = [Self::Compact, Self::Ith11B];

    /// Get the byte layout table entry.
    pub fn layout(&self) -> &'static PayloadLayout {
        match self {
            Self::Compact => &COMPACT,
            Self::Ith11B => &ITH11B,
        }
    }

    /// Short configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Ith11B => "ith11b",
        }
    }
}

impl fmt::Display for FirmwareLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FirmwareLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "compact" => Ok(Self::Compact),
            "ith11b" | "ith11" => Ok(Self::Ith11B),
            _ => Err(Error::InvalidParameter {
                name: "layout".to_string(),
                value: s.to_string(),
            }),
        }
    }
}
