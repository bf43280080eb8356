//! Device address parsing and matching.
//!
//! Addresses are compared as six raw octets, so the textual form a user
//! typed (upper or lower case, `:` or `-` separated, or bare hex) never
//! affects whether an advertisement is accepted.

use std::fmt;
use std::str::FromStr;

use btleplug::api::BDAddr;

use crate::error::{Error, Result};

/// A 6-byte Bluetooth hardware address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    /// Number of octets in an address.
    pub const LEN: usize = 6;

    /// Create an address from its six octets, most significant first.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Get the raw octets.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Lower-case, colon separated form (`aa:bb:cc:dd:ee:ff`).
    ///
    /// Useful as a stable unique identifier for the configured device.
    pub fn to_lowercase_string(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }
}

impl FromStr for DeviceAddress {
    type Err = Error;

    /// Parse `AA:BB:CC:DD:EE:FF`, `AA-BB-CC-DD-EE-FF` or `aabbccddeeff`.
    ///
    /// Separators must be used uniformly; mixed forms are rejected.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidAddress {
            value: s.to_string(),
        };

        let hex = if s.len() == 17 {
            let sep = s.as_bytes()[2];
            if sep != b':' && sep != b'-' {
                return Err(invalid());
            }
            let groups: Vec<&str> = s.split(sep as char).collect();
            if groups.len() != Self::LEN || groups.iter().any(|g| g.len() != 2) {
                return Err(invalid());
            }
            groups.concat()
        } else {
            s.to_string()
        };

        if hex.len() != Self::LEN * 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            *octet = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

impl fmt::Debug for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceAddress({})", self)
    }
}

impl From<[u8; 6]> for DeviceAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl From<BDAddr> for DeviceAddress {
    fn from(addr: BDAddr) -> Self {
        Self(addr.into_inner())
    }
}

impl From<DeviceAddress> for BDAddr {
    fn from(addr: DeviceAddress) -> Self {
        BDAddr::from(addr.0)
    }
}

/// Check whether an observed address belongs to the configured device.
///
/// Exact equality of all six octets; there is no prefix matching.
#[inline]
pub fn matches(configured: &DeviceAddress, observed: &DeviceAddress) -> bool {
    configured == observed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const AABB: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

    #[test]
    fn test_parse_separated_forms() {
        let colon: DeviceAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let dash: DeviceAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(colon.octets(), AABB);
        assert_eq!(dash.octets(), AABB);
    }

    #[test]
    fn test_parse_bare_form() {
        let bare: DeviceAddress = "aabbccddeeff".parse().unwrap();
        assert_eq!(bare, DeviceAddress::new(AABB));

        let padded: DeviceAddress = "  AaBbCcDdEeFf\n".parse().unwrap();
        assert_eq!(padded, DeviceAddress::new(AABB));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in [
            "",
            "AA:BB:CC:DD:EE",
            "AA:BB:CC:DD:EE:FF:00",
            "AA:BB-CC:DD:EE:FF",
            "AA.BB.CC.DD.EE.FF",
            "GG:BB:CC:DD:EE:FF",
            "+A:BB:CC:DD:EE:FF",
            "aabbccddeef",
            "AAB:BCC:DDE:EFF:0",
        ] {
            assert!(
                input.parse::<DeviceAddress>().is_err(),
                "expected {:?} to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_display_is_canonical() {
        let addr: DeviceAddress = "0a-1b-2c-3d-4e-5f".parse().unwrap();
        assert_eq!(addr.to_string(), "0A:1B:2C:3D:4E:5F");
        assert_eq!(addr.to_lowercase_string(), "0a:1b:2c:3d:4e:5f");
        assert_eq!(format!("{:?}", addr), "DeviceAddress(0A:1B:2C:3D:4E:5F)");
    }

    #[test]
    fn test_matches_ignores_case_and_separators() {
        let configured: DeviceAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let observed: DeviceAddress = "aabbccddeeff".parse().unwrap();
        assert!(matches(&configured, &observed));

        let other: DeviceAddress = "11:22:33:44:55:66".parse().unwrap();
        assert!(!matches(&configured, &other));
    }

    #[test]
    fn test_no_prefix_matching() {
        let configured = DeviceAddress::new(AABB);
        let observed = DeviceAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x00]);
        assert!(!matches(&configured, &observed));
    }

    #[test]
    fn test_bdaddr_conversion() {
        let bd = BDAddr::from(AABB);
        let addr = DeviceAddress::from(bd);
        assert_eq!(addr.octets(), AABB);
        assert_eq!(BDAddr::from(addr), bd);
    }
}
