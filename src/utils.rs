//! Small helpers shared by readings, state and logging.

/// Convert degrees Celsius to degrees Fahrenheit.
///
/// ```
/// use inkbird_rust_ble::celsius_to_fahrenheit;
///
/// assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 1e-9);
/// ```
#[inline]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius.mul_add(1.8, 32.0)
}

/// Format bytes as a contiguous lower-case hex string.
///
/// # Example
///
/// ```
/// use inkbird_rust_ble::utils::to_hex_string;
///
/// assert_eq!(to_hex_string(&[0x0A, 0xFF, 0x00]), "0aff00");
/// ```
pub fn to_hex_string(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}
