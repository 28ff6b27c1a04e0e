//! Utility functions for the lasko-fan-ble crate.

use crate::error::{Error, Result};

/// Format bytes as space-separated uppercase hex.
///
/// # Example
///
/// ```
/// use lasko_fan_ble::utils::to_hex;
///
/// assert_eq!(to_hex(&[0x04, 0x03, 0x0B]), "04 03 0B");
/// ```
pub fn to_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a hex string into bytes.
///
/// Whitespace between digits is ignored, so both `"0403040108"` and
/// `"04 03 04 01 08"` are accepted.
///
/// # Example
///
/// ```
/// use lasko_fan_ble::utils::from_hex;
///
/// assert_eq!(from_hex("03 03 03 06").unwrap(), vec![0x03, 0x03, 0x03, 0x06]);
/// ```
pub fn from_hex(hex: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = hex.bytes().filter(|b| !b.is_ascii_whitespace()).collect();

    let invalid = || Error::InvalidParameter {
        name: "hex".to_string(),
        value: hex.to_string(),
    };

    if digits.len() % 2 != 0 {
        return Err(invalid());
    }

    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(invalid)
        })
        .collect()
}
