//! Utilities used for serializing/deserializing Ethereum JSON-RPC data.
//!
//! Quantities are encoded as `0x` prefixed hex strings without leading zeros,
//! unformatted data as `0x` prefixed hex strings with two digits per byte.

use serde::de::Visitor;
use serde_with::{DeserializeAs, SerializeAs};

use crate::HexParseError;

pub struct U64AsHexStr;

impl SerializeAs<u64> for U64AsHexStr {
    fn serialize_as<S>(source: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // u64 is "0x" + 16 digits at most
        let mut buf = [0u8; 2 + 16];
        let s = u64_as_hex_str(*source, &mut buf);
        serializer.serialize_str(s)
    }
}

impl<'de> DeserializeAs<'de, u64> for U64AsHexStr {
    fn deserialize_as<D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct U64Visitor;

        impl Visitor<'_> for U64Visitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a hex string of up to 16 digits with an optional '0x' prefix")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64_from_hex_str(v).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(U64Visitor)
    }
}

/// Parses a hex quantity with an optional `0x` prefix.
pub fn u64_from_hex_str(s: &str) -> Result<u64, HexParseError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    if stripped.is_empty() {
        return Err(HexParseError::Empty);
    }
    if stripped.len() > 16 {
        return Err(HexParseError::InvalidLength {
            expected: 16,
            actual: stripped.len(),
        });
    }
    u64::from_str_radix(stripped, 16).map_err(|_| HexParseError::InvalidDigit)
}

/// Produces a "0x" prefixed quantity in a given buffer `buf`.
fn u64_as_hex_str(value: u64, buf: &mut [u8; 18]) -> &str {
    const LUT: [u8; 16] = *b"0123456789abcdef";

    if value == 0 {
        return "0x0";
    }

    let digits = 16 - (value.leading_zeros() as usize / 4);
    buf[0] = b'0';
    buf[1] = b'x';
    for i in 0..digits {
        let nibble = (value >> ((digits - 1 - i) * 4)) & 0xf;
        buf[2 + i] = LUT[nibble as usize];
    }
    // Only ASCII hex digits were written.
    std::str::from_utf8(&buf[..2 + digits]).unwrap_or("0x0")
}

/// Parses a hex string of exactly `N` bytes, with an optional `0x` prefix.
///
/// Supports both upper and lower case digits.
pub fn bytes_from_hex_str<const N: usize>(hex_str: &str) -> Result<[u8; N], HexParseError> {
    let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    if stripped.len() != N * 2 {
        return Err(HexParseError::InvalidLength {
            expected: N * 2,
            actual: stripped.len(),
        });
    }

    let mut buf = [0u8; N];
    hex::decode_to_slice(stripped, &mut buf).map_err(|_| HexParseError::InvalidDigit)?;
    Ok(buf)
}
