//! Contains the Ethereum JSON-RPC types shared by the HTTP and the pub/sub
//! clients.
//!
//! This includes thin wrappers around [primitive_types] hashes which help by
//! providing additional type safety, the JSON-RPC 2.0 envelope and the
//! block, transaction and log payloads returned by Ethereum nodes.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod encoding;
mod endpoint;
pub mod jsonrpc;
mod macros;
pub mod types;

pub use endpoint::Endpoint;
pub use primitive_types::{H256, U256};
pub use types::*;

macros::hash_newtypes!(H160: [Address]);
macros::hash_newtypes!(H256: [BlockHash, TransactionHash]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HexParseError {
    #[error("Empty hex string")]
    Empty,
    #[error("Invalid hex digit")]
    InvalidDigit,
    #[error("Invalid length: expected {expected} digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Unformatted binary data, encoded as a `0x` prefixed hex string.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl std::fmt::Debug for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bytes(0x{})", hex::encode(&self.0))
    }
}

impl std::fmt::Display for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl FromStr for Bytes {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(stripped)
            .map(Bytes)
            .map_err(|e| match e {
                hex::FromHexError::OddLength => HexParseError::InvalidLength {
                    expected: stripped.len() + 1,
                    actual: stripped.len(),
                },
                _ => HexParseError::InvalidDigit,
            })
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ::serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: ::serde::Deserializer<'de>,
    {
        let s = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
        s.parse().map_err(::serde::de::Error::custom)
    }
}

/// The error returned when a string is not a valid [BlockParameter].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Block param should be number or `pending`, `latest`, `earliest`, got {0:?}")]
pub struct InvalidBlockParameter(pub String);

/// Identifies a block either by its number or by one of the well-known tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockParameter {
    Number(u64),
    Latest,
    Pending,
    Earliest,
}

impl FromStr for BlockParameter {
    type Err = InvalidBlockParameter;

    /// Accepts a decimal number, a `0x` prefixed hex number or one of
    /// `latest`, `pending` and `earliest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Self::Latest),
            "pending" => Ok(Self::Pending),
            "earliest" => Ok(Self::Earliest),
            number => {
                let parsed = match number.strip_prefix("0x") {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => number.parse::<u64>(),
                };
                parsed
                    .map(Self::Number)
                    .map_err(|_| InvalidBlockParameter(s.to_owned()))
            }
        }
    }
}

impl std::fmt::Display for BlockParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockParameter::Number(n) => write!(f, "{n:#x}"),
            BlockParameter::Latest => f.write_str("latest"),
            BlockParameter::Pending => f.write_str("pending"),
            BlockParameter::Earliest => f.write_str("earliest"),
        }
    }
}

impl Serialize for BlockParameter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ::serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::decimal("1234", BlockParameter::Number(1234))]
    #[case::hex("0x4d2", BlockParameter::Number(1234))]
    #[case::latest("latest", BlockParameter::Latest)]
    #[case::pending("pending", BlockParameter::Pending)]
    #[case::earliest("earliest", BlockParameter::Earliest)]
    fn block_parameter(#[case] input: &str, #[case] expected: BlockParameter) {
        assert_eq!(input.parse::<BlockParameter>(), Ok(expected));
    }

    #[rstest]
    #[case::empty("")]
    #[case::tag_with_wrong_case("Latest")]
    #[case::negative("-1")]
    #[case::garbage("safe-ish")]
    fn invalid_block_parameter(#[case] input: &str) {
        assert_matches!(input.parse::<BlockParameter>(), Err(InvalidBlockParameter(s)) if s == input);
    }

    #[test]
    fn block_parameter_serializes_as_quantity_or_tag() {
        let json = serde_json::to_value([BlockParameter::Number(16), BlockParameter::Pending]).unwrap();
        assert_eq!(json, serde_json::json!(["0x10", "pending"]));
    }

    #[rstest]
    #[case::prefixed("0x8ba1f109551bd432803012645ac136ddd64dba72", true)]
    #[case::unprefixed("8ba1f109551bD432803012645Ac136ddd64DBA72", true)]
    #[case::too_short("0x8ba1f109551bd432803012645ac136ddd64dba", false)]
    #[case::not_hex("0x8ba1f109551bd432803012645ac136ddd64dbaZZ", false)]
    fn address_parsing(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(input.parse::<Address>().is_ok(), expected);
    }

    #[test]
    fn hashes_serialize_in_full() {
        let hash: BlockHash = "0x00000000000000000000000000000000000000000000000000000000000000ab"
            .parse()
            .unwrap();
        assert_eq!(
            serde_json::to_value(hash).unwrap(),
            serde_json::json!("0x00000000000000000000000000000000000000000000000000000000000000ab")
        );
    }

    #[test]
    fn bytes() {
        let bytes: Bytes = serde_json::from_value(serde_json::json!("0xdeadBEEF")).unwrap();
        assert_eq!(bytes, Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(serde_json::to_value(&bytes).unwrap(), serde_json::json!("0xdeadbeef"));
        assert_eq!("0x".parse::<Bytes>(), Ok(Bytes(vec![])));
        assert_matches!("0xabc".parse::<Bytes>(), Err(HexParseError::InvalidLength { .. }));
    }
}
