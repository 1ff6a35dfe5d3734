/// Generates fixed-size hash newtype-wrappers.
///
/// Usage:
///     `hash_newtypes!(H256: [x1, x2, ..])`
///
/// Each wrapper serializes as a `0x` prefixed, zero padded hex string, parses
/// from a hex string with an optional `0x` prefix and displays in full.
macro_rules! hash_newtypes {
    ($inner:ident: [$($target:ident),* $(,)?]) => {
        $(crate::macros::hash_newtypes!(@define $inner, $target);)*
    };

    (@define $inner:ident, $target:ident) => {
        #[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $target(pub primitive_types::$inner);

        impl $target {
            pub const ZERO: Self = Self(primitive_types::$inner::zero());

            pub fn as_bytes(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }

        impl From<primitive_types::$inner> for $target {
            fn from(value: primitive_types::$inner) -> Self {
                Self(value)
            }
        }

        impl std::str::FromStr for $target {
            type Err = crate::HexParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                crate::encoding::bytes_from_hex_str::<{ primitive_types::$inner::len_bytes() }>(s)
                    .map(|bytes| Self(primitive_types::$inner::from(bytes)))
            }
        }

        impl std::fmt::Display for $target {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{}", hex::encode(self.0.as_bytes()))
            }
        }

        impl std::fmt::Debug for $target {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($target), self)
            }
        }
    };
}

pub(crate) use hash_newtypes;
