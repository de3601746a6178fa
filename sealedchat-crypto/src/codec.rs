//! Hex field codec for values crossing a process or network boundary.
//!
//! Binary fields travel as lowercase hex. Fixed-size fields are checked for
//! length here, so a malformed record is rejected before any decryption runs.

use crate::error::{CryptoError, CryptoResult};

/// Decodes a hex field into a fixed-size array.
///
/// `field` names the value in the returned error.
pub fn decode_fixed<const N: usize>(field: &'static str, input: &str) -> CryptoResult<[u8; N]> {
    let bytes = decode_vec(field, input)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidFieldLength {
            field,
            expected: N,
            actual: bytes.len(),
        })
}

/// Decodes a variable-length hex field.
pub fn decode_vec(field: &'static str, input: &str) -> CryptoResult<Vec<u8>> {
    hex::decode(input).map_err(|_| CryptoError::InvalidHex { field })
}

/// Encodes bytes as lowercase hex.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// `#[serde(with = "codec::hex_option")]` for optional binary fields.
///
/// `None` maps to JSON `null`. A present value goes through the same
/// length check as `hex::serde`.
pub mod hex_option {
    use std::fmt::Display;

    use hex::{FromHex, ToHex};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: ToHex,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.encode_hex::<String>()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromHex,
        <T as FromHex>::Error: Display,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| T::from_hex(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
