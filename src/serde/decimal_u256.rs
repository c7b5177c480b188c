//! Helpers for [`U256`] quantities that relay servers exchange as decimal strings.
//!
//! Deserialization is lenient and accepts decimal strings, `0x` prefixed hex strings and JSON
//! numbers.

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

/// Serializes [`U256`] as a base-10 string.
pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// Deserializes a [`U256`] from a decimal string, hex string or number.
pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => parse(&s).map_err(D::Error::custom),
        StringOrNumber::Number(n) => Ok(U256::from(n)),
    }
}

/// Parses a decimal or `0x` prefixed hex string.
pub(crate) fn parse(s: &str) -> Result<U256, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(s, 10),
    };
    parsed.map_err(|err| format!("invalid quantity {s:?}: {err}"))
}
