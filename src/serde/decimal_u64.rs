//! Helpers for `u64` quantities that relay servers exchange as decimal strings.

use serde::{Deserialize, Deserializer, Serializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

/// Serializes a `u64` as a base-10 string.
pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// Deserializes a `u64` from a decimal string, hex string or number.
pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => super::decimal_u256::parse(&s)
            .and_then(|value| {
                u64::try_from(value).map_err(|_| format!("quantity {s:?} overflows u64"))
            })
            .map_err(D::Error::custom),
        StringOrNumber::Number(n) => Ok(n),
    }
}
