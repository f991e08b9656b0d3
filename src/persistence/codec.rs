//! Value <-> stored string conversion

use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;

/// How a cell turns its value into the string the store holds
pub trait Codec<T> {
    fn encode(value: &T) -> Result<String, CodecError>;
    fn decode(raw: &str) -> Result<T, CodecError>;
}

/// JSON via serde, for structured records
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl<T: Serialize + DeserializeOwned> Codec<T> for Json {
    fn encode(value: &T) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(raw: &str) -> Result<T, CodecError> {
        serde_json::from_str(raw).or_else(|e| {
            // Other writers may store strings unquoted
            serde_json::from_value(serde_json::Value::String(raw.to_owned()))
                .map_err(|_| CodecError::Decode(e.to_string()))
        })
    }
}

/// Plain text via `Display` / `FromStr`.
///
/// A `String` is stored as-is, so entries stay readable (and writable) by
/// other code that treats the slot as a raw string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl<T> Codec<T> for Text
where
    T: Display + FromStr,
    T::Err: Display,
{
    fn encode(value: &T) -> Result<String, CodecError> {
        Ok(value.to_string())
    }

    fn decode(raw: &str) -> Result<T, CodecError> {
        raw.parse().map_err(|e: T::Err| CodecError::Decode(e.to_string()))
    }
}
