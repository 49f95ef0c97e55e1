//! Byte encodings of the configuration value.
//!
//! Decoding is always relative to a base value: the payload object is merged
//! over the base, so keys the payload omits keep their current value.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::Path;

use crate::error::ConfigError;

/// Textual encoding used by a configuration source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Toml,
}

impl Format {
    /// Pick the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }

    /// Encode a value: keys in declaration order, trailing newline.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ConfigError> {
        match self {
            Format::Json => {
                let mut out = Vec::new();
                let formatter = PrettyFormatter::with_indent(b"    ");
                let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
                value
                    .serialize(&mut ser)
                    .map_err(|e| ConfigError::Encode(e.to_string()))?;
                out.push(b'\n');
                Ok(out)
            }
            Format::Toml => {
                let mut text =
                    toml::to_string_pretty(value).map_err(|e| ConfigError::Encode(e.to_string()))?;
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                Ok(text.into_bytes())
            }
        }
    }

    /// Decode `payload` onto a duplicate of `base`.
    pub fn decode_onto<T>(&self, base: &T, payload: &[u8]) -> Result<T, ConfigError>
    where
        T: Serialize + DeserializeOwned,
    {
        let patch = self.parse(payload)?;
        if !patch.is_object() {
            return Err(ConfigError::Decode(
                "payload must be an object".to_string(),
            ));
        }

        let mut merged =
            serde_json::to_value(base).map_err(|e| ConfigError::Encode(e.to_string()))?;
        merge(&mut merged, patch);

        serde_json::from_value(merged).map_err(|e| ConfigError::Decode(e.to_string()))
    }

    /// Check that `value` survives the round trip `decode_onto` puts its
    /// base through. NaN and infinite floats, for one, come back as `null`.
    pub fn ensure_mergeable<T>(value: &T) -> Result<(), String>
    where
        T: Serialize + DeserializeOwned,
    {
        let tree = serde_json::to_value(value).map_err(|e| e.to_string())?;
        serde_json::from_value::<T>(tree)
            .map(drop)
            .map_err(|e| e.to_string())
    }

    fn parse(&self, payload: &[u8]) -> Result<Value, ConfigError> {
        match self {
            Format::Json => {
                serde_json::from_slice(payload).map_err(|e| ConfigError::Decode(e.to_string()))
            }
            Format::Toml => {
                let text = std::str::from_utf8(payload)
                    .map_err(|e| ConfigError::Decode(e.to_string()))?;
                toml::from_str(text).map_err(|e| ConfigError::Decode(e.to_string()))
            }
        }
    }
}

/// Merge `patch` into `base`. Objects merge key by key, `null` keeps the
/// base value, anything else replaces it.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        if !value.is_null() {
                            base.insert(key, value);
                        }
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
