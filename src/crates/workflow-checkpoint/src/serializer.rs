//! Serialization protocol used by on-disk checkpoint stores

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Protocol for serializing and deserializing checkpoint data
///
/// Implementations can provide custom encodings; the file store only needs
/// bytes in and bytes out.
pub trait SerializerProtocol: Send + Sync {
    /// Serialize a value to bytes
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes
    fn loads<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T>;

    /// File extension (without the dot) for files written with this encoding
    fn extension(&self) -> &'static str;
}

/// JSON serializer (default)
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented output, convenient when operators inspect checkpoint files
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl SerializerProtocol for JsonSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        if self.pretty {
            Ok(serde_json::to_vec_pretty(value)?)
        } else {
            Ok(serde_json::to_vec(value)?)
        }
    }

    fn loads<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
