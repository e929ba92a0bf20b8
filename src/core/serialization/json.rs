/*!
 * JSON Serialization
 * Thin, strongly-typed wrappers over serde_json for the durable blob
 */

use serde::{de::DeserializeOwned, Serialize};

/// Result type for JSON operations
pub type JsonResult<T> = Result<T, JsonError>;

/// JSON operation errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JsonError {
    #[error("Serialization failed: {context}")]
    Serialization {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Deserialization failed: {context}")]
    Deserialization {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Serialize to compact JSON bytes
#[inline]
pub fn to_vec<T: Serialize>(value: &T) -> JsonResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| JsonError::Serialization {
        context: "durable state",
        source,
    })
}

/// Deserialize from JSON bytes
#[inline]
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> JsonResult<T> {
    serde_json::from_slice(bytes).map_err(|source| JsonError::Deserialization {
        context: "durable state",
        source,
    })
}
