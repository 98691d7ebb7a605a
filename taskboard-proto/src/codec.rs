//! JSON encoding for the task/user API bodies.
//!
//! The HTTP client decodes every response body through these helpers, so a
//! malformed body surfaces as a [`CodecError`] rather than a transport error.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::task::Task;
use crate::user::User;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Encodes any API body to JSON bytes.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the value cannot be serialized.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes any API body from JSON bytes.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the bytes are not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes a task collection.
///
/// # Errors
///
/// Returns `CodecError::Serialization` on malformed input.
pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>, CodecError> {
    decode(bytes)
}

/// Decodes a user collection.
///
/// # Errors
///
/// Returns `CodecError::Serialization` on malformed input.
pub fn decode_users(bytes: &[u8]) -> Result<Vec<User>, CodecError> {
    decode(bytes)
}
