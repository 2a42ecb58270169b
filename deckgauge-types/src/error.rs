//! Errors raised while decoding producer payloads.

use thiserror::Error;

/// Reasons a raw payload was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not JSON at all.
    #[error("payload is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// The payload carries a `messageType` this schema does not know.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// The payload is JSON of the right kind but with the wrong fields.
    #[error("malformed {expected} payload: {source}")]
    Shape {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The payload is neither a catalog announcement nor a measurement array.
    #[error("payload is neither a catalog announcement nor a measurement array")]
    Unrecognized,
}
