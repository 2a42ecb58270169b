//! Error types for the relay.

use thiserror::Error;

/// Errors surfaced to code driving the relay.
///
/// Nothing inside the relay loop is fatal; these only cover setup and the
/// command front-end.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration could not be loaded or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Filesystem or transport setup failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The relay event loop is no longer running.
    #[error("relay has stopped")]
    Stopped,
}

pub type Result<T, E = RelayError> = std::result::Result<T, E>;
