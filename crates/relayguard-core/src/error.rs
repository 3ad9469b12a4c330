//! Error types for relayguard.

use thiserror::Error;

/// Result type alias using relayguard's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for relayguard operations.
///
/// Detection itself never surfaces these to the relay path; they are used by
/// collaborators (file fetchers, configuration, client construction).
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File could not be fetched from the chat transport
    #[error("File fetch error: {0}")]
    FileFetch(String),
}
