use std::io;

use thiserror::Error;

use crate::types::StoreKey;

/// Error type for parsing, persistence, and pipeline failures.
#[derive(Debug, Error)]
pub enum CompsError {
    /// Input text or a pattern could not be processed.
    #[error("comparable data could not be parsed: {0}")]
    Parse(String),
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Backend read, write, or lock failure.
    #[error("store failure: {0}")]
    Store(String),
    /// A stored value failed to decode.
    #[error("stored value for '{key}' is corrupt: {reason}")]
    Corrupt {
        /// Store key that held the value.
        key: StoreKey,
        /// Decoder message.
        reason: String,
    },
    /// A named deal or lease does not exist.
    #[error("no entry found for '{0}'")]
    NotFound(String),
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
