use thiserror::Error;

use telegraphe_proto::AuthKeyError;

/// Errors produced by the session layer.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A string session token carries an unknown version marker.
    #[error("Unsupported session token version: {0}")]
    UnsupportedVersion(u8),

    /// A string session token is malformed (bad base64, truncated fields).
    #[error("Invalid session token")]
    InvalidToken,

    /// Serialization requires an auth key for the given dc, none is held.
    #[error("No auth key for dc {0}")]
    MissingAuthKey(u8),

    /// Auth key error while restoring persisted key material.
    #[error("Auth key error: {0}")]
    AuthKey(#[from] AuthKeyError),

    /// JSON (de)serialization of the canonical payload failed.
    #[error("Payload error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decoding of persisted key material failed.
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// SQLite error from the key-value store.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the store directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error surfaced by a host-supplied key-value store.
    #[error("Store error: {0}")]
    Store(anyhow::Error),
}

// anyhow::Error does not implement std::error::Error, so thiserror's
// #[from] cannot be used for this variant.
impl From<anyhow::Error> for SessionError {
    fn from(e: anyhow::Error) -> Self {
        Self::Store(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SessionError>;
