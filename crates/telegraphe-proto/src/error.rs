use thiserror::Error;

/// Errors raised by [`crate::AuthKey`] operations.
///
/// These are protocol-sequencing errors: they abort the handshake attempt
/// in progress and require a fresh key exchange. They are never swallowed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthKeyError {
    /// A derived value was requested before the key was populated.
    #[error("Auth key not set")]
    KeyNotSet,

    /// The provided raw key has the wrong length.
    #[error("Invalid auth key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
}

/// Errors raised by the peer identity codec.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PeerError {
    /// Raw peer ids must be strictly positive.
    #[error("Invalid peer id: {0}")]
    InvalidId(i64),
}
