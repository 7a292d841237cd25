//! # telegraphe-proto
//!
//! Protocol primitives shared by the Telegraphe client engine: the
//! authentication key and its SHA-1-derived identity, the marked peer-id
//! codec, and the server-corrected clock.
//!
//! Everything here is a leaf: no persistence, no networking, no update
//! handling. Those layers live in `telegraphe-session` and
//! `telegraphe-client`.

pub mod auth_key;
pub mod clock;
pub mod constants;
pub mod peer;

mod error;

pub use auth_key::{new_nonce, AuthKey};
pub use clock::ServerClock;
pub use error::{AuthKeyError, PeerError};
pub use peer::{mark_peer_id, unmark_peer_id, PeerKind};
