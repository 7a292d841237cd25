//! # telegraphe-session
//!
//! Persistent per-connection state: the selected data-center endpoint and
//! one [`telegraphe_proto::AuthKey`] per data center.
//!
//! One logical shape, several interchangeable places for the bytes to
//! live: process memory, a compact single-key token string, a host
//! callback, or a key-value store (in-memory or SQLite-backed).

pub mod backend;
pub mod codec;
pub mod kv;
pub mod session;
pub mod sqlite;

mod error;

pub use backend::{CallbackBackend, MemoryBackend, SessionBackend, StringBackend};
pub use codec::{pack_string_session, payload_from_snapshot, unpack_string_session, SessionPayload};
pub use error::{Result, SessionError};
pub use kv::{KvBackend, KvStore, MemoryKvStore};
pub use session::{Session, SessionSnapshot, SessionState};
pub use sqlite::SqliteKvStore;
