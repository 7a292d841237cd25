//! Server-corrected clock.
//!
//! The server reports its clock drift through a dedicated update; handlers
//! that stamp ephemeral entities (service notifications, mute expiries)
//! must use the corrected time. The offset is shared process-wide through
//! cheap clones of one [`ServerClock`] rather than module-level globals, so
//! tests can inject deterministic time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

/// A wall clock with an adjustable server offset, in whole seconds.
///
/// Clones share the same offset.
#[derive(Clone, Debug, Default)]
pub struct ServerClock {
    offset_secs: Arc<AtomicI64>,
    /// Fixed base instant for tests; `None` means the system clock.
    base_unix: Option<i64>,
}

impl ServerClock {
    /// A clock following system time, with zero initial offset.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock pinned to a fixed instant, for deterministic tests.
    pub fn fixed(base_unix: i64) -> Self {
        Self {
            offset_secs: Arc::new(AtomicI64::new(0)),
            base_unix: Some(base_unix),
        }
    }

    /// Current server clock offset in seconds.
    pub fn offset(&self) -> i64 {
        self.offset_secs.load(Ordering::Relaxed)
    }

    /// Replace the server clock offset. Visible to all clones.
    pub fn set_offset(&self, secs: i64) {
        self.offset_secs.store(secs, Ordering::Relaxed);
    }

    /// Server-corrected "now" as a unix timestamp in seconds.
    pub fn now_unix(&self) -> i64 {
        let local = self.base_unix.unwrap_or_else(|| Utc::now().timestamp());
        local + self.offset()
    }

    /// Server-corrected "now" as a [`DateTime<Utc>`].
    pub fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.now_unix(), 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}
