//! Session persistence backends.

use std::sync::Arc;

use crate::codec::{
    pack_string_session, payload_from_snapshot, snapshot_from_payload, unpack_string_session,
    SessionPayload,
};
use crate::error::Result;
use crate::session::SessionSnapshot;

/// Where session bytes live.
///
/// `persist(None)` removes all persisted state. `restore` returning
/// `Ok(None)` means "no session": the caller starts fresh and
/// re-authenticates.
#[allow(async_fn_in_trait)]
pub trait SessionBackend {
    async fn persist(&mut self, snapshot: Option<&SessionSnapshot>) -> Result<()>;
    async fn restore(&mut self) -> Result<Option<SessionSnapshot>>;
}

/// Ephemeral sessions: nothing is ever persisted.
pub struct MemoryBackend;

impl SessionBackend for MemoryBackend {
    async fn persist(&mut self, _snapshot: Option<&SessionSnapshot>) -> Result<()> {
        Ok(())
    }

    async fn restore(&mut self) -> Result<Option<SessionSnapshot>> {
        Ok(None)
    }
}

/// Compact single-key token backend.
///
/// Holds exactly one dc endpoint and one raw key as a small portable
/// string; multi-dc sessions need one of the other backends.
pub struct StringBackend {
    token: Option<String>,
}

impl StringBackend {
    /// Start from an existing token, or `None` for a fresh session.
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// The current encoded token, if a session has been saved or supplied.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl SessionBackend for StringBackend {
    async fn persist(&mut self, snapshot: Option<&SessionSnapshot>) -> Result<()> {
        self.token = match snapshot {
            Some(snapshot) => Some(pack_string_session(snapshot)?),
            None => None,
        };
        Ok(())
    }

    async fn restore(&mut self) -> Result<Option<SessionSnapshot>> {
        // Version mismatch is a hard error here: the token was supplied
        // explicitly and silently ignoring it would discard a credential.
        self.token
            .as_deref()
            .map(unpack_string_session)
            .transpose()
    }
}

/// Host callback invoked with the full canonical payload on every
/// mutation, `None` on delete.
pub type OnSessionUpdate = Arc<dyn Fn(Option<SessionPayload>) + Send + Sync>;

/// Backend for embedders that own physical storage themselves.
///
/// Performs no I/O: every mutation hands the serialized shape to the host
/// callback, and the initial state (if any) is supplied at construction.
pub struct CallbackBackend {
    initial: Option<SessionPayload>,
    on_update: OnSessionUpdate,
}

impl CallbackBackend {
    pub fn new(initial: Option<SessionPayload>, on_update: OnSessionUpdate) -> Self {
        Self { initial, on_update }
    }
}

impl SessionBackend for CallbackBackend {
    async fn persist(&mut self, snapshot: Option<&SessionSnapshot>) -> Result<()> {
        (self.on_update)(snapshot.map(payload_from_snapshot));
        Ok(())
    }

    async fn restore(&mut self) -> Result<Option<SessionSnapshot>> {
        self.initial
            .as_ref()
            .map(snapshot_from_payload)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use telegraphe_proto::AuthKey;

    use crate::session::Session;

    async fn key_from(byte: u8) -> AuthKey {
        let mut key = AuthKey::new();
        key.set_key(Some(&[byte; 256])).await.unwrap();
        key
    }

    #[tokio::test]
    async fn test_string_backend_roundtrip() {
        let mut session = Session::new(StringBackend::new(None));
        session.set_dc(1, "x.y", 80, false).await;
        session.set_auth_key(key_from(0xB7).await, None).await;

        let token = session.backend().token().unwrap().to_owned();

        let mut restored = Session::new(StringBackend::new(Some(token)));
        restored.load().await.unwrap();

        assert_eq!(restored.dc_id(), 1);
        assert_eq!(restored.server_address(), "x.y");
        assert_eq!(restored.port(), 80);
        assert_eq!(
            restored.auth_key(None).unwrap().raw_bytes().unwrap(),
            &[0xB7u8; 256][..]
        );
    }

    #[tokio::test]
    async fn test_string_backend_rejects_bad_version_on_load() {
        let mut session = Session::new(StringBackend::new(Some("9AAAA".into())));
        assert!(session.load().await.is_err());
    }

    #[tokio::test]
    async fn test_string_backend_delete_clears_token() {
        let mut session = Session::new(StringBackend::new(None));
        session.set_dc(1, "x.y", 80, false).await;
        session.set_auth_key(key_from(0xB7).await, None).await;
        assert!(session.backend().token().is_some());

        session.delete().await.unwrap();
        assert!(session.backend().token().is_none());
    }

    #[tokio::test]
    async fn test_callback_backend_reports_every_mutation() {
        let seen: Arc<Mutex<Vec<Option<SessionPayload>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let on_update: OnSessionUpdate =
            Arc::new(move |payload| sink.lock().unwrap().push(payload));

        let mut session = Session::new(CallbackBackend::new(None, on_update));
        session.set_dc(2, "1.2.3.4", 443, true).await;
        session.set_auth_key(key_from(0xAB).await, None).await;
        session.delete().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);

        let after_key = seen[1].as_ref().unwrap();
        assert_eq!(after_key.main_dc_id, 2);
        assert_eq!(after_key.is_test, Some(true));
        assert_eq!(after_key.keys[&2], hex::encode([0xABu8; 256]));

        // Delete reports the absence of a session.
        assert!(seen[2].is_none());
    }

    #[tokio::test]
    async fn test_callback_backend_restores_initial_payload() {
        let initial = SessionPayload {
            main_dc_id: 2,
            keys: [(2u8, hex::encode([0x55u8; 256]))].into_iter().collect(),
            is_test: None,
        };
        let updates = Arc::new(Mutex::new(0usize));
        let counter = updates.clone();
        let on_update: OnSessionUpdate = Arc::new(move |_| *counter.lock().unwrap() += 1);

        let mut session = Session::new(CallbackBackend::new(Some(initial), on_update));
        session.load().await.unwrap();

        assert_eq!(session.dc_id(), 2);
        assert_eq!(
            session.auth_key(None).unwrap().raw_bytes().unwrap(),
            &[0x55u8; 256][..]
        );
        // Loading never writes back through the callback.
        assert_eq!(*updates.lock().unwrap(), 0);
    }
}
