//! Session state and the generic persistence wrapper.

use std::collections::{BTreeMap, HashMap};

use telegraphe_proto::constants::DEFAULT_DC_PORT;
use telegraphe_proto::AuthKey;

use crate::backend::SessionBackend;
use crate::error::Result;

/// Plain owned copy of everything a backend may persist.
///
/// Backends pick the fields they care about: the canonical JSON payload
/// keeps the dc id and keys, the compact string token additionally packs
/// the endpoint, memory keeps nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub main_dc_id: u8,
    pub server_address: String,
    pub port: u16,
    pub is_test: bool,
    /// Raw auth key bytes per dc, ordered for stable serialization.
    pub keys: BTreeMap<u8, Vec<u8>>,
}

/// In-memory session state: the active endpoint plus one auth key per dc.
///
/// The state owns all its keys. Selecting a new endpoint for a dc discards
/// any key previously held for it: a new endpoint cannot reuse an old key.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    dc_id: u8,
    server_address: String,
    port: u16,
    is_test: bool,
    auth_keys: HashMap<u8, AuthKey>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            port: DEFAULT_DC_PORT,
            ..Self::default()
        }
    }

    pub fn dc_id(&self) -> u8 {
        self.dc_id
    }

    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_test(&self) -> bool {
        self.is_test
    }

    /// Record the active endpoint for `dc_id`, dropping any auth key held
    /// for that dc.
    pub fn set_dc(&mut self, dc_id: u8, server_address: &str, port: u16, is_test: bool) {
        self.dc_id = dc_id;
        self.server_address = server_address.to_owned();
        self.port = port;
        self.is_test = is_test;
        self.auth_keys.remove(&dc_id);
    }

    /// Auth key for `dc_id`, defaulting to the current dc.
    pub fn auth_key(&self, dc_id: Option<u8>) -> Option<&AuthKey> {
        self.auth_keys.get(&dc_id.unwrap_or(self.dc_id))
    }

    /// Store an auth key for `dc_id`, defaulting to the current dc.
    pub fn set_auth_key(&mut self, key: AuthKey, dc_id: Option<u8>) {
        self.auth_keys.insert(dc_id.unwrap_or(self.dc_id), key);
    }

    /// Owned copy of the persistable state. Empty keys are skipped.
    pub fn snapshot(&self) -> SessionSnapshot {
        let keys = self
            .auth_keys
            .iter()
            .filter_map(|(dc, key)| key.raw_bytes().map(|raw| (*dc, raw.to_vec())))
            .collect();

        SessionSnapshot {
            main_dc_id: self.dc_id,
            server_address: self.server_address.clone(),
            port: self.port,
            is_test: self.is_test,
            keys,
        }
    }

    /// Restore state from a snapshot without touching any backend.
    ///
    /// Key material that fails to populate (wrong length from a corrupt
    /// store) is skipped with a warning rather than propagated; the dc
    /// will simply re-authenticate.
    pub async fn apply(&mut self, snapshot: &SessionSnapshot) {
        self.dc_id = snapshot.main_dc_id;
        if !snapshot.server_address.is_empty() {
            self.server_address = snapshot.server_address.clone();
            self.port = snapshot.port;
        }
        self.is_test = snapshot.is_test;

        self.auth_keys.clear();
        for (dc, raw) in &snapshot.keys {
            let mut key = AuthKey::new();
            match key.set_key(Some(raw)).await {
                Ok(()) => {
                    self.auth_keys.insert(*dc, key);
                }
                Err(e) => {
                    tracing::warn!(dc, error = %e, "Skipping unusable persisted auth key");
                }
            }
        }
    }
}

/// A session bound to a persistence backend.
///
/// Mutating calls write through to the backend; a failed write is logged
/// as a warning and the in-memory state stays authoritative until the next
/// mutating call retries the save.
pub struct Session<B: SessionBackend> {
    state: SessionState,
    backend: B,
}

impl<B: SessionBackend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            state: SessionState::new(),
            backend,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn dc_id(&self) -> u8 {
        self.state.dc_id()
    }

    pub fn server_address(&self) -> &str {
        self.state.server_address()
    }

    pub fn port(&self) -> u16 {
        self.state.port()
    }

    pub fn is_test(&self) -> bool {
        self.state.is_test()
    }

    pub fn auth_key(&self, dc_id: Option<u8>) -> Option<&AuthKey> {
        self.state.auth_key(dc_id)
    }

    /// Select the endpoint for a dc and persist the change.
    pub async fn set_dc(&mut self, dc_id: u8, server_address: &str, port: u16, is_test: bool) {
        self.state.set_dc(dc_id, server_address, port, is_test);
        self.try_save().await;
    }

    /// Store an auth key and persist the change.
    pub async fn set_auth_key(&mut self, key: AuthKey, dc_id: Option<u8>) {
        self.state.set_auth_key(key, dc_id);
        self.try_save().await;
    }

    /// Persist the current state through the backend.
    pub async fn save(&mut self) -> Result<()> {
        let snapshot = self.state.snapshot();
        self.backend.persist(Some(&snapshot)).await
    }

    /// Restore state from the backend.
    ///
    /// Applying the restored snapshot does not write back: the load path
    /// must not trigger a redundant persistence update.
    pub async fn load(&mut self) -> Result<()> {
        if let Some(snapshot) = self.backend.restore().await? {
            self.state.apply(&snapshot).await;
        }
        Ok(())
    }

    /// Remove all persisted state. In-memory state is left untouched.
    pub async fn delete(&mut self) -> Result<()> {
        self.backend.persist(None).await
    }

    async fn try_save(&mut self) {
        if let Err(e) = self.save().await {
            tracing::warn!(error = %e, "Session save failed; state kept in memory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    async fn key_from(byte: u8) -> AuthKey {
        let mut key = AuthKey::new();
        key.set_key(Some(&[byte; 256])).await.unwrap();
        key
    }

    #[tokio::test]
    async fn test_set_dc_discards_key_for_that_dc() {
        let mut state = SessionState::new();
        state.set_dc(2, "1.2.3.4", 443, false);
        state.set_auth_key(key_from(0x11).await, None);
        assert!(state.auth_key(Some(2)).is_some());

        state.set_dc(2, "5.6.7.8", 443, false);
        assert!(state.auth_key(Some(2)).is_none());
    }

    #[tokio::test]
    async fn test_keys_are_scoped_per_dc() {
        let mut state = SessionState::new();
        state.set_dc(2, "1.2.3.4", 443, false);
        state.set_auth_key(key_from(0x11).await, Some(2));
        state.set_auth_key(key_from(0x22).await, Some(4));

        // Re-homing dc 2 leaves dc 4's key alone.
        state.set_dc(2, "9.9.9.9", 443, false);
        assert!(state.auth_key(Some(2)).is_none());
        assert!(state.auth_key(Some(4)).is_some());
    }

    #[tokio::test]
    async fn test_snapshot_apply_roundtrip() {
        let mut state = SessionState::new();
        state.set_dc(2, "1.2.3.4", 443, true);
        state.set_auth_key(key_from(0xAB).await, None);

        let snapshot = state.snapshot();
        let mut restored = SessionState::new();
        restored.apply(&snapshot).await;

        assert_eq!(restored.dc_id(), 2);
        assert_eq!(restored.server_address(), "1.2.3.4");
        assert_eq!(restored.port(), 443);
        assert!(restored.is_test());
        assert_eq!(
            restored.auth_key(None).unwrap().raw_bytes(),
            state.auth_key(None).unwrap().raw_bytes()
        );
    }

    #[tokio::test]
    async fn test_corrupt_key_material_is_skipped() {
        let mut snapshot = SessionSnapshot {
            main_dc_id: 2,
            ..Default::default()
        };
        snapshot.keys.insert(2, vec![0u8; 5]);

        let mut state = SessionState::new();
        state.apply(&snapshot).await;
        assert!(state.auth_key(Some(2)).is_none());
    }

    #[tokio::test]
    async fn test_memory_session_contract() {
        let mut session = Session::new(MemoryBackend);
        session.set_dc(2, "1.2.3.4", 443, false).await;
        session.set_auth_key(key_from(0xCD).await, None).await;

        session.save().await.unwrap();
        session.load().await.unwrap();
        session.delete().await.unwrap();

        // Memory backend persists nothing but never loses live state.
        assert_eq!(session.dc_id(), 2);
        assert!(session.auth_key(None).is_some());
    }
}
