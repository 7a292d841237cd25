//! Key-value-store-backed sessions.
//!
//! The [`KvStore`] trait is the integration seam for host storage (a cache
//! API, local storage, a key-value database). The session payload is
//! serialized as JSON under one namespaced key; load failures degrade to
//! "no session" instead of propagating.

use std::collections::HashMap;

use telegraphe_proto::constants::SESSION_KV_PREFIX;

use crate::backend::SessionBackend;
use crate::codec::{payload_from_snapshot, snapshot_from_payload, SessionPayload};
use crate::error::Result;
use crate::session::SessionSnapshot;

/// Minimal asynchronous key-value store contract.
///
/// Host implementations wrap whatever storage they have; errors are
/// surfaced as `anyhow` so nothing about the store leaks into the session
/// layer.
#[allow(async_fn_in_trait)]
pub trait KvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn put(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn delete(&mut self, key: &str) -> anyhow::Result<()>;
}

/// In-process store, mainly for tests and ephemeral embedders.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: HashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed an entry, bypassing the session layer.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    async fn put(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Session backend over any [`KvStore`].
pub struct KvBackend<S: KvStore> {
    store: S,
    key: String,
}

impl<S: KvStore> KvBackend<S> {
    /// `name` distinguishes multiple sessions sharing one store.
    pub fn new(store: S, name: &str) -> Self {
        Self {
            store,
            key: format!("{SESSION_KV_PREFIX}:{name}"),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }
}

impl<S: KvStore> SessionBackend for KvBackend<S> {
    async fn persist(&mut self, snapshot: Option<&SessionSnapshot>) -> Result<()> {
        match snapshot {
            Some(snapshot) => {
                let json = serde_json::to_string(&payload_from_snapshot(snapshot))?;
                self.store.put(&self.key, &json).await?;
            }
            None => self.store.delete(&self.key).await?,
        }
        Ok(())
    }

    async fn restore(&mut self) -> Result<Option<SessionSnapshot>> {
        let raw = match self.store.get(&self.key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Session store read failed");
                return Ok(None);
            }
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        let payload: SessionPayload = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Corrupt session payload, starting fresh");
                return Ok(None);
            }
        };

        match snapshot_from_payload(&payload) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Unusable session payload, starting fresh");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use telegraphe_proto::AuthKey;

    use crate::session::Session;

    async fn key_from(byte: u8) -> AuthKey {
        let mut key = AuthKey::new();
        key.set_key(Some(&[byte; 256])).await.unwrap();
        key
    }

    #[tokio::test]
    async fn test_kv_session_roundtrip() {
        let mut session = Session::new(KvBackend::new(MemoryKvStore::new(), "main"));
        session.set_dc(2, "1.2.3.4", 443, false).await;
        session.set_auth_key(key_from(0xAB).await, None).await;

        // Move the underlying entries into a fresh session.
        let mut store = MemoryKvStore::new();
        let saved = session
            .backend()
            .store()
            .get(session.backend().storage_key())
            .await
            .unwrap()
            .unwrap();
        store.insert("telegraphe:session:main", &saved);

        let mut restored = Session::new(KvBackend::new(store, "main"));
        restored.load().await.unwrap();

        assert_eq!(restored.dc_id(), 2);
        assert_eq!(
            restored.auth_key(None).unwrap().raw_bytes().unwrap(),
            &[0xABu8; 256][..]
        );
    }

    #[tokio::test]
    async fn test_missing_entry_means_no_session() {
        let mut session = Session::new(KvBackend::new(MemoryKvStore::new(), "main"));
        session.load().await.unwrap();
        assert_eq!(session.dc_id(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_json_degrades_to_no_session() {
        let mut store = MemoryKvStore::new();
        store.insert("telegraphe:session:main", "{not json");

        let mut session = Session::new(KvBackend::new(store, "main"));
        session.load().await.unwrap();
        assert_eq!(session.dc_id(), 0);
        assert!(session.auth_key(None).is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let mut session = Session::new(KvBackend::new(MemoryKvStore::new(), "main"));
        session.set_dc(2, "1.2.3.4", 443, false).await;
        session.delete().await.unwrap();

        let stored = session
            .backend()
            .store()
            .get("telegraphe:session:main")
            .await
            .unwrap();
        assert!(stored.is_none());
    }
}
