//! SQLite-backed key-value store.
//!
//! The [`SqliteKvStore`] owns a [`rusqlite::Connection`] and guarantees
//! that the schema exists before any other operation. It is the on-disk
//! home for sessions when the embedding application does not bring its
//! own storage.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, SessionError};
use crate::kv::KvStore;

/// Wrapper around a [`rusqlite::Connection`] exposing the [`KvStore`]
/// contract.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Open (or create) the default application store.
    ///
    /// The database file is placed in the platform-appropriate data
    /// directory, e.g. `~/.local/share/telegraphe/telegraphe.db` on Linux.
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "telegraphe", "telegraphe").ok_or(SessionError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("telegraphe.db");

        tracing::info!(path = %db_path.display(), "opening session store");

        Self::open_at(&db_path)
    }

    /// Open (or create) a store at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        Ok(Self { conn })
    }

    /// Return the filesystem path of the open store (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn put(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use telegraphe_proto::AuthKey;

    use crate::kv::KvBackend;
    use crate::session::Session;

    #[tokio::test]
    async fn test_open_and_put_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut store = SqliteKvStore::open_at(&path).expect("should open");
        assert!(store.path().is_some());

        store.put("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.put("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let store = SqliteKvStore::open_at(&path).unwrap();
            let mut session = Session::new(KvBackend::new(store, "main"));
            session.set_dc(2, "1.2.3.4", 443, false).await;
            let mut key = AuthKey::new();
            key.set_key(Some(&[0xABu8; 256])).await.unwrap();
            session.set_auth_key(key, None).await;
        }

        let store = SqliteKvStore::open_at(&path).unwrap();
        let mut session = Session::new(KvBackend::new(store, "main"));
        session.load().await.unwrap();

        assert_eq!(session.dc_id(), 2);
        assert_eq!(
            session.auth_key(None).unwrap().raw_bytes().unwrap(),
            &[0xABu8; 256][..]
        );
    }
}
