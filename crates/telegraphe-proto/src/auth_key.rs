//! The per-data-center authorization key and its derived identity.
//!
//! An [`AuthKey`] is either fully empty or fully populated: the SHA-1 hash,
//! the aux hash and the key id are always recomputed together from the raw
//! key bytes, never stored independently.

use bytes::Bytes;
use rand::RngCore;
use sha1::{Digest, Sha1};
use tokio::sync::watch;

use crate::constants::{AUTH_KEY_SIZE, SHA1_SIZE};
use crate::error::AuthKeyError;

/// Derived identity values, always replaced as one unit.
#[derive(Clone, Copy)]
struct DerivedKey {
    hash: [u8; SHA1_SIZE],
    aux_hash: i64,
    key_id: i64,
}

impl DerivedKey {
    fn compute(raw: &[u8]) -> Self {
        let digest = Sha1::digest(raw);
        let mut hash = [0u8; SHA1_SIZE];
        hash.copy_from_slice(&digest);

        let aux_hash = i64::from_le_bytes(hash[0..8].try_into().expect("8-byte slice"));
        let key_id = i64::from_le_bytes(hash[12..20].try_into().expect("8-byte slice"));

        Self {
            hash,
            aux_hash,
            key_id,
        }
    }
}

/// The shared secret negotiated with one data center, plus the derived
/// values used to tag encrypted frames.
pub struct AuthKey {
    raw: Option<Bytes>,
    derived: Option<DerivedKey>,
    populated_tx: watch::Sender<bool>,
}

impl AuthKey {
    /// Create an empty key. All derived accessors return `None` until
    /// [`AuthKey::set_key`] completes with actual key material.
    pub fn new() -> Self {
        let (populated_tx, _) = watch::channel(false);
        Self {
            raw: None,
            derived: None,
            populated_tx,
        }
    }

    /// Populate the key from raw bytes, or clear it by passing `None`.
    ///
    /// The hash, aux hash and key id are replaced atomically with respect
    /// to observers of this value: no accessor ever sees derived values
    /// computed from a different raw key than the stored one.
    pub async fn set_key(&mut self, raw: Option<&[u8]>) -> Result<(), AuthKeyError> {
        match raw {
            Some(bytes) => {
                if bytes.len() != AUTH_KEY_SIZE {
                    return Err(AuthKeyError::InvalidKeyLength {
                        expected: AUTH_KEY_SIZE,
                        got: bytes.len(),
                    });
                }
                let derived = DerivedKey::compute(bytes);
                self.raw = Some(Bytes::copy_from_slice(bytes));
                self.derived = Some(derived);
                let _ = self.populated_tx.send(true);
            }
            None => {
                self.raw = None;
                self.derived = None;
                let _ = self.populated_tx.send(false);
            }
        }
        Ok(())
    }

    /// Populate this key by cloning another key's raw bytes.
    /// Cloning an empty key clears this one.
    pub async fn set_key_from(&mut self, other: &AuthKey) -> Result<(), AuthKeyError> {
        let raw = other.raw.clone();
        self.set_key(raw.as_deref()).await
    }

    /// Wait until the key id becomes defined.
    ///
    /// Resolves immediately if the key is already populated, otherwise when
    /// the next populating [`AuthKey::set_key`] completes.
    pub async fn wait_for_key(&self) {
        let mut rx = self.populated_tx.subscribe();
        let _ = rx.wait_for(|populated| *populated).await;
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
    }

    /// Raw key bytes, if populated.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// SHA-1 hash of the raw key.
    pub fn hash(&self) -> Option<&[u8; SHA1_SIZE]> {
        self.derived.as_ref().map(|d| &d.hash)
    }

    /// First 8 bytes of the hash as a signed little-endian integer.
    pub fn aux_hash(&self) -> Option<i64> {
        self.derived.as_ref().map(|d| d.aux_hash)
    }

    /// Last 8 bytes of the hash as a signed little-endian integer.
    pub fn key_id(&self) -> Option<i64> {
        self.derived.as_ref().map(|d| d.key_id)
    }

    /// Compute the handshake confirmation hash for a client nonce.
    ///
    /// Hashes `new_nonce (16 bytes LE) ‖ selector (1 byte) ‖ aux_hash
    /// (8 bytes LE)` with SHA-1 and returns digest bytes `[4, 20)` as a
    /// signed little-endian 128-bit integer.
    ///
    /// Fails with [`AuthKeyError::KeyNotSet`] if the key is empty. The
    /// handshake attempt in progress must then be aborted and restarted
    /// with a fresh key exchange.
    pub fn calc_new_nonce_hash(
        &self,
        new_nonce: u128,
        selector: u8,
    ) -> Result<i128, AuthKeyError> {
        let aux_hash = self.aux_hash().ok_or(AuthKeyError::KeyNotSet)?;

        let mut data = [0u8; 16 + 1 + 8];
        data[0..16].copy_from_slice(&new_nonce.to_le_bytes());
        data[16] = selector;
        data[17..25].copy_from_slice(&aux_hash.to_le_bytes());

        let digest = Sha1::digest(data);
        let tail: [u8; 16] = digest[4..20].try_into().expect("16-byte slice");
        Ok(i128::from_le_bytes(tail))
    }
}

impl Default for AuthKey {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for AuthKey {
    fn clone(&self) -> Self {
        let (populated_tx, _) = watch::channel(self.raw.is_some());
        Self {
            raw: self.raw.clone(),
            derived: self.derived,
            populated_tx,
        }
    }
}

impl PartialEq for AuthKey {
    /// Two keys are equal iff both are populated and their raw bytes match.
    fn eq(&self, other: &Self) -> bool {
        match (&self.raw, &other.raw) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log raw key material.
        f.debug_struct("AuthKey")
            .field("key_id", &self.key_id())
            .finish()
    }
}

/// Generate a random client `new_nonce` for the handshake.
pub fn new_nonce() -> u128 {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    u128::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    const TEST_NONCE: u128 = 0x0123456789ABCDEF0123456789ABCDEF;

    fn patterned_key() -> Vec<u8> {
        (0..=255u8).collect()
    }

    #[tokio::test]
    async fn test_derivation_is_deterministic() {
        let raw = [0xABu8; 256];

        let mut a = AuthKey::new();
        a.set_key(Some(&raw)).await.unwrap();
        let mut b = AuthKey::new();
        b.set_key(Some(&raw)).await.unwrap();

        // SHA1([0xAB; 256]) = 6cd7c9c9abaa1fcd7b756366415f8f57cb6e1e09
        assert_eq!(a.aux_hash(), Some(-3666023916854716564));
        assert_eq!(a.key_id(), Some(657084415269101377));
        assert_eq!(a.aux_hash(), b.aux_hash());
        assert_eq!(a.key_id(), b.key_id());
    }

    #[tokio::test]
    async fn test_different_keys_different_ids() {
        let mut a = AuthKey::new();
        a.set_key(Some(&[0xABu8; 256])).await.unwrap();
        let mut b = AuthKey::new();
        b.set_key(Some(&patterned_key())).await.unwrap();

        assert_eq!(b.aux_hash(), Some(7534231595173418569));
        assert_eq!(b.key_id(), Some(-3972359982579920590));
        assert_ne!(a.key_id(), b.key_id());
    }

    #[tokio::test]
    async fn test_wrong_length_rejected() {
        let mut key = AuthKey::new();
        let err = key.set_key(Some(&[0u8; 32])).await.unwrap_err();
        assert_eq!(
            err,
            AuthKeyError::InvalidKeyLength {
                expected: 256,
                got: 32
            }
        );
        assert!(key.is_empty());
    }

    #[tokio::test]
    async fn test_clear_resets_all_derived_values() {
        let mut key = AuthKey::new();
        key.set_key(Some(&[0xABu8; 256])).await.unwrap();
        assert!(key.key_id().is_some());

        key.set_key(None).await.unwrap();
        assert!(key.is_empty());
        assert!(key.key_id().is_none());
        assert!(key.aux_hash().is_none());
        assert!(key.hash().is_none());
    }

    #[tokio::test]
    async fn test_clone_from_other_key() {
        let mut original = AuthKey::new();
        original.set_key(Some(&patterned_key())).await.unwrap();

        let mut copy = AuthKey::new();
        copy.set_key_from(&original).await.unwrap();

        assert_eq!(copy, original);
        assert_eq!(copy.key_id(), original.key_id());
    }

    #[tokio::test]
    async fn test_equality_requires_both_populated() {
        let empty_a = AuthKey::new();
        let empty_b = AuthKey::new();
        assert_ne!(empty_a, empty_b);

        let mut populated = AuthKey::new();
        populated.set_key(Some(&[0xABu8; 256])).await.unwrap();
        assert_ne!(populated, empty_a);
    }

    #[tokio::test]
    async fn test_new_nonce_hash_selector_sensitivity() {
        let mut key = AuthKey::new();
        key.set_key(Some(&[0xABu8; 256])).await.unwrap();

        let h1 = key.calc_new_nonce_hash(TEST_NONCE, 1).unwrap();
        let h2 = key.calc_new_nonce_hash(TEST_NONCE, 2).unwrap();
        let h3 = key.calc_new_nonce_hash(TEST_NONCE, 3).unwrap();

        assert_eq!(h1, -7733290008449839700847124146117439505);
        assert_eq!(h2, 148092009363321535856146533485142003382);
        assert_eq!(h3, 108827767267623598844073069198666413000);

        // Deterministic for fixed inputs.
        assert_eq!(h1, key.calc_new_nonce_hash(TEST_NONCE, 1).unwrap());
    }

    #[tokio::test]
    async fn test_new_nonce_hash_on_empty_key_fails() {
        let key = AuthKey::new();
        assert_eq!(
            key.calc_new_nonce_hash(TEST_NONCE, 1),
            Err(AuthKeyError::KeyNotSet)
        );
    }

    #[tokio::test]
    async fn test_wait_for_key_resolves_after_set() {
        let mut key = AuthKey::new();

        // Pending while empty.
        assert!(key.wait_for_key().now_or_never().is_none());

        key.set_key(Some(&[0xABu8; 256])).await.unwrap();
        assert!(key.wait_for_key().now_or_never().is_some());
    }
}
