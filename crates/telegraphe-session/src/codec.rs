//! Serialization helpers shared by all session backends.
//!
//! Two forms exist:
//!
//! - the canonical JSON payload `{ mainDcId, keys: { dcId: hexKey },
//!   isTest? }`, used by the callback and key-value backends;
//! - the compact single-key token `'1' + base64url(version ‖ dcId ‖
//!   addrLen(2,BE) ‖ addr ‖ port(2,BE) ‖ rawKey)`, used for small portable
//!   sessions holding exactly one dc and one key.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use telegraphe_proto::constants::STRING_SESSION_VERSION;

use crate::error::{Result, SessionError};
use crate::session::SessionSnapshot;

/// The canonical serialized session shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub main_dc_id: u8,
    /// Hex-encoded raw key bytes per dc.
    pub keys: BTreeMap<u8, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_test: Option<bool>,
}

/// Build the canonical payload from a snapshot.
pub fn payload_from_snapshot(snapshot: &SessionSnapshot) -> SessionPayload {
    SessionPayload {
        main_dc_id: snapshot.main_dc_id,
        keys: snapshot
            .keys
            .iter()
            .map(|(dc, raw)| (*dc, hex::encode(raw)))
            .collect(),
        is_test: snapshot.is_test.then_some(true),
    }
}

/// Rebuild a snapshot from the canonical payload.
///
/// The payload does not carry the endpoint; the caller re-selects the
/// address for the restored dc after loading.
pub fn snapshot_from_payload(payload: &SessionPayload) -> Result<SessionSnapshot> {
    let mut keys = BTreeMap::new();
    for (dc, encoded) in &payload.keys {
        keys.insert(*dc, hex::decode(encoded)?);
    }

    Ok(SessionSnapshot {
        main_dc_id: payload.main_dc_id,
        is_test: payload.is_test.unwrap_or(false),
        keys,
        ..Default::default()
    })
}

/// Encode a snapshot as a compact single-key token.
///
/// Only the main dc's endpoint and key are packed; fails with
/// [`SessionError::MissingAuthKey`] if no key is held for it.
pub fn pack_string_session(snapshot: &SessionSnapshot) -> Result<String> {
    let raw_key = snapshot
        .keys
        .get(&snapshot.main_dc_id)
        .ok_or(SessionError::MissingAuthKey(snapshot.main_dc_id))?;

    let addr = snapshot.server_address.as_bytes();
    let addr_len =
        u16::try_from(addr.len()).map_err(|_| SessionError::InvalidToken)?;

    let mut packed = Vec::with_capacity(1 + 1 + 2 + addr.len() + 2 + raw_key.len());
    packed.push(STRING_SESSION_VERSION);
    packed.push(snapshot.main_dc_id);
    packed.extend_from_slice(&addr_len.to_be_bytes());
    packed.extend_from_slice(addr);
    packed.extend_from_slice(&snapshot.port.to_be_bytes());
    packed.extend_from_slice(raw_key);

    Ok(format!(
        "{}{}",
        STRING_SESSION_VERSION as char,
        URL_SAFE_NO_PAD.encode(packed)
    ))
}

/// Decode a compact single-key token back into a snapshot.
///
/// Rejects tokens whose version marker (the leading character or the
/// packed version byte) does not match [`STRING_SESSION_VERSION`].
pub fn unpack_string_session(token: &str) -> Result<SessionSnapshot> {
    let token = token.trim();
    let mut chars = token.chars();
    let version = chars.next().ok_or(SessionError::InvalidToken)?;
    if version != STRING_SESSION_VERSION as char {
        return Err(SessionError::UnsupportedVersion(version as u8));
    }

    let packed = URL_SAFE_NO_PAD
        .decode(chars.as_str())
        .map_err(|_| SessionError::InvalidToken)?;

    // version(1) + dc(1) + addrLen(2) + port(2) is the minimum frame.
    if packed.len() < 6 {
        return Err(SessionError::InvalidToken);
    }
    if packed[0] != STRING_SESSION_VERSION {
        return Err(SessionError::UnsupportedVersion(packed[0]));
    }

    let main_dc_id = packed[1];
    let addr_len = u16::from_be_bytes([packed[2], packed[3]]) as usize;
    let addr_end = 4 + addr_len;
    if packed.len() < addr_end + 2 {
        return Err(SessionError::InvalidToken);
    }

    let server_address = String::from_utf8(packed[4..addr_end].to_vec())
        .map_err(|_| SessionError::InvalidToken)?;
    let port = u16::from_be_bytes([packed[addr_end], packed[addr_end + 1]]);
    let raw_key = packed[addr_end + 2..].to_vec();

    let mut keys = BTreeMap::new();
    keys.insert(main_dc_id, raw_key);

    Ok(SessionSnapshot {
        main_dc_id,
        server_address,
        port,
        is_test: false,
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_key(dc: u8, addr: &str, port: u16, key_byte: u8) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            main_dc_id: dc,
            server_address: addr.to_owned(),
            port,
            ..Default::default()
        };
        snapshot.keys.insert(dc, vec![key_byte; 256]);
        snapshot
    }

    #[test]
    fn test_string_session_roundtrip() {
        let snapshot = snapshot_with_key(1, "x.y", 80, 0xB7);
        let token = pack_string_session(&snapshot).unwrap();
        let decoded = unpack_string_session(&token).unwrap();

        assert_eq!(decoded.main_dc_id, 1);
        assert_eq!(decoded.server_address, "x.y");
        assert_eq!(decoded.port, 80);
        assert_eq!(decoded.keys[&1], vec![0xB7; 256]);
    }

    #[test]
    fn test_string_session_rejects_wrong_version() {
        let snapshot = snapshot_with_key(1, "x.y", 80, 0xB7);
        let token = pack_string_session(&snapshot).unwrap();
        let tampered = format!("2{}", &token[1..]);

        assert!(matches!(
            unpack_string_session(&tampered),
            Err(SessionError::UnsupportedVersion(b'2'))
        ));
    }

    #[test]
    fn test_string_session_rejects_garbage() {
        assert!(unpack_string_session("").is_err());
        assert!(unpack_string_session("1!!!not-base64!!!").is_err());
        // Valid base64, truncated frame.
        let short = format!("1{}", URL_SAFE_NO_PAD.encode([STRING_SESSION_VERSION, 2]));
        assert!(matches!(
            unpack_string_session(&short),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_pack_requires_key_for_main_dc() {
        let snapshot = SessionSnapshot {
            main_dc_id: 3,
            server_address: "1.2.3.4".into(),
            port: 443,
            ..Default::default()
        };
        assert!(matches!(
            pack_string_session(&snapshot),
            Err(SessionError::MissingAuthKey(3))
        ));
    }

    #[test]
    fn test_payload_shape_and_roundtrip() {
        let mut snapshot = snapshot_with_key(2, "1.2.3.4", 443, 0xAB);
        snapshot.is_test = true;

        let payload = payload_from_snapshot(&snapshot);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["mainDcId"], 2);
        assert_eq!(json["isTest"], true);
        assert_eq!(json["keys"]["2"], hex::encode([0xABu8; 256]));

        let restored = snapshot_from_payload(&payload).unwrap();
        assert_eq!(restored.main_dc_id, 2);
        assert!(restored.is_test);
        assert_eq!(restored.keys[&2], vec![0xAB; 256]);
    }

    #[test]
    fn test_payload_omits_is_test_when_false() {
        let payload = payload_from_snapshot(&snapshot_with_key(2, "a", 443, 1));
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("isTest"));
    }
}
