//! Marked peer-id codec.
//!
//! The wire protocol addresses three kinds of peers (users, basic groups,
//! broadcast channels) with overlapping positive numeric ids. The client
//! folds them into one flat signed space so a single `i64` disambiguates
//! the kind by sign and magnitude alone:
//!
//! - users pass through unchanged,
//! - groups are negated,
//! - channels are offset by [`CHANNEL_ID_BASE`] and then negated.

use serde::{Deserialize, Serialize};

use crate::constants::CHANNEL_ID_BASE;
use crate::error::PeerError;

/// The three addressable peer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerKind {
    User,
    Group,
    Channel,
}

/// Encode a raw positive id into the flat signed id space.
///
/// Total for any `raw > 0`; the three encoded forms never collide.
pub fn mark_peer_id(raw: i64, kind: PeerKind) -> i64 {
    match kind {
        PeerKind::User => raw,
        PeerKind::Group => -raw,
        PeerKind::Channel => -(raw + CHANNEL_ID_BASE),
    }
}

/// Decode a marked id back into its raw id and kind.
pub fn unmark_peer_id(marked: i64) -> Result<(i64, PeerKind), PeerError> {
    if marked > 0 {
        Ok((marked, PeerKind::User))
    } else if marked < -CHANNEL_ID_BASE {
        Ok((-marked - CHANNEL_ID_BASE, PeerKind::Channel))
    } else if marked < 0 {
        Ok((-marked, PeerKind::Group))
    } else {
        Err(PeerError::InvalidId(marked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ids_pass_through() {
        assert_eq!(mark_peer_id(123456789, PeerKind::User), 123456789);
    }

    #[test]
    fn test_group_ids_are_negated() {
        assert_eq!(mark_peer_id(55, PeerKind::Group), -55);
    }

    #[test]
    fn test_channel_ids_are_offset_then_negated() {
        assert_eq!(mark_peer_id(10, PeerKind::Channel), -(10 + CHANNEL_ID_BASE));
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        for kind in [PeerKind::User, PeerKind::Group, PeerKind::Channel] {
            for raw in [1, 55, 123456789, 999_999_999_999] {
                let marked = mark_peer_id(raw, kind);
                assert_eq!(unmark_peer_id(marked).unwrap(), (raw, kind));
            }
        }
    }

    #[test]
    fn test_encoded_forms_never_collide() {
        for raw in [1, 42, 1_000_000, 999_999_999_999] {
            let user = mark_peer_id(raw, PeerKind::User);
            let group = mark_peer_id(raw, PeerKind::Group);
            let channel = mark_peer_id(raw, PeerKind::Channel);
            assert_ne!(user, group);
            assert_ne!(user, channel);
            assert_ne!(group, channel);
        }
    }

    #[test]
    fn test_zero_is_invalid() {
        assert_eq!(unmark_peer_id(0), Err(PeerError::InvalidId(0)));
    }
}
