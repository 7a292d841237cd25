//! In-memory entity cache mutated by the dispatcher.
//!
//! The dispatcher records entity side effects here before emitting the
//! corresponding event, so a sink that looks the entity up always sees
//! the post-update state. The cache is shared (`Arc<Mutex<_>>`) because
//! the embedding application reads it from other tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::wire::{RawEntity, RawPhoto};

/// Cached per-chat state the dispatcher maintains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedChat {
    pub photo: Option<RawPhoto>,
}

/// Cached per-user state the dispatcher maintains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedUser {
    pub is_self: bool,
    pub is_contact: bool,
    pub is_mutual_contact: bool,
    pub photo: Option<RawPhoto>,
}

/// Entities seen so far, keyed by marked peer id (chats) or raw user id.
#[derive(Debug, Default)]
pub struct EntityCache {
    chats: HashMap<i64, CachedChat>,
    users: HashMap<i64, CachedUser>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the entities attached to an update.
    pub fn absorb(&mut self, entities: &[RawEntity]) {
        for entity in entities {
            match entity {
                RawEntity::User(user) => {
                    let cached = self.users.entry(user.id).or_default();
                    cached.is_self = user.is_self;
                    cached.is_contact = user.is_contact;
                    cached.is_mutual_contact = user.is_mutual_contact;
                }
                RawEntity::Channel(channel) => {
                    self.chats.entry(channel.id).or_default();
                }
                RawEntity::ChannelForbidden { id, .. } => {
                    self.chats.entry(*id).or_default();
                }
            }
        }
    }

    /// `true` when `user_id` is known to be the logged-in account.
    pub fn is_self(&self, user_id: i64) -> bool {
        self.users.get(&user_id).is_some_and(|user| user.is_self)
    }

    pub fn set_chat_photo(&mut self, chat_id: i64, photo: Option<RawPhoto>) {
        self.chats.entry(chat_id).or_default().photo = photo;
    }

    pub fn chat_photo(&self, chat_id: i64) -> Option<&RawPhoto> {
        self.chats.get(&chat_id).and_then(|chat| chat.photo.as_ref())
    }

    pub fn user(&self, user_id: i64) -> Option<&CachedUser> {
        self.users.get(&user_id)
    }

    pub fn chat(&self, chat_id: i64) -> Option<&CachedChat> {
        self.chats.get(&chat_id)
    }
}

/// Handle type shared between the dispatcher and the host application.
pub type SharedEntityCache = Arc<Mutex<EntityCache>>;

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use crate::wire::RawUser;

    #[test]
    fn test_absorb_marks_self() {
        let mut cache = EntityCache::new();
        cache.absorb(&[RawEntity::User(RawUser {
            id: 10,
            is_self: true,
            is_contact: false,
            is_mutual_contact: false,
            body: Bytes::new(),
        })]);
        assert!(cache.is_self(10));
        assert!(!cache.is_self(11));
    }

    #[test]
    fn test_chat_photo_roundtrip() {
        let mut cache = EntityCache::new();
        let photo = RawPhoto {
            id: 77,
            date: Some(1),
            body: Bytes::new(),
        };
        cache.set_chat_photo(-5, Some(photo.clone()));
        assert_eq!(cache.chat_photo(-5), Some(&photo));
        cache.set_chat_photo(-5, None);
        assert_eq!(cache.chat_photo(-5), None);
    }
}
