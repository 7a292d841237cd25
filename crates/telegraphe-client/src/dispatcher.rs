//! Turns decoded wire updates into domain events.
//!
//! One [`UpdateDispatcher::dispatch`] call handles one frame: absorb the
//! attached entities into the cache, apply side effects (clock offset,
//! cached photos, mute timers, sent-id bookkeeping), then emit zero or
//! more [`DomainEvent`]s through the sink. Cache mutations always land
//! before the event that announces them, so a sink that reads the cache
//! observes the post-update state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use telegraphe_proto::ServerClock;

use crate::builders::EntityBuilders;
use crate::cache::{EntityCache, SharedEntityCache};
use crate::events::{
    ChatMember, ChatPatch, DomainEvent, EventSink, ExtendedMedia, Message, NotifyPeerType,
    QuickReply,
};
use crate::schedule::{MuteScheduler, MuteTarget};
use crate::wire::{
    RawEntity, RawExtendedMedia, RawMessage, RawNotifyScope, RawPeer, RawServiceAction,
    RawTypingAction, WireUpdate,
};

/// Hard-coded peer that service notifications are attributed to.
const SERVICE_NOTIFICATIONS_USER_ID: i64 = 777_000;

/// The per-connection update dispatcher.
pub struct UpdateDispatcher<B: EntityBuilders> {
    builders: B,
    sink: EventSink,
    cache: SharedEntityCache,
    clock: ServerClock,
    scheduler: MuteScheduler,
    /// Ids acknowledged by the server for messages this client sent.
    /// A subsequent new-message frame for one of these is an update to
    /// the local copy, not a new message.
    sent_message_ids: HashSet<i32>,
}

impl<B: EntityBuilders> UpdateDispatcher<B> {
    pub fn new(builders: B, sink: EventSink, clock: ServerClock) -> Self {
        let scheduler = MuteScheduler::new(clock.clone(), sink.clone());
        Self {
            builders,
            sink,
            cache: Arc::new(Mutex::new(EntityCache::new())),
            clock,
            scheduler,
            sent_message_ids: HashSet::new(),
        }
    }

    /// Shared handle to the entity cache.
    pub fn cache(&self) -> SharedEntityCache {
        self.cache.clone()
    }

    /// Number of armed mute-expiry timers.
    pub fn active_mute_timers(&self) -> usize {
        self.scheduler.active_timers()
    }

    fn emit(&self, event: DomainEvent) {
        (self.sink)(event);
    }

    /// Handle one decoded frame.
    pub fn dispatch(&mut self, update: WireUpdate) {
        match update {
            WireUpdate::ServerTimeOffset { offset_secs } => {
                self.clock.set_offset(offset_secs);
                self.emit(DomainEvent::ServerTimeOffsetChanged { offset_secs });
            }
            WireUpdate::ConnectionState { state } => {
                self.emit(DomainEvent::ConnectionStateChanged { state });
            }

            // Messages
            WireUpdate::NewMessage { message, entities }
            | WireUpdate::NewChannelMessage { message, entities } => {
                self.handle_message(message, entities);
            }
            WireUpdate::ShortMessage { message } | WireUpdate::ShortChatMessage { message } => {
                self.handle_message(message, Vec::new());
            }
            WireUpdate::NewScheduledMessage { message } => {
                if let Some(built) = self.builders.build_message(&message) {
                    // The sent-id upgrade applies to scheduled sends too.
                    let event = if self.sent_message_ids.contains(&message.id) {
                        DomainEvent::ScheduledMessageUpdated {
                            id: message.id,
                            chat_id: message.peer.marked(),
                            message: built,
                        }
                    } else {
                        DomainEvent::NewScheduledMessage {
                            id: message.id,
                            chat_id: message.peer.marked(),
                            message: built,
                        }
                    };
                    self.emit(event);
                }
            }
            WireUpdate::EditScheduledMessage { message } => {
                if let Some(built) = self.builders.build_message(&message) {
                    self.emit(DomainEvent::ScheduledMessageUpdated {
                        id: message.id,
                        chat_id: message.peer.marked(),
                        message: built,
                    });
                }
            }
            WireUpdate::EditMessage { message } | WireUpdate::EditChannelMessage { message } => {
                if let Some(built) = self.builders.build_message(&message) {
                    self.emit(DomainEvent::MessageUpdated {
                        id: message.id,
                        chat_id: message.peer.marked(),
                        message: built,
                    });
                }
            }
            WireUpdate::MessageId { id } | WireUpdate::ShortSentMessage { id } => {
                self.sent_message_ids.insert(id);
            }
            WireUpdate::DeleteMessages { message_ids } => {
                self.emit(DomainEvent::MessagesDeleted {
                    chat_id: None,
                    message_ids,
                });
            }
            WireUpdate::DeleteChannelMessages {
                channel_id,
                message_ids,
            } => {
                self.emit(DomainEvent::MessagesDeleted {
                    chat_id: Some(RawPeer::channel(channel_id).marked()),
                    message_ids,
                });
            }
            WireUpdate::DeleteScheduledMessages { peer, message_ids } => {
                self.emit(DomainEvent::ScheduledMessagesDeleted {
                    chat_id: peer.marked(),
                    message_ids,
                });
            }
            WireUpdate::ReadMessagesContents { message_ids } => {
                self.emit(DomainEvent::MessagesContentRead {
                    chat_id: None,
                    message_ids,
                });
            }
            WireUpdate::ChannelReadMessagesContents {
                channel_id,
                message_ids,
            } => {
                self.emit(DomainEvent::MessagesContentRead {
                    chat_id: Some(RawPeer::channel(channel_id).marked()),
                    message_ids,
                });
            }
            WireUpdate::ChannelMessageViews {
                channel_id,
                id,
                views,
            } => {
                self.emit(DomainEvent::MessageViewsUpdated {
                    id,
                    chat_id: RawPeer::channel(channel_id).marked(),
                    views,
                });
            }
            WireUpdate::MessageReactions {
                msg_id,
                peer,
                reactions,
            } => {
                if let Some(reactions) = self.builders.build_reactions(&reactions) {
                    self.emit(DomainEvent::MessageReactionsUpdated {
                        id: msg_id,
                        chat_id: peer.marked(),
                        reactions,
                    });
                }
            }
            WireUpdate::MessagePoll {
                poll_id,
                poll,
                results,
            } => {
                let poll = poll.as_ref().and_then(|poll| self.builders.build_poll(poll));
                let results = self.builders.build_poll_results(&results);
                self.emit(DomainEvent::PollUpdated {
                    poll_id,
                    poll,
                    results,
                });
            }
            WireUpdate::MessagePollVote {
                poll_id,
                peer,
                options,
            } => {
                self.emit(DomainEvent::PollVoteUpdated {
                    poll_id,
                    peer_id: peer.marked(),
                    options: options.into_iter().map(|option| option.to_vec()).collect(),
                });
            }
            WireUpdate::MessageExtendedMedia {
                peer,
                msg_id,
                extended_media,
            } => {
                let chat_id = peer.marked();
                // The first element decides: bought media reveals the
                // whole attachment, otherwise only previews are shown.
                let is_bought =
                    matches!(extended_media.first(), Some(RawExtendedMedia::Media { .. }));
                let media = if is_bought {
                    self.builders
                        .build_bought_media(&extended_media)
                        .filter(|bought| !bought.is_empty())
                        .map(ExtendedMedia::Bought)
                } else {
                    let previews: Vec<_> = extended_media
                        .iter()
                        .filter_map(|element| match element {
                            RawExtendedMedia::Preview { body } => {
                                self.builders.build_media_preview(body)
                            }
                            RawExtendedMedia::Media { .. } => None,
                        })
                        .collect();
                    (!previews.is_empty()).then_some(ExtendedMedia::Previews(previews))
                };
                if let Some(media) = media {
                    self.emit(DomainEvent::MessageExtendedMediaUpdated {
                        id: msg_id,
                        chat_id,
                        media,
                    });
                }
            }
            WireUpdate::ServiceNotification {
                is_popup,
                message,
                body: _,
            } => {
                if is_popup {
                    self.emit(DomainEvent::ErrorNotice { message });
                } else {
                    let stamped = Message {
                        id: 0,
                        chat_id: SERVICE_NOTIFICATIONS_USER_ID,
                        from_id: Some(SERVICE_NOTIFICATIONS_USER_ID),
                        date: self.clock.now_unix(),
                        is_outgoing: false,
                        is_mentioned: false,
                        is_action: false,
                        text: Some(message),
                    };
                    self.emit(DomainEvent::ServiceNotification { message: stamped });
                }
            }
            WireUpdate::QuickReplyMessage { message } => {
                if let Some(built) = self.builders.build_message(&message) {
                    self.emit(DomainEvent::QuickReplyMessage {
                        id: message.id,
                        message: built,
                    });
                }
            }
            WireUpdate::DeleteQuickReplyMessages {
                shortcut_id,
                message_ids,
            } => {
                self.emit(DomainEvent::QuickReplyMessagesDeleted {
                    shortcut_id,
                    message_ids,
                });
            }
            WireUpdate::QuickReplies { quick_replies } => {
                self.emit(DomainEvent::QuickRepliesUpdated {
                    quick_replies: quick_replies.into_iter().map(quick_reply).collect(),
                });
            }
            WireUpdate::NewQuickReply { quick_reply: reply } => {
                self.emit(DomainEvent::QuickRepliesUpdated {
                    quick_replies: vec![quick_reply(reply)],
                });
            }
            WireUpdate::DeleteQuickReply { shortcut_id } => {
                self.emit(DomainEvent::QuickReplyDeleted { shortcut_id });
            }

            // Chats
            WireUpdate::ReadHistoryInbox {
                peer,
                max_id,
                still_unread_count,
            } => {
                self.emit(DomainEvent::ChatPatched {
                    chat_id: peer.marked(),
                    patch: ChatPatch {
                        last_read_inbox_message_id: Some(max_id),
                        unread_count: Some(still_unread_count),
                        ..Default::default()
                    },
                });
            }
            WireUpdate::ReadHistoryOutbox { peer, max_id } => {
                self.emit(DomainEvent::ChatPatched {
                    chat_id: peer.marked(),
                    patch: ChatPatch {
                        last_read_outbox_message_id: Some(max_id),
                        ..Default::default()
                    },
                });
            }
            WireUpdate::ReadChannelInbox {
                channel_id,
                max_id,
                still_unread_count,
            } => {
                self.emit(DomainEvent::ChatPatched {
                    chat_id: RawPeer::channel(channel_id).marked(),
                    patch: ChatPatch {
                        last_read_inbox_message_id: Some(max_id),
                        unread_count: Some(still_unread_count),
                        ..Default::default()
                    },
                });
            }
            WireUpdate::ReadChannelOutbox { channel_id, max_id } => {
                self.emit(DomainEvent::ChatPatched {
                    chat_id: RawPeer::channel(channel_id).marked(),
                    patch: ChatPatch {
                        last_read_outbox_message_id: Some(max_id),
                        ..Default::default()
                    },
                });
            }
            WireUpdate::ReadChannelDiscussionInbox {
                channel_id,
                top_msg_id,
                read_max_id,
            } => {
                self.emit(DomainEvent::ThreadInfoUpdated {
                    chat_id: RawPeer::channel(channel_id).marked(),
                    thread_id: top_msg_id,
                    last_read_inbox_message_id: read_max_id,
                });
            }
            WireUpdate::ReadChannelDiscussionOutbox { channel_id, .. } => {
                tracing::trace!(channel_id, "discussion outbox read has no domain event");
            }
            WireUpdate::DialogPinned { peer, is_pinned } => {
                self.emit(DomainEvent::ChatPinned {
                    chat_id: peer.marked(),
                    is_pinned,
                });
            }
            WireUpdate::PinnedDialogs { order, folder_id } => {
                self.emit(DomainEvent::PinnedChatIds {
                    chat_ids: order.iter().map(RawPeer::marked).collect(),
                    folder_id,
                });
            }
            WireUpdate::SavedDialogPinned { peer, is_pinned } => {
                self.emit(DomainEvent::SavedDialogPinned {
                    chat_id: peer.marked(),
                    is_pinned,
                });
            }
            WireUpdate::PinnedSavedDialogs { order } => {
                self.emit(DomainEvent::PinnedSavedDialogIds {
                    chat_ids: order.iter().map(RawPeer::marked).collect(),
                });
            }
            WireUpdate::FolderPeers { folder_peers } => {
                for (peer, folder_id) in folder_peers {
                    self.emit(DomainEvent::ChatListTypeChanged {
                        chat_id: peer.marked(),
                        folder_id,
                    });
                }
            }
            WireUpdate::DialogFilter { id, filter } => {
                let folder = filter
                    .as_ref()
                    .and_then(|filter| self.builders.build_chat_folder(filter));
                self.emit(DomainEvent::ChatFolderUpdated { id, folder });
            }
            WireUpdate::DialogFilterOrder { order } => {
                self.emit(DomainEvent::ChatFoldersOrderChanged { ordered_ids: order });
            }
            WireUpdate::ChatParticipants {
                chat_id,
                participants,
            } => {
                if let Some(members) = self.builders.build_chat_members(&participants) {
                    self.emit(DomainEvent::ChatMembersReplaced {
                        chat_id: RawPeer::group(chat_id).marked(),
                        members,
                    });
                }
            }
            WireUpdate::ChatParticipantAdd {
                chat_id,
                user_id,
                inviter_id,
                date,
            } => {
                self.emit(DomainEvent::ChatMemberAdded {
                    chat_id: RawPeer::group(chat_id).marked(),
                    member: ChatMember {
                        user_id,
                        inviter_id,
                        joined_date: Some(date),
                    },
                });
            }
            WireUpdate::ChatParticipantDelete { chat_id, user_id } => {
                self.emit(DomainEvent::ChatMemberDeleted {
                    chat_id: RawPeer::group(chat_id).marked(),
                    user_id,
                });
            }
            WireUpdate::PinnedMessages {
                peer,
                message_ids,
                is_pinned,
            } => {
                self.emit(DomainEvent::PinnedMessageIds {
                    chat_id: peer.marked(),
                    message_ids,
                    is_pinned,
                });
            }
            WireUpdate::PinnedChannelMessages {
                channel_id,
                message_ids,
                is_pinned,
            } => {
                self.emit(DomainEvent::PinnedMessageIds {
                    chat_id: RawPeer::channel(channel_id).marked(),
                    message_ids,
                    is_pinned,
                });
            }
            WireUpdate::ChatNotifySettings { peer, settings } => {
                let chat_id = peer.marked();
                self.scheduler
                    .schedule(MuteTarget::Chat(chat_id), settings.mute_until);
                self.emit(DomainEvent::NotifyExceptionUpdated {
                    chat_id,
                    mute_until: settings.mute_until,
                    is_silent: settings.is_silent,
                    should_show_previews: Some(settings.show_previews),
                });
            }
            WireUpdate::TopicNotifySettings {
                peer,
                top_msg_id,
                settings,
            } => {
                let chat_id = peer.marked();
                self.scheduler
                    .schedule(MuteTarget::Topic(chat_id, top_msg_id), settings.mute_until);
                self.emit(DomainEvent::TopicNotifyExceptionUpdated {
                    chat_id,
                    topic_id: top_msg_id,
                    mute_until: settings.mute_until,
                });
            }
            WireUpdate::GlobalNotifySettings { scope, settings } => {
                let peer_type = match scope {
                    RawNotifyScope::Users => NotifyPeerType::Contact,
                    RawNotifyScope::Chats => NotifyPeerType::Group,
                    RawNotifyScope::Broadcasts => NotifyPeerType::Broadcast,
                };
                // A mute deadline still in the future counts as silent.
                let is_silent = settings.is_silent
                    || settings
                        .mute_until
                        .is_some_and(|until| self.clock.now_unix() < until);
                self.emit(DomainEvent::GlobalNotifySettingsChanged {
                    peer_type,
                    is_silent,
                    should_show_previews: settings.show_previews,
                });
            }
            WireUpdate::UserTyping { user_id, action } => {
                self.handle_typing(user_id, None, action);
            }
            WireUpdate::ChatUserTyping { chat_id, action } => {
                self.handle_typing(RawPeer::group(chat_id).marked(), None, action);
            }
            WireUpdate::ChannelUserTyping {
                channel_id,
                top_msg_id,
                action,
            } => {
                self.handle_typing(RawPeer::channel(channel_id).marked(), top_msg_id, action);
            }
            WireUpdate::Channel {
                channel_id,
                entities,
            } => {
                self.cache.lock().unwrap().absorb(&entities);
                let chat_id = RawPeer::channel(channel_id).marked();
                let record = entities.iter().find(|entity| {
                    matches!(
                        entity,
                        RawEntity::Channel(_) | RawEntity::ChannelForbidden { .. }
                    )
                });
                match record {
                    Some(RawEntity::Channel(channel)) => {
                        if let Some(chat) = self.builders.build_chat(channel) {
                            let left = chat.is_not_joined;
                            self.emit(DomainEvent::ChatRefreshed { chat });
                            if left {
                                self.emit(DomainEvent::ChatLeft { chat_id });
                            } else {
                                self.emit(DomainEvent::ChatJoined { chat_id });
                            }
                        }
                    }
                    Some(RawEntity::ChannelForbidden { .. }) => {
                        self.emit(DomainEvent::ChatPatched {
                            chat_id,
                            patch: ChatPatch {
                                is_restricted: Some(true),
                                ..Default::default()
                            },
                        });
                        self.emit(DomainEvent::ChatLeft { chat_id });
                    }
                    _ if entities.is_empty() => {
                        // No entity record: the linked discussion group
                        // changed and local history must be rebuilt.
                        self.emit(DomainEvent::MessagesReset { chat_id });
                    }
                    _ => {}
                }
            }
            WireUpdate::DialogUnreadMark { peer, is_unread } => {
                self.emit(DomainEvent::ChatPatched {
                    chat_id: peer.marked(),
                    patch: ChatPatch {
                        has_unread_mark: Some(is_unread),
                        ..Default::default()
                    },
                });
            }
            WireUpdate::ChatDefaultBannedRights {
                peer,
                banned_rights,
            } => {
                if let Some(rights) = self.builders.build_banned_rights(&banned_rights) {
                    self.emit(DomainEvent::ChatPatched {
                        chat_id: peer.marked(),
                        patch: ChatPatch {
                            default_banned_rights: Some(rights),
                            ..Default::default()
                        },
                    });
                }
            }

            // Users
            WireUpdate::UserStatus { user_id, status } => {
                if let Some(status) = self.builders.build_user_status(&status) {
                    self.emit(DomainEvent::UserStatusChanged { user_id, status });
                }
            }
            WireUpdate::User { user_id } => {
                self.emit(DomainEvent::UserRefreshRequested { user_id });
            }
            WireUpdate::UserEmojiStatus {
                user_id,
                emoji_status,
            } => {
                self.emit(DomainEvent::UserEmojiStatusChanged {
                    user_id,
                    emoji_status: self.builders.build_emoji_status(&emoji_status),
                });
            }
            WireUpdate::UserName {
                user_id,
                first_name,
                last_name,
                usernames,
            } => {
                // A mutual contact's display name is the local contact
                // name; only username changes pass through for them.
                let keep_names = !self
                    .cache
                    .lock()
                    .unwrap()
                    .user(user_id)
                    .is_some_and(|user| user.is_mutual_contact && !user.is_self);
                self.emit(DomainEvent::UserPatched {
                    user_id,
                    patch: crate::events::UserPatch {
                        first_name: first_name.filter(|_| keep_names),
                        last_name: last_name.filter(|_| keep_names),
                        usernames: Some(usernames),
                        phone_number: None,
                    },
                });
            }
            WireUpdate::UserPhone { user_id, phone } => {
                self.emit(DomainEvent::UserPatched {
                    user_id,
                    patch: crate::events::UserPatch {
                        phone_number: Some(phone),
                        ..Default::default()
                    },
                });
            }
            WireUpdate::PeerSettings { peer: _, entities } => {
                self.handle_peer_settings(entities);
            }
            WireUpdate::PeerBlocked {
                peer,
                is_blocked,
                blocked_my_stories_from,
            } => {
                self.emit(DomainEvent::PeerBlockedChanged {
                    peer_id: peer.marked(),
                    is_blocked,
                    is_blocked_from_stories: blocked_my_stories_from,
                });
            }
            WireUpdate::Privacy { key, rules } => {
                let Some(key) = self.builders.build_privacy_key(&key) else {
                    return;
                };
                let Some(rules) = self.builders.build_privacy_rules(&rules) else {
                    return;
                };
                self.emit(DomainEvent::PrivacyChanged { key, rules });
            }

            // Misc
            WireUpdate::DraftMessage {
                peer,
                top_msg_id,
                draft,
            } => {
                self.emit(DomainEvent::DraftUpdated {
                    chat_id: peer.marked(),
                    thread_id: top_msg_id,
                    draft: self.builders.build_draft(&draft),
                });
            }
            WireUpdate::ContactsReset => self.emit(DomainEvent::ContactListReset),
            WireUpdate::FavedStickers => self.emit(DomainEvent::FavoriteStickersUpdated),
            WireUpdate::RecentStickers => self.emit(DomainEvent::RecentStickersUpdated),
            WireUpdate::RecentReactions => self.emit(DomainEvent::RecentReactionsUpdated),
            WireUpdate::SavedReactionTags => self.emit(DomainEvent::SavedReactionTagsUpdated),
            WireUpdate::MoveStickerSetToTop {
                set_id,
                is_masks,
                is_emojis,
            } => {
                if !is_masks {
                    self.emit(DomainEvent::StickerSetMovedToTop {
                        id: set_id,
                        is_custom_emoji: is_emojis,
                    });
                }
            }
            WireUpdate::StickerSets => self.emit(DomainEvent::StickerSetsUpdated),
            WireUpdate::StickerSetsOrder {
                order,
                is_masks,
                is_emojis,
            } => {
                if !is_masks {
                    self.emit(DomainEvent::StickerSetsOrderChanged {
                        order,
                        is_custom_emoji: is_emojis,
                    });
                }
            }
            WireUpdate::NewStickerSet { set } => {
                if let Some(set) = self.builders.build_sticker_set(&set) {
                    self.emit(DomainEvent::StickerSetInstalled { set });
                }
            }
            WireUpdate::SavedGifs => self.emit(DomainEvent::SavedGifsUpdated),
            WireUpdate::GroupCall { call } => {
                if let Some(call) = self.builders.build_group_call(&call) {
                    self.emit(DomainEvent::GroupCallUpdated { call });
                }
            }
            WireUpdate::GroupCallConnection {
                params,
                is_presentation,
            } => {
                self.emit(DomainEvent::GroupCallConnectionUpdated {
                    params,
                    is_presentation,
                });
            }
            WireUpdate::GroupCallParticipants {
                call_id,
                participants,
            } => {
                let participants = participants
                    .iter()
                    .filter_map(|participant| {
                        self.builders.build_group_call_participant(participant)
                    })
                    .collect();
                self.emit(DomainEvent::GroupCallParticipantsUpdated {
                    call_id,
                    participants,
                });
            }
            WireUpdate::PendingJoinRequests {
                peer,
                recent_requester_ids,
                requests_pending,
            } => {
                self.emit(DomainEvent::PendingJoinRequestsUpdated {
                    chat_id: peer.marked(),
                    recent_requester_ids,
                    requests_pending,
                });
            }
            WireUpdate::PhoneCall { call } => {
                if let Some(call) = self.builders.build_phone_call(&call) {
                    self.emit(DomainEvent::PhoneCallUpdated { call });
                }
            }
            WireUpdate::PhoneCallSignalingData { call_id, data } => {
                self.emit(DomainEvent::PhoneCallSignalingData {
                    call_id,
                    data: data.to_vec(),
                });
            }
            WireUpdate::WebViewResultSent { query_id } => {
                self.emit(DomainEvent::WebViewResultSent { query_id });
            }
            WireUpdate::BotMenuButton { bot_id, button } => {
                if let Some(button) = self.builders.build_bot_menu_button(&button) {
                    self.emit(DomainEvent::BotMenuButtonChanged { bot_id, button });
                }
            }
            WireUpdate::TranscribedAudio {
                transcription_id,
                text,
                is_pending,
            } => {
                self.emit(DomainEvent::AudioTranscribed {
                    transcription_id,
                    text,
                    is_pending,
                });
            }
            WireUpdate::Config => self.emit(DomainEvent::ConfigChanged),
            WireUpdate::ChannelPinnedTopic {
                channel_id,
                topic_id,
                is_pinned,
            } => {
                self.emit(DomainEvent::PinnedTopicChanged {
                    chat_id: RawPeer::channel(channel_id).marked(),
                    topic_id,
                    is_pinned,
                });
            }
            WireUpdate::ChannelPinnedTopics { channel_id, order } => {
                self.emit(DomainEvent::PinnedTopicsOrderChanged {
                    chat_id: RawPeer::channel(channel_id).marked(),
                    order,
                });
            }
            WireUpdate::RecentEmojiStatuses => self.emit(DomainEvent::RecentEmojiStatusesUpdated),
            WireUpdate::Story { peer, story } => {
                let peer_id = peer.marked();
                if story.is_deleted {
                    self.emit(DomainEvent::StoryDeleted {
                        peer_id,
                        story_id: story.id,
                    });
                } else if let Some(story) = self.builders.build_story(peer_id, &story) {
                    self.emit(DomainEvent::StoryUpdated { peer_id, story });
                }
            }
            WireUpdate::ReadStories { peer, max_id } => {
                self.emit(DomainEvent::StoriesRead {
                    peer_id: peer.marked(),
                    last_read_id: max_id,
                });
            }
            WireUpdate::SentStoryReaction {
                peer,
                story_id,
                reaction,
            } => {
                self.emit(DomainEvent::SentStoryReaction {
                    peer_id: peer.marked(),
                    story_id,
                    reaction: self.builders.build_reaction(&reaction),
                });
            }
            WireUpdate::StoriesStealthMode { stealth_mode } => {
                if let Some(stealth_mode) = self.builders.build_stealth_mode(&stealth_mode) {
                    self.emit(DomainEvent::StealthModeChanged { stealth_mode });
                }
            }
            WireUpdate::AttachMenuBots => self.emit(DomainEvent::AttachMenuBotsUpdated),
            WireUpdate::NewAuthorization {
                hash,
                date,
                device,
                location,
                is_unconfirmed,
            } => {
                self.emit(DomainEvent::NewAuthorization {
                    hash,
                    date,
                    device,
                    location,
                    is_unconfirmed,
                });
            }
            WireUpdate::ChannelViewForumAsMessages {
                channel_id,
                is_enabled,
            } => {
                self.emit(DomainEvent::ViewForumAsMessagesChanged {
                    chat_id: RawPeer::channel(channel_id).marked(),
                    is_enabled,
                });
            }
            WireUpdate::StarsBalance { balance } => {
                self.emit(DomainEvent::StarsBalanceChanged { balance });
            }
            WireUpdate::PaidReactionPrivacy { is_private } => {
                self.emit(DomainEvent::PaidReactionPrivacyChanged { is_private });
            }

            WireUpdate::Unknown { constructor_id } => {
                tracing::debug!(constructor_id, "dropping unrecognized update");
            }
        }
    }

    fn handle_message(&mut self, message: RawMessage, entities: Vec<RawEntity>) {
        self.cache.lock().unwrap().absorb(&entities);

        let chat_id = message.peer.marked();

        // A new-message frame whose id the server already acknowledged for
        // an outgoing send updates the local copy instead of duplicating
        // it. The id stays recorded so a redelivered frame upgrades again.
        // Bot-via and service messages never have a local copy.
        let was_sent = self.sent_message_ids.contains(&message.id);
        let has_local_copy =
            was_sent && message.via_bot_id.is_none() && message.action.is_none();

        let should_force_reply =
            message.force_reply && (!message.force_reply_selective || message.is_mentioned);

        if let Some(built) = self.builders.build_message(&message) {
            if has_local_copy {
                self.emit(DomainEvent::MessageUpdated {
                    id: message.id,
                    chat_id,
                    message: built,
                });
            } else {
                self.emit(DomainEvent::NewMessage {
                    id: message.id,
                    chat_id,
                    message: built,
                    should_force_reply,
                });
            }
        }

        if let Some(action) = &message.action {
            self.handle_service_action(chat_id, action);
        }
    }

    fn handle_service_action(&mut self, chat_id: i64, action: &RawServiceAction) {
        match action {
            RawServiceAction::EditTitle { title } => {
                self.emit(DomainEvent::ChatPatched {
                    chat_id,
                    patch: ChatPatch {
                        title: Some(title.clone()),
                        ..Default::default()
                    },
                });
            }
            RawServiceAction::EditPhoto { photo } => {
                // An unbuildable photo leaves the cached one untouched.
                let Some(built) = self.builders.build_photo(photo) else {
                    return;
                };
                {
                    let mut cache = self.cache.lock().unwrap();
                    cache.set_chat_photo(chat_id, Some(photo.clone()));
                }
                self.emit(DomainEvent::NewProfilePhoto {
                    peer_id: chat_id,
                    photo: built,
                });
            }
            RawServiceAction::DeletePhoto => {
                {
                    let mut cache = self.cache.lock().unwrap();
                    cache.set_chat_photo(chat_id, None);
                }
                self.emit(DomainEvent::ProfilePhotoDeleted { peer_id: chat_id });
            }
            RawServiceAction::AddUsers { user_ids } => {
                let includes_self = {
                    let cache = self.cache.lock().unwrap();
                    user_ids.iter().any(|user_id| cache.is_self(*user_id))
                };
                if includes_self {
                    self.emit(DomainEvent::ChatJoined { chat_id });
                }
            }
            RawServiceAction::DeleteUser { user_id } => {
                let is_self = self.cache.lock().unwrap().is_self(*user_id);
                if is_self {
                    self.emit(DomainEvent::ChatPatched {
                        chat_id,
                        patch: ChatPatch {
                            is_forbidden: Some(true),
                            is_not_joined: Some(true),
                            ..Default::default()
                        },
                    });
                }
            }
            RawServiceAction::GroupCall {
                call_id,
                access_hash,
                duration,
            } => {
                // A duration means the call ended; only a starting call
                // binds the chat to it.
                if duration.is_none() {
                    self.emit(DomainEvent::GroupCallChatId {
                        chat_id,
                        call_id: *call_id,
                        access_hash: *access_hash,
                    });
                }
            }
            RawServiceAction::TopicCreate => {
                self.emit(DomainEvent::TopicsUpdated { chat_id });
            }
            RawServiceAction::TopicEdit { topic_id } => {
                self.emit(DomainEvent::TopicUpdated {
                    chat_id,
                    topic_id: *topic_id,
                });
            }
            RawServiceAction::Other(_) => {}
        }
    }

    fn handle_typing(&mut self, chat_id: i64, thread_id: Option<i32>, action: RawTypingAction) {
        match &action {
            RawTypingAction::EmojiInteraction {
                emoticon,
                msg_id,
                data,
            } => {
                if let Some(interaction) = self.builders.build_emoji_interaction(data) {
                    self.emit(DomainEvent::EmojiInteractionStarted {
                        chat_id,
                        emoji: emoticon.clone(),
                        message_id: *msg_id,
                        interaction,
                    });
                }
            }
            RawTypingAction::Other(_) => {
                if let Some(typing) = self.builders.build_typing_status(&action) {
                    self.emit(DomainEvent::TypingStatusChanged {
                        chat_id,
                        thread_id,
                        typing,
                    });
                }
            }
        }
    }

    fn handle_peer_settings(&mut self, entities: Vec<RawEntity>) {
        // Contact removal is detected by comparing against the cached
        // record before the new entities are absorbed.
        let mut deleted = Vec::new();
        let mut refreshed = Vec::new();
        {
            let cache = self.cache.lock().unwrap();
            for entity in &entities {
                if let RawEntity::User(user) = entity {
                    let was_contact = cache
                        .user(user.id)
                        .is_some_and(|cached| cached.is_contact);
                    if was_contact && !user.is_contact {
                        deleted.push(user.id);
                    } else if let Some(built) = self.builders.build_user(user) {
                        refreshed.push(built);
                    }
                }
            }
        }
        self.cache.lock().unwrap().absorb(&entities);
        for user_id in deleted {
            self.emit(DomainEvent::ContactDeleted { user_id });
        }
        for user in refreshed {
            self.emit(DomainEvent::UserRefreshed { user });
        }
    }
}

fn quick_reply(raw: crate::wire::RawQuickReply) -> QuickReply {
    QuickReply {
        shortcut_id: raw.shortcut_id,
        shortcut: raw.shortcut,
    }
}
