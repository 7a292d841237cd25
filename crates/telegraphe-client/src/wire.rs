//! Decoded incoming protocol events.
//!
//! The connection manager decodes frames into [`WireUpdate`] values and
//! hands them over one at a time. The set is closed: every constructor the
//! protocol can send maps to exactly one variant, and constructors this
//! client does not know become [`WireUpdate::Unknown`].
//!
//! `Raw*` structs carry the fields the dispatcher itself reads plus the
//! undecoded remainder (`body`) for the entity builders.

use bytes::Bytes;

use telegraphe_proto::{mark_peer_id, PeerKind};

use crate::events::ConnectionState;

/// A peer reference as it appears on the wire: raw positive id + kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPeer {
    pub id: i64,
    pub kind: PeerKind,
}

impl RawPeer {
    pub fn user(id: i64) -> Self {
        Self {
            id,
            kind: PeerKind::User,
        }
    }

    pub fn group(id: i64) -> Self {
        Self {
            id,
            kind: PeerKind::Group,
        }
    }

    pub fn channel(id: i64) -> Self {
        Self {
            id,
            kind: PeerKind::Channel,
        }
    }

    /// The flat signed id used throughout the domain layer.
    pub fn marked(&self) -> i64 {
        mark_peer_id(self.id, self.kind)
    }
}

/// Service actions embedded in a message payload. Closed list: these are
/// the metadata notices the dispatcher fans out into secondary events.
#[derive(Debug, Clone, PartialEq)]
pub enum RawServiceAction {
    EditTitle { title: String },
    EditPhoto { photo: RawPhoto },
    DeletePhoto,
    AddUsers { user_ids: Vec<i64> },
    DeleteUser { user_id: i64 },
    GroupCall {
        call_id: i64,
        access_hash: i64,
        duration: Option<i32>,
    },
    TopicCreate,
    TopicEdit { topic_id: i32 },
    /// Recognized as a service action but with no dedicated fan-out.
    Other(Bytes),
}

/// An undecoded message record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub id: i32,
    pub peer: RawPeer,
    pub from_id: Option<i64>,
    pub date: i64,
    pub is_outgoing: bool,
    pub is_mentioned: bool,
    pub via_bot_id: Option<i64>,
    /// Reply markup requests a forced reply.
    pub force_reply: bool,
    /// The forced reply targets mentioned users only.
    pub force_reply_selective: bool,
    pub action: Option<RawServiceAction>,
    pub body: Bytes,
}

/// Entity records attached to an update by the connection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEntity {
    User(RawUser),
    Channel(RawChannel),
    ChannelForbidden { id: i64, title: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawUser {
    pub id: i64,
    pub is_self: bool,
    pub is_contact: bool,
    pub is_mutual_contact: bool,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawChannel {
    pub id: i64,
    pub is_not_joined: bool,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPhoto {
    pub id: i64,
    pub date: Option<i64>,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPoll {
    pub id: i64,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPollResults {
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawReactions {
    pub body: Bytes,
}

/// One element of a paid-media attachment: the revealed media itself
/// (after purchase) or its blurred placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum RawExtendedMedia {
    Media { body: Bytes },
    Preview { body: Bytes },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawNotifySettings {
    pub mute_until: Option<i64>,
    pub is_silent: bool,
    pub show_previews: bool,
}

/// A typing action; the emoji interaction carries its own payload because
/// the dispatcher routes it to a dedicated event.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTypingAction {
    EmojiInteraction {
        emoticon: String,
        msg_id: i32,
        data: String,
    },
    Other(Bytes),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawChatFolder {
    pub id: i32,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawStickerSet {
    pub id: i64,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawQuickReply {
    pub shortcut_id: i32,
    pub shortcut: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawGroupCall {
    pub id: i64,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawStory {
    pub id: i32,
    pub is_deleted: bool,
    pub body: Bytes,
}

/// Scope of a global notify-settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawNotifyScope {
    Users,
    Chats,
    Broadcasts,
}

/// The closed set of incoming protocol event shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum WireUpdate {
    // Connection / meta
    ServerTimeOffset { offset_secs: i64 },
    ConnectionState { state: ConnectionState },

    // Messages
    NewMessage {
        message: RawMessage,
        entities: Vec<RawEntity>,
    },
    NewChannelMessage {
        message: RawMessage,
        entities: Vec<RawEntity>,
    },
    NewScheduledMessage { message: RawMessage },
    EditScheduledMessage { message: RawMessage },
    ShortMessage { message: RawMessage },
    ShortChatMessage { message: RawMessage },
    EditMessage { message: RawMessage },
    EditChannelMessage { message: RawMessage },
    MessageId { id: i32 },
    ShortSentMessage { id: i32 },
    DeleteMessages { message_ids: Vec<i32> },
    DeleteChannelMessages {
        channel_id: i64,
        message_ids: Vec<i32>,
    },
    DeleteScheduledMessages {
        peer: RawPeer,
        message_ids: Vec<i32>,
    },
    ReadMessagesContents { message_ids: Vec<i32> },
    ChannelReadMessagesContents {
        channel_id: i64,
        message_ids: Vec<i32>,
    },
    ChannelMessageViews {
        channel_id: i64,
        id: i32,
        views: i32,
    },
    MessageReactions {
        msg_id: i32,
        peer: RawPeer,
        reactions: RawReactions,
    },
    MessagePoll {
        poll_id: i64,
        poll: Option<RawPoll>,
        results: RawPollResults,
    },
    MessagePollVote {
        poll_id: i64,
        peer: RawPeer,
        options: Vec<Bytes>,
    },
    MessageExtendedMedia {
        peer: RawPeer,
        msg_id: i32,
        extended_media: Vec<RawExtendedMedia>,
    },
    ServiceNotification {
        is_popup: bool,
        message: String,
        body: Bytes,
    },
    QuickReplyMessage { message: RawMessage },
    DeleteQuickReplyMessages {
        shortcut_id: i32,
        message_ids: Vec<i32>,
    },
    QuickReplies { quick_replies: Vec<RawQuickReply> },
    NewQuickReply { quick_reply: RawQuickReply },
    DeleteQuickReply { shortcut_id: i32 },

    // Chats
    ReadHistoryInbox {
        peer: RawPeer,
        max_id: i32,
        still_unread_count: i32,
    },
    ReadHistoryOutbox { peer: RawPeer, max_id: i32 },
    ReadChannelInbox {
        channel_id: i64,
        max_id: i32,
        still_unread_count: i32,
    },
    ReadChannelOutbox { channel_id: i64, max_id: i32 },
    ReadChannelDiscussionInbox {
        channel_id: i64,
        top_msg_id: i32,
        read_max_id: i32,
    },
    ReadChannelDiscussionOutbox {
        channel_id: i64,
        read_max_id: i32,
    },
    DialogPinned { peer: RawPeer, is_pinned: bool },
    PinnedDialogs {
        order: Vec<RawPeer>,
        folder_id: Option<i32>,
    },
    SavedDialogPinned { peer: RawPeer, is_pinned: bool },
    PinnedSavedDialogs { order: Vec<RawPeer> },
    FolderPeers { folder_peers: Vec<(RawPeer, i32)> },
    DialogFilter {
        id: i32,
        filter: Option<RawChatFolder>,
    },
    DialogFilterOrder { order: Vec<i32> },
    ChatParticipants { chat_id: i64, participants: Bytes },
    ChatParticipantAdd {
        chat_id: i64,
        user_id: i64,
        inviter_id: Option<i64>,
        date: i64,
    },
    ChatParticipantDelete { chat_id: i64, user_id: i64 },
    PinnedMessages {
        peer: RawPeer,
        message_ids: Vec<i32>,
        is_pinned: bool,
    },
    PinnedChannelMessages {
        channel_id: i64,
        message_ids: Vec<i32>,
        is_pinned: bool,
    },
    ChatNotifySettings {
        peer: RawPeer,
        settings: RawNotifySettings,
    },
    TopicNotifySettings {
        peer: RawPeer,
        top_msg_id: i32,
        settings: RawNotifySettings,
    },
    GlobalNotifySettings {
        scope: RawNotifyScope,
        settings: RawNotifySettings,
    },
    UserTyping {
        user_id: i64,
        action: RawTypingAction,
    },
    ChatUserTyping {
        chat_id: i64,
        action: RawTypingAction,
    },
    ChannelUserTyping {
        channel_id: i64,
        top_msg_id: Option<i32>,
        action: RawTypingAction,
    },
    /// Channel state changed. Carries the refreshed entity record when one
    /// is available; an empty list means the linked discussion group
    /// changed and local history must be rebuilt.
    Channel {
        channel_id: i64,
        entities: Vec<RawEntity>,
    },
    DialogUnreadMark { peer: RawPeer, is_unread: bool },
    ChatDefaultBannedRights {
        peer: RawPeer,
        banned_rights: Bytes,
    },

    // Users
    UserStatus { user_id: i64, status: Bytes },
    User { user_id: i64 },
    UserEmojiStatus { user_id: i64, emoji_status: Bytes },
    UserName {
        user_id: i64,
        first_name: Option<String>,
        last_name: Option<String>,
        usernames: Vec<String>,
    },
    UserPhone { user_id: i64, phone: String },
    PeerSettings {
        peer: RawPeer,
        entities: Vec<RawEntity>,
    },
    PeerBlocked {
        peer: RawPeer,
        is_blocked: bool,
        blocked_my_stories_from: bool,
    },
    Privacy { key: Bytes, rules: Bytes },

    // Misc
    DraftMessage {
        peer: RawPeer,
        top_msg_id: Option<i32>,
        draft: Bytes,
    },
    ContactsReset,
    FavedStickers,
    RecentStickers,
    RecentReactions,
    SavedReactionTags,
    MoveStickerSetToTop {
        set_id: i64,
        is_masks: bool,
        is_emojis: bool,
    },
    StickerSets,
    StickerSetsOrder {
        order: Vec<i64>,
        is_masks: bool,
        is_emojis: bool,
    },
    NewStickerSet { set: RawStickerSet },
    SavedGifs,
    GroupCall { call: RawGroupCall },
    GroupCallConnection {
        params: String,
        is_presentation: bool,
    },
    GroupCallParticipants {
        call_id: i64,
        participants: Vec<Bytes>,
    },
    PendingJoinRequests {
        peer: RawPeer,
        recent_requester_ids: Vec<i64>,
        requests_pending: i32,
    },
    PhoneCall { call: Bytes },
    PhoneCallSignalingData { call_id: i64, data: Bytes },
    WebViewResultSent { query_id: i64 },
    BotMenuButton { bot_id: i64, button: Bytes },
    TranscribedAudio {
        transcription_id: i64,
        text: String,
        is_pending: bool,
    },
    Config,
    ChannelPinnedTopic {
        channel_id: i64,
        topic_id: i32,
        is_pinned: bool,
    },
    ChannelPinnedTopics { channel_id: i64, order: Vec<i32> },
    RecentEmojiStatuses,
    Story { peer: RawPeer, story: RawStory },
    ReadStories { peer: RawPeer, max_id: i32 },
    SentStoryReaction {
        peer: RawPeer,
        story_id: i32,
        reaction: Bytes,
    },
    StoriesStealthMode { stealth_mode: Bytes },
    AttachMenuBots,
    NewAuthorization {
        hash: i64,
        date: Option<i64>,
        device: Option<String>,
        location: Option<String>,
        is_unconfirmed: bool,
    },
    ChannelViewForumAsMessages { channel_id: i64, is_enabled: bool },
    StarsBalance { balance: i64 },
    PaidReactionPrivacy { is_private: bool },

    /// Constructor id the decoder did not recognize. Dropped by the
    /// dispatcher with a debug log entry.
    Unknown { constructor_id: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marked_peer_ids() {
        assert_eq!(RawPeer::user(42).marked(), 42);
        assert_eq!(RawPeer::group(42).marked(), -42);
        assert_eq!(RawPeer::channel(42).marked(), -(42 + 1_000_000_000_000));
    }
}
