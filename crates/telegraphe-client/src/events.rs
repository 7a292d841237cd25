//! Canonical domain events and the normalized values they carry.
//!
//! A [`DomainEvent`] describes "what changed" in UI-agnostic terms: marked
//! peer ids, already-normalized entity values, never a raw wire record.
//! Events are emitted at most once per dispatched frame (twice for the
//! enumerated service-action fan-outs) and are owned by the sink.

use std::sync::Arc;

use serde::Serialize;

/// Connection lifecycle as reported by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    Connecting,
    Broken,
    Ready,
}

/// Scope of a global notification-settings change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotifyPeerType {
    Contact,
    Group,
    Broadcast,
}

/// A normalized message, as produced by the message builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: i32,
    pub chat_id: i64,
    pub from_id: Option<i64>,
    pub date: i64,
    pub is_outgoing: bool,
    pub is_mentioned: bool,
    /// Set for service messages (metadata notices, not user content).
    pub is_action: bool,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
    pub id: i64,
    pub date: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poll {
    pub id: i64,
    pub question: String,
    pub answers: Vec<String>,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollResults {
    pub total_voters: Option<i32>,
}

/// Revealed element of a paid-media attachment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoughtMedia {
    pub photo: Option<Photo>,
}

/// Blurred placeholder for a not-yet-bought media element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPreview {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_secs: Option<i32>,
}

/// Paid-media state attached to a message: either the full content after
/// purchase or the placeholder previews.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtendedMedia {
    Bought(Vec<BoughtMedia>),
    Previews(Vec<MediaPreview>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reaction {
    pub emoticon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReactions {
    pub results: Vec<(Reaction, i32)>,
}

/// Partial chat fields attached to a [`DomainEvent::ChatPatched`] event.
/// Only the populated fields changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatPatch {
    pub title: Option<String>,
    pub last_read_inbox_message_id: Option<i32>,
    pub last_read_outbox_message_id: Option<i32>,
    pub unread_count: Option<i32>,
    pub has_unread_mark: Option<bool>,
    pub is_forbidden: Option<bool>,
    pub is_not_joined: Option<bool>,
    pub is_restricted: Option<bool>,
    pub default_banned_rights: Option<BannedRights>,
}

/// A fully rebuilt chat preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    pub is_not_joined: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannedRights {
    pub send_messages: bool,
    pub send_media: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatFolder {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMember {
    pub user_id: i64,
    pub inviter_id: Option<i64>,
    pub joined_date: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypingStatus {
    pub action: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmojiInteraction {
    pub timestamps: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_contact: bool,
}

/// Partial user fields attached to a [`DomainEvent::UserPatched`] event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub usernames: Option<Vec<String>>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStatus {
    pub kind: String,
    pub was_online: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmojiStatus {
    pub document_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyKey {
    PhoneNumber,
    LastSeen,
    ProfilePhoto,
    Forwards,
    ChatInvite,
    PhoneCall,
    VoiceMessages,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivacyRules {
    pub visibility: String,
    pub allowed_user_ids: Vec<i64>,
    pub blocked_user_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Draft {
    pub text: String,
    pub reply_to_message_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StickerSet {
    pub id: i64,
    pub title: String,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReply {
    pub shortcut_id: i32,
    pub shortcut: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCall {
    pub id: i64,
    pub access_hash: i64,
    pub participants_count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCallParticipant {
    pub peer_id: i64,
    pub is_muted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneCall {
    pub id: i64,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotMenuButton {
    pub text: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: i32,
    pub peer_id: i64,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StealthMode {
    pub active_until: Option<i64>,
    pub cooldown_until: Option<i64>,
}

/// Everything the dispatcher can tell the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    // Connection / meta
    ServerTimeOffsetChanged { offset_secs: i64 },
    ConnectionStateChanged { state: ConnectionState },

    // Messages
    NewMessage { id: i32, chat_id: i64, message: Message, should_force_reply: bool },
    MessageUpdated { id: i32, chat_id: i64, message: Message },
    MessageViewsUpdated { id: i32, chat_id: i64, views: i32 },
    NewScheduledMessage { id: i32, chat_id: i64, message: Message },
    ScheduledMessageUpdated { id: i32, chat_id: i64, message: Message },
    MessagesDeleted { chat_id: Option<i64>, message_ids: Vec<i32> },
    ScheduledMessagesDeleted { chat_id: i64, message_ids: Vec<i32> },
    MessagesContentRead { chat_id: Option<i64>, message_ids: Vec<i32> },
    MessageReactionsUpdated { id: i32, chat_id: i64, reactions: MessageReactions },
    MessageExtendedMediaUpdated { id: i32, chat_id: i64, media: ExtendedMedia },
    PollUpdated { poll_id: i64, poll: Option<Poll>, results: Option<PollResults> },
    PollVoteUpdated { poll_id: i64, peer_id: i64, options: Vec<Vec<u8>> },
    ServiceNotification { message: Message },
    ErrorNotice { message: String },
    QuickReplyMessage { id: i32, message: Message },
    QuickReplyMessagesDeleted { shortcut_id: i32, message_ids: Vec<i32> },
    QuickRepliesUpdated { quick_replies: Vec<QuickReply> },
    QuickReplyDeleted { shortcut_id: i32 },

    // Chats
    ChatPatched { chat_id: i64, patch: ChatPatch },
    ChatRefreshed { chat: Chat },
    ChatJoined { chat_id: i64 },
    ChatLeft { chat_id: i64 },
    MessagesReset { chat_id: i64 },
    NewProfilePhoto { peer_id: i64, photo: Photo },
    ProfilePhotoDeleted { peer_id: i64 },
    GroupCallChatId { chat_id: i64, call_id: i64, access_hash: i64 },
    TopicUpdated { chat_id: i64, topic_id: i32 },
    TopicsUpdated { chat_id: i64 },
    ChatPinned { chat_id: i64, is_pinned: bool },
    PinnedChatIds { chat_ids: Vec<i64>, folder_id: Option<i32> },
    SavedDialogPinned { chat_id: i64, is_pinned: bool },
    PinnedSavedDialogIds { chat_ids: Vec<i64> },
    ChatListTypeChanged { chat_id: i64, folder_id: i32 },
    ChatFolderUpdated { id: i32, folder: Option<ChatFolder> },
    ChatFoldersOrderChanged { ordered_ids: Vec<i32> },
    ChatMembersReplaced { chat_id: i64, members: Vec<ChatMember> },
    ChatMemberAdded { chat_id: i64, member: ChatMember },
    ChatMemberDeleted { chat_id: i64, user_id: i64 },
    PinnedMessageIds { chat_id: i64, message_ids: Vec<i32>, is_pinned: bool },
    ThreadInfoUpdated { chat_id: i64, thread_id: i32, last_read_inbox_message_id: i32 },
    NotifyExceptionUpdated {
        chat_id: i64,
        mute_until: Option<i64>,
        is_silent: bool,
        should_show_previews: Option<bool>,
    },
    TopicNotifyExceptionUpdated { chat_id: i64, topic_id: i32, mute_until: Option<i64> },
    GlobalNotifySettingsChanged {
        peer_type: NotifyPeerType,
        is_silent: bool,
        should_show_previews: bool,
    },
    TypingStatusChanged { chat_id: i64, thread_id: Option<i32>, typing: TypingStatus },
    EmojiInteractionStarted {
        chat_id: i64,
        emoji: String,
        message_id: i32,
        interaction: EmojiInteraction,
    },

    // Users
    UserStatusChanged { user_id: i64, status: UserStatus },
    UserRefreshRequested { user_id: i64 },
    UserEmojiStatusChanged { user_id: i64, emoji_status: Option<EmojiStatus> },
    UserPatched { user_id: i64, patch: UserPatch },
    UserRefreshed { user: User },
    ContactDeleted { user_id: i64 },
    PeerBlockedChanged {
        peer_id: i64,
        is_blocked: bool,
        is_blocked_from_stories: bool,
    },
    PrivacyChanged { key: PrivacyKey, rules: PrivacyRules },

    // Misc
    DraftUpdated { chat_id: i64, thread_id: Option<i32>, draft: Option<Draft> },
    ContactListReset,
    FavoriteStickersUpdated,
    RecentStickersUpdated,
    RecentReactionsUpdated,
    SavedReactionTagsUpdated,
    StickerSetMovedToTop { id: i64, is_custom_emoji: bool },
    StickerSetsUpdated,
    StickerSetsOrderChanged { order: Vec<i64>, is_custom_emoji: bool },
    StickerSetInstalled { set: StickerSet },
    SavedGifsUpdated,
    GroupCallUpdated { call: GroupCall },
    GroupCallConnectionUpdated { params: String, is_presentation: bool },
    GroupCallParticipantsUpdated {
        call_id: i64,
        participants: Vec<GroupCallParticipant>,
    },
    PendingJoinRequestsUpdated {
        chat_id: i64,
        recent_requester_ids: Vec<i64>,
        requests_pending: i32,
    },
    PhoneCallUpdated { call: PhoneCall },
    PhoneCallSignalingData { call_id: i64, data: Vec<u8> },
    WebViewResultSent { query_id: i64 },
    BotMenuButtonChanged { bot_id: i64, button: BotMenuButton },
    AudioTranscribed {
        transcription_id: i64,
        text: String,
        is_pending: bool,
    },
    ConfigChanged,
    PinnedTopicChanged { chat_id: i64, topic_id: i32, is_pinned: bool },
    PinnedTopicsOrderChanged { chat_id: i64, order: Vec<i32> },
    RecentEmojiStatusesUpdated,
    StoryUpdated { peer_id: i64, story: Story },
    StoryDeleted { peer_id: i64, story_id: i32 },
    StoriesRead { peer_id: i64, last_read_id: i32 },
    SentStoryReaction {
        peer_id: i64,
        story_id: i32,
        reaction: Option<Reaction>,
    },
    StealthModeChanged { stealth_mode: StealthMode },
    AttachMenuBotsUpdated,
    NewAuthorization {
        hash: i64,
        date: Option<i64>,
        device: Option<String>,
        location: Option<String>,
        is_unconfirmed: bool,
    },
    ViewForumAsMessagesChanged { chat_id: i64, is_enabled: bool },
    StarsBalanceChanged { balance: i64 },
    PaidReactionPrivacyChanged { is_private: bool },
}

/// Append-only ordered sink receiving one event at a time in dispatch
/// order. Must not block indefinitely: it runs on the dispatch thread.
pub type EventSink = Arc<dyn Fn(DomainEvent) + Send + Sync>;
