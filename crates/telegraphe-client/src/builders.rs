//! Entity builders: the seam between wire records and normalized values.
//!
//! The dispatcher never decodes entity payloads itself. It hands the raw
//! record to the [`EntityBuilders`] implementation supplied by the host
//! application and emits an event only when the builder returns `Some`.
//! Every method defaults to `None`, so a host overrides exactly the
//! entities it cares about and the dispatcher silently drops the rest.

use bytes::Bytes;

use crate::events::{
    BannedRights, BotMenuButton, BoughtMedia, Chat, ChatFolder, ChatMember, Draft,
    EmojiInteraction, EmojiStatus, GroupCall, GroupCallParticipant, MediaPreview, Message,
    MessageReactions, PhoneCall, Photo, Poll, PollResults, PrivacyKey, PrivacyRules, Reaction,
    StealthMode, StickerSet, Story, TypingStatus, User, UserStatus,
};
use crate::wire::{
    RawChannel, RawChatFolder, RawExtendedMedia, RawGroupCall, RawMessage, RawPhoto, RawPoll,
    RawPollResults, RawReactions, RawStickerSet, RawStory, RawTypingAction, RawUser,
};

/// Host-supplied decoders from raw wire records to normalized values.
///
/// `None` from any method means "this record could not (or should not) be
/// represented"; the dispatcher drops the corresponding event, or omits
/// the field when the event can stand without it.
pub trait EntityBuilders {
    fn build_message(&self, message: &RawMessage) -> Option<Message> {
        let _ = message;
        None
    }

    fn build_photo(&self, photo: &RawPhoto) -> Option<Photo> {
        let _ = photo;
        None
    }

    fn build_poll(&self, poll: &RawPoll) -> Option<Poll> {
        let _ = poll;
        None
    }

    fn build_poll_results(&self, results: &RawPollResults) -> Option<PollResults> {
        let _ = results;
        None
    }

    fn build_reactions(&self, reactions: &RawReactions) -> Option<MessageReactions> {
        let _ = reactions;
        None
    }

    fn build_reaction(&self, reaction: &Bytes) -> Option<Reaction> {
        let _ = reaction;
        None
    }

    fn build_bought_media(&self, media: &[RawExtendedMedia]) -> Option<Vec<BoughtMedia>> {
        let _ = media;
        None
    }

    fn build_media_preview(&self, preview: &Bytes) -> Option<MediaPreview> {
        let _ = preview;
        None
    }

    fn build_chat(&self, channel: &RawChannel) -> Option<Chat> {
        let _ = channel;
        None
    }

    fn build_banned_rights(&self, rights: &Bytes) -> Option<BannedRights> {
        let _ = rights;
        None
    }

    fn build_chat_folder(&self, folder: &RawChatFolder) -> Option<ChatFolder> {
        let _ = folder;
        None
    }

    fn build_chat_members(&self, participants: &Bytes) -> Option<Vec<ChatMember>> {
        let _ = participants;
        None
    }

    fn build_typing_status(&self, action: &RawTypingAction) -> Option<TypingStatus> {
        let _ = action;
        None
    }

    fn build_emoji_interaction(&self, data: &str) -> Option<EmojiInteraction> {
        let _ = data;
        None
    }

    fn build_user(&self, user: &RawUser) -> Option<User> {
        let _ = user;
        None
    }

    fn build_user_status(&self, status: &Bytes) -> Option<UserStatus> {
        let _ = status;
        None
    }

    fn build_emoji_status(&self, status: &Bytes) -> Option<EmojiStatus> {
        let _ = status;
        None
    }

    fn build_privacy_key(&self, key: &Bytes) -> Option<PrivacyKey> {
        let _ = key;
        None
    }

    fn build_privacy_rules(&self, rules: &Bytes) -> Option<PrivacyRules> {
        let _ = rules;
        None
    }

    fn build_draft(&self, draft: &Bytes) -> Option<Draft> {
        let _ = draft;
        None
    }

    fn build_sticker_set(&self, set: &RawStickerSet) -> Option<StickerSet> {
        let _ = set;
        None
    }

    fn build_group_call(&self, call: &RawGroupCall) -> Option<GroupCall> {
        let _ = call;
        None
    }

    fn build_group_call_participant(&self, participant: &Bytes) -> Option<GroupCallParticipant> {
        let _ = participant;
        None
    }

    fn build_phone_call(&self, call: &Bytes) -> Option<PhoneCall> {
        let _ = call;
        None
    }

    fn build_bot_menu_button(&self, button: &Bytes) -> Option<BotMenuButton> {
        let _ = button;
        None
    }

    fn build_story(&self, peer_id: i64, story: &RawStory) -> Option<Story> {
        let _ = (peer_id, story);
        None
    }

    fn build_stealth_mode(&self, stealth_mode: &Bytes) -> Option<StealthMode> {
        let _ = stealth_mode;
        None
    }
}

/// Builders that decode nothing. Useful for hosts that only consume the
/// structural events (deletions, reads, pins, connection state).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBuilders;

impl EntityBuilders for NoopBuilders {}
