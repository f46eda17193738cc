use super::{
    CallbackQuery, Chat, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult, InlineQuery,
    Message, MessageReactionUpdated, Poll, PollAnswer, PreCheckoutQuery, ShippingQuery, User,
};
use serde::{Deserialize, Serialize};

/// Category of an update, by which sub-payload it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    CallbackQuery,
    InlineQuery,
    ChosenInlineResult,
    Poll,
    PollAnswer,
    MessageReaction,
    ShippingQuery,
    PreCheckoutQuery,
    ChatMember,
    ChatJoinRequest,
    Unknown,
}

impl UpdateKind {
    pub fn as_str(&self) -> &str {
        match self {
            UpdateKind::Message => "message",
            UpdateKind::EditedMessage => "edited_message",
            UpdateKind::ChannelPost => "channel_post",
            UpdateKind::EditedChannelPost => "edited_channel_post",
            UpdateKind::CallbackQuery => "callback_query",
            UpdateKind::InlineQuery => "inline_query",
            UpdateKind::ChosenInlineResult => "chosen_inline_result",
            UpdateKind::Poll => "poll",
            UpdateKind::PollAnswer => "poll_answer",
            UpdateKind::MessageReaction => "message_reaction",
            UpdateKind::ShippingQuery => "shipping_query",
            UpdateKind::PreCheckoutQuery => "pre_checkout_query",
            UpdateKind::ChatMember => "chat_member",
            UpdateKind::ChatJoinRequest => "chat_join_request",
            UpdateKind::Unknown => "unknown",
        }
    }
}

/// A single inbound event. At most one payload is set by the platform;
/// the dispatcher never relies on that.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
    pub channel_post: Option<Message>,
    pub edited_channel_post: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
    pub inline_query: Option<InlineQuery>,
    pub chosen_inline_result: Option<ChosenInlineResult>,
    pub poll: Option<Poll>,
    pub poll_answer: Option<PollAnswer>,
    pub message_reaction: Option<MessageReactionUpdated>,
    pub shipping_query: Option<ShippingQuery>,
    pub pre_checkout_query: Option<PreCheckoutQuery>,
    pub chat_member: Option<ChatMemberUpdated>,
    pub chat_join_request: Option<ChatJoinRequest>,
}

impl Update {
    pub fn new(update_id: i64) -> Self {
        Self {
            update_id,
            ..Self::default()
        }
    }

    pub fn from_message(update_id: i64, message: Message) -> Self {
        Self {
            update_id,
            message: Some(message),
            ..Self::default()
        }
    }

    pub fn from_callback_query(update_id: i64, query: CallbackQuery) -> Self {
        Self {
            update_id,
            callback_query: Some(query),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> UpdateKind {
        if self.message.is_some() {
            UpdateKind::Message
        } else if self.edited_message.is_some() {
            UpdateKind::EditedMessage
        } else if self.channel_post.is_some() {
            UpdateKind::ChannelPost
        } else if self.edited_channel_post.is_some() {
            UpdateKind::EditedChannelPost
        } else if self.callback_query.is_some() {
            UpdateKind::CallbackQuery
        } else if self.inline_query.is_some() {
            UpdateKind::InlineQuery
        } else if self.chosen_inline_result.is_some() {
            UpdateKind::ChosenInlineResult
        } else if self.poll.is_some() {
            UpdateKind::Poll
        } else if self.poll_answer.is_some() {
            UpdateKind::PollAnswer
        } else if self.message_reaction.is_some() {
            UpdateKind::MessageReaction
        } else if self.shipping_query.is_some() {
            UpdateKind::ShippingQuery
        } else if self.pre_checkout_query.is_some() {
            UpdateKind::PreCheckoutQuery
        } else if self.chat_member.is_some() {
            UpdateKind::ChatMember
        } else if self.chat_join_request.is_some() {
            UpdateKind::ChatJoinRequest
        } else {
            UpdateKind::Unknown
        }
    }

    /// The message this update carries, including the one a button was attached to
    pub fn effective_message(&self) -> Option<&Message> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
            .or(self.edited_channel_post.as_ref())
            .or_else(|| self.callback_query.as_ref().and_then(|q| q.message.as_ref()))
    }

    pub fn effective_user(&self) -> Option<&User> {
        if let Some(msg) = self.message.as_ref().or(self.edited_message.as_ref()) {
            return msg.from.as_ref();
        }
        if let Some(post) = self.channel_post.as_ref().or(self.edited_channel_post.as_ref()) {
            return post.from.as_ref();
        }
        if let Some(q) = &self.callback_query {
            return Some(&q.from);
        }
        if let Some(q) = &self.inline_query {
            return Some(&q.from);
        }
        if let Some(r) = &self.chosen_inline_result {
            return Some(&r.from);
        }
        if let Some(a) = &self.poll_answer {
            return a.user.as_ref();
        }
        if let Some(r) = &self.message_reaction {
            return r.user.as_ref();
        }
        if let Some(q) = &self.shipping_query {
            return Some(&q.from);
        }
        if let Some(q) = &self.pre_checkout_query {
            return Some(&q.from);
        }
        if let Some(m) = &self.chat_member {
            return Some(&m.from);
        }
        self.chat_join_request.as_ref().map(|r| &r.from)
    }

    pub fn effective_chat(&self) -> Option<&Chat> {
        if let Some(msg) = self.effective_message() {
            return Some(&msg.chat);
        }
        if let Some(a) = &self.poll_answer {
            return a.voter_chat.as_ref();
        }
        if let Some(r) = &self.message_reaction {
            return Some(&r.chat);
        }
        if let Some(m) = &self.chat_member {
            return Some(&m.chat);
        }
        self.chat_join_request.as_ref().map(|r| &r.chat)
    }
}
