//! Message reaction filters

use std::sync::Arc;

use crate::domain::entities::{MessageReactionUpdated, ReactionType};
use super::Filter;

/// Reactions that newly include `emoji`
pub fn added(emoji: impl Into<String>) -> Filter<MessageReactionUpdated> {
    let emoji = emoji.into();
    Arc::new(move |r: &MessageReactionUpdated| {
        let has = |list: &[ReactionType]| {
            list.iter()
                .any(|t| matches!(t, ReactionType::Emoji { emoji: e } if *e == emoji))
        };
        has(&r.new_reaction) && !has(&r.old_reaction)
    })
}

/// Every reaction was taken back
pub fn cleared() -> Filter<MessageReactionUpdated> {
    Arc::new(|r: &MessageReactionUpdated| r.new_reaction.is_empty() && !r.old_reaction.is_empty())
}

pub fn from_user(user_id: i64) -> Filter<MessageReactionUpdated> {
    Arc::new(move |r: &MessageReactionUpdated| r.user.as_ref().map_or(false, |u| u.id == user_id))
}

pub fn on_message(chat_id: i64, message_id: i64) -> Filter<MessageReactionUpdated> {
    Arc::new(move |r: &MessageReactionUpdated| r.chat.id == chat_id && r.message_id == message_id)
}
