//! Message filters (also used for edited messages and channel posts)

use std::sync::Arc;

use regex_lite::Regex;

use crate::application::errors::{BotError, ConfigError};
use crate::application::messaging::parser::CommandParser;
use crate::domain::entities::{ChatKind, Message};
use super::Filter;

/// Any message with text
pub fn text() -> Filter<Message> {
    Arc::new(|m: &Message| m.text.is_some())
}

/// Text equal to `expected`
pub fn equal(expected: impl Into<String>) -> Filter<Message> {
    let expected = expected.into();
    Arc::new(move |m: &Message| m.text.as_deref() == Some(expected.as_str()))
}

/// Text equal to `expected`, ignoring case
pub fn equal_fold(expected: impl Into<String>) -> Filter<Message> {
    let expected = expected.into().to_lowercase();
    Arc::new(move |m: &Message| {
        m.text
            .as_deref()
            .map_or(false, |t| t.to_lowercase() == expected)
    })
}

pub fn prefix(prefix: impl Into<String>) -> Filter<Message> {
    let prefix = prefix.into();
    Arc::new(move |m: &Message| m.text.as_deref().map_or(false, |t| t.starts_with(&prefix)))
}

pub fn suffix(suffix: impl Into<String>) -> Filter<Message> {
    let suffix = suffix.into();
    Arc::new(move |m: &Message| m.text.as_deref().map_or(false, |t| t.ends_with(&suffix)))
}

pub fn contains(needle: impl Into<String>) -> Filter<Message> {
    let needle = needle.into();
    Arc::new(move |m: &Message| m.text.as_deref().map_or(false, |t| t.contains(&needle)))
}

/// Text or caption matching a regular expression
pub fn regex(pattern: &str) -> Result<Filter<Message>, BotError> {
    let re = Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidValue(format!("bad filter pattern {:?}: {}", pattern, e)))?;
    Ok(Arc::new(move |m: &Message| {
        m.text_or_caption().map_or(false, |t| re.is_match(t))
    }))
}

/// Any command
pub fn any_command(parser: Arc<CommandParser>) -> Filter<Message> {
    Arc::new(move |m: &Message| m.text.as_deref().map_or(false, |t| parser.is_command(t)))
}

/// The named command, compared case-insensitively
pub fn command(parser: Arc<CommandParser>, name: impl Into<String>) -> Filter<Message> {
    let name = name.into().to_lowercase();
    Arc::new(move |m: &Message| {
        m.text
            .as_deref()
            .and_then(|t| parser.parse(t))
            .map_or(false, |c| c.name == name)
    })
}

pub fn from_user(user_id: i64) -> Filter<Message> {
    Arc::new(move |m: &Message| m.from.as_ref().map_or(false, |u| u.id == user_id))
}

pub fn chat(chat_id: i64) -> Filter<Message> {
    Arc::new(move |m: &Message| m.chat.id == chat_id)
}

pub fn chat_type(kind: ChatKind) -> Filter<Message> {
    Arc::new(move |m: &Message| m.chat.kind == kind)
}

pub fn private() -> Filter<Message> {
    chat_type(ChatKind::Private)
}

/// Groups and supergroups
pub fn group() -> Filter<Message> {
    Arc::new(|m: &Message| m.chat.kind.is_group())
}

pub fn photo() -> Filter<Message> {
    Arc::new(|m: &Message| !m.photo.is_empty())
}

pub fn document() -> Filter<Message> {
    Arc::new(|m: &Message| m.document.is_some())
}

pub fn sticker() -> Filter<Message> {
    Arc::new(|m: &Message| m.sticker.is_some())
}

pub fn location() -> Filter<Message> {
    Arc::new(|m: &Message| m.location.is_some())
}

pub fn contact() -> Filter<Message> {
    Arc::new(|m: &Message| m.contact.is_some())
}

pub fn reply() -> Filter<Message> {
    Arc::new(|m: &Message| m.reply_to_message.is_some())
}
