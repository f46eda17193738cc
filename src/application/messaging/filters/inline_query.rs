//! Inline query and chosen inline result filters

use std::sync::Arc;

use crate::domain::entities::{ChatKind, ChosenInlineResult, InlineQuery};
use super::Filter;

pub fn equal(expected: impl Into<String>) -> Filter<InlineQuery> {
    let expected = expected.into();
    Arc::new(move |q: &InlineQuery| q.query == expected)
}

pub fn prefix(prefix: impl Into<String>) -> Filter<InlineQuery> {
    let prefix = prefix.into();
    Arc::new(move |q: &InlineQuery| q.query.starts_with(&prefix))
}

pub fn from_user(user_id: i64) -> Filter<InlineQuery> {
    Arc::new(move |q: &InlineQuery| q.from.id == user_id)
}

pub fn chat_type(kind: ChatKind) -> Filter<InlineQuery> {
    Arc::new(move |q: &InlineQuery| q.chat_type == Some(kind))
}

pub fn result_id(id: impl Into<String>) -> Filter<ChosenInlineResult> {
    let id = id.into();
    Arc::new(move |r: &ChosenInlineResult| r.result_id == id)
}

pub fn result_query_prefix(prefix: impl Into<String>) -> Filter<ChosenInlineResult> {
    let prefix = prefix.into();
    Arc::new(move |r: &ChosenInlineResult| r.query.starts_with(&prefix))
}
