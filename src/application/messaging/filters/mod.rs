//! Filters - pure predicates deciding whether a handler applies to an update
//!
//! Each submodule builds [`Filter`]s over one payload type. A filter never
//! sees a missing payload: [`lift`] checks for it and answers `false`.

use std::sync::Arc;

use crate::domain::entities::Update;

pub mod callback_query;
pub mod chat_member;
pub mod inline_query;
pub mod message;
pub mod payment;
pub mod poll;
pub mod reaction;

/// Predicate over one update payload
pub type Filter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Predicate over a whole update, as stored in the registry
pub type UpdateFilter = Filter<Update>;

/// Build a filter from a closure
pub fn filter<T, F>(f: F) -> Filter<T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Matches when every filter matches
pub fn all<T: 'static>(filters: Vec<Filter<T>>) -> Filter<T> {
    Arc::new(move |v: &T| filters.iter().all(|f| f(v)))
}

/// Matches when at least one filter matches
pub fn any<T: 'static>(filters: Vec<Filter<T>>) -> Filter<T> {
    Arc::new(move |v: &T| filters.iter().any(|f| f(v)))
}

pub fn not<T: 'static>(inner: Filter<T>) -> Filter<T> {
    Arc::new(move |v: &T| !inner(v))
}

/// Turn a payload filter into an update filter.
///
/// Updates without the payload never match; a `None` filter matches every
/// update that carries it.
pub fn lift<T: 'static>(
    extract: fn(&Update) -> Option<&T>,
    inner: Option<Filter<T>>,
) -> UpdateFilter {
    Arc::new(move |update: &Update| match extract(update) {
        Some(payload) => inner.as_ref().map_or(true, |f| f(payload)),
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::messaging::categories::{Category, OnCallbackQuery, OnMessage};
    use crate::domain::entities::{Chat, Message, Update};

    fn text_update(text: &str) -> Update {
        Update::from_message(1, Message::from_text(1, Chat::private(1), text))
    }

    #[test]
    fn test_lift_rejects_missing_payload() {
        let f = lift(OnCallbackQuery::extract, None);
        assert!(!f(&text_update("hello")));
        assert!(!f(&Update::new(2)));
    }

    #[test]
    fn test_lift_none_matches_payload() {
        let f = lift(OnMessage::extract, None);
        assert!(f(&text_update("anything")));
    }

    #[test]
    fn test_combinators() {
        let hello = message::prefix("hel");
        let world = message::suffix("rld");
        let both = lift(OnMessage::extract, Some(all(vec![hello.clone(), world.clone()])));
        let either = lift(OnMessage::extract, Some(any(vec![hello, world.clone()])));
        let neither = lift(OnMessage::extract, Some(not(world)));

        assert!(both(&text_update("hello world")));
        assert!(!both(&text_update("hello there")));
        assert!(either(&text_update("hello there")));
        assert!(neither(&text_update("hello there")));
        assert!(!neither(&text_update("world")));
    }
}
