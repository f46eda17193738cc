//! Callback query filters

use std::sync::Arc;

use crate::domain::entities::CallbackQuery;
use super::Filter;

/// Any callback query carrying data
pub fn data() -> Filter<CallbackQuery> {
    Arc::new(|q: &CallbackQuery| q.data.is_some())
}

pub fn equal(expected: impl Into<String>) -> Filter<CallbackQuery> {
    let expected = expected.into();
    Arc::new(move |q: &CallbackQuery| q.data.as_deref() == Some(expected.as_str()))
}

pub fn prefix(prefix: impl Into<String>) -> Filter<CallbackQuery> {
    let prefix = prefix.into();
    Arc::new(move |q: &CallbackQuery| q.data.as_deref().map_or(false, |d| d.starts_with(&prefix)))
}

pub fn suffix(suffix: impl Into<String>) -> Filter<CallbackQuery> {
    let suffix = suffix.into();
    Arc::new(move |q: &CallbackQuery| q.data.as_deref().map_or(false, |d| d.ends_with(&suffix)))
}

pub fn from_user(user_id: i64) -> Filter<CallbackQuery> {
    Arc::new(move |q: &CallbackQuery| q.from.id == user_id)
}

/// Presses on buttons attached to inline-mode messages
pub fn inline() -> Filter<CallbackQuery> {
    Arc::new(|q: &CallbackQuery| q.inline_message_id.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;

    #[test]
    fn test_data_matchers() {
        let q = CallbackQuery::new("1", User::new(3), "color:red");
        assert!(data()(&q));
        assert!(equal("color:red")(&q));
        assert!(prefix("color:")(&q));
        assert!(suffix(":red")(&q));
        assert!(from_user(3)(&q));
        assert!(!inline()(&q));
    }

    #[test]
    fn test_missing_data() {
        let mut q = CallbackQuery::new("1", User::new(3), "x");
        q.data = None;
        assert!(!data()(&q));
        assert!(!equal("x")(&q));
        assert!(!prefix("")(&q));
    }
}
