//! Poll and poll answer filters

use std::sync::Arc;

use crate::domain::entities::{Poll, PollAnswer};
use super::Filter;

pub fn poll_id(id: impl Into<String>) -> Filter<Poll> {
    let id = id.into();
    Arc::new(move |p: &Poll| p.id == id)
}

pub fn closed() -> Filter<Poll> {
    Arc::new(|p: &Poll| p.is_closed)
}

pub fn answer_to(poll_id: impl Into<String>) -> Filter<PollAnswer> {
    let poll_id = poll_id.into();
    Arc::new(move |a: &PollAnswer| a.poll_id == poll_id)
}

/// Answers that picked option `index`
pub fn option(index: u32) -> Filter<PollAnswer> {
    Arc::new(move |a: &PollAnswer| a.option_ids.contains(&index))
}

/// Vote retractions (no options selected)
pub fn retracted() -> Filter<PollAnswer> {
    Arc::new(|a: &PollAnswer| a.option_ids.is_empty())
}

pub fn answered_by(user_id: i64) -> Filter<PollAnswer> {
    Arc::new(move |a: &PollAnswer| a.user.as_ref().map_or(false, |u| u.id == user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;

    #[test]
    fn test_answer_matchers() {
        let a = PollAnswer {
            poll_id: "p1".to_string(),
            voter_chat: None,
            user: Some(User::new(4)),
            option_ids: vec![1],
        };
        assert!(answer_to("p1")(&a));
        assert!(option(1)(&a));
        assert!(!option(0)(&a));
        assert!(!retracted()(&a));
        assert!(answered_by(4)(&a));

        let anonymous = PollAnswer { user: None, ..a };
        assert!(!answered_by(4)(&anonymous));
    }
}
