//! Chat member and join request filters

use std::sync::Arc;

use crate::domain::entities::{ChatJoinRequest, ChatMemberUpdated, MemberStatus};
use super::Filter;

fn is_in(status: MemberStatus) -> bool {
    matches!(
        status,
        MemberStatus::Creator | MemberStatus::Administrator | MemberStatus::Member | MemberStatus::Restricted
    )
}

/// A user became a member
pub fn joined() -> Filter<ChatMemberUpdated> {
    Arc::new(|u: &ChatMemberUpdated| {
        !is_in(u.old_chat_member.status) && is_in(u.new_chat_member.status)
    })
}

/// A user left or was removed
pub fn left() -> Filter<ChatMemberUpdated> {
    Arc::new(|u: &ChatMemberUpdated| {
        is_in(u.old_chat_member.status) && !is_in(u.new_chat_member.status)
    })
}

pub fn member_chat(chat_id: i64) -> Filter<ChatMemberUpdated> {
    Arc::new(move |u: &ChatMemberUpdated| u.chat.id == chat_id)
}

pub fn join_request_chat(chat_id: i64) -> Filter<ChatJoinRequest> {
    Arc::new(move |r: &ChatJoinRequest| r.chat.id == chat_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Chat, ChatMember, User};

    fn change(old: MemberStatus, new: MemberStatus) -> ChatMemberUpdated {
        ChatMemberUpdated {
            chat: Chat::group(-1, "g"),
            from: User::new(2),
            date: 0,
            old_chat_member: ChatMember {
                user: User::new(2),
                status: old,
            },
            new_chat_member: ChatMember {
                user: User::new(2),
                status: new,
            },
        }
    }

    #[test]
    fn test_membership_transitions() {
        let join = change(MemberStatus::Left, MemberStatus::Member);
        let leave = change(MemberStatus::Member, MemberStatus::Kicked);
        assert!(joined()(&join));
        assert!(!left()(&join));
        assert!(left()(&leave));
        assert!(member_chat(-1)(&leave));
    }
}
