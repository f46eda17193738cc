//! Update categories - which payload a handler registration is about

use crate::domain::entities::{
    CallbackQuery, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult, InlineQuery, Message,
    MessageReactionUpdated, Poll, PollAnswer, PreCheckoutQuery, ShippingQuery, Update,
};

/// A category of update and the payload its filters look at
pub trait Category {
    type Payload: 'static;

    const NAME: &'static str;

    fn extract(update: &Update) -> Option<&Self::Payload>;
}

macro_rules! category {
    ($(#[$doc:meta])* $marker:ident, $payload:ty, $field:ident) => {
        $(#[$doc])*
        pub struct $marker;

        impl Category for $marker {
            type Payload = $payload;

            const NAME: &'static str = stringify!($field);

            fn extract(update: &Update) -> Option<&$payload> {
                update.$field.as_ref()
            }
        }
    };
}

category!(
    /// New incoming messages
    OnMessage, Message, message
);
category!(OnEditedMessage, Message, edited_message);
category!(OnChannelPost, Message, channel_post);
category!(OnEditedChannelPost, Message, edited_channel_post);
category!(
    /// Inline keyboard button presses
    OnCallbackQuery, CallbackQuery, callback_query
);
category!(OnInlineQuery, InlineQuery, inline_query);
category!(OnChosenInlineResult, ChosenInlineResult, chosen_inline_result);
category!(
    /// Poll state changes (no user attached)
    OnPoll, Poll, poll
);
category!(OnPollAnswer, PollAnswer, poll_answer);
category!(OnMessageReaction, MessageReactionUpdated, message_reaction);
category!(OnShippingQuery, ShippingQuery, shipping_query);
category!(OnPreCheckoutQuery, PreCheckoutQuery, pre_checkout_query);
category!(OnChatMember, ChatMemberUpdated, chat_member);
category!(OnChatJoinRequest, ChatJoinRequest, chat_join_request);
