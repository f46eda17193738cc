//! Domain entities - Platform payloads the dispatcher routes on

pub mod events;
pub mod message;
pub mod update;
pub mod user;

pub use events::{
    CallbackQuery, ChatJoinRequest, ChatMember, ChatMemberUpdated, ChosenInlineResult,
    InlineQuery, MemberStatus, MessageReactionUpdated, Poll, PollAnswer, PollOption,
    PreCheckoutQuery, ReactionType, ShippingAddress, ShippingQuery,
};
pub use message::{Contact, Document, Location, Message, MessageType, PhotoSize, Sticker};
pub use update::{Update, UpdateKind};
pub use user::{Chat, ChatKind, User};
