//! tgflow - update dispatch, middleware and conversation flows for chat bots
//!
//! The platform client stays outside: it hands decoded [`Update`]s to a
//! [`Dispatcher`] and implements [`BotApi`] for the replies handlers send.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::conversation::{DataMap, Flow, State};
pub use application::errors::{BotError, ConfigError};
pub use application::messaging::{
    filters, Context, Dispatcher, DispatcherConfig, HandlerHandle, HandlerResult, Middleware,
};
pub use domain::entities::Update;
pub use domain::traits::{BotApi, UpdateSource};
