//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod source;

pub use bot::{BotApi, BotInfo};
pub use source::UpdateSource;
