//! Domain layer - Platform types with no dispatch logic
//! 
//! This layer contains:
//! - Entities: Updates and their payloads (Message, CallbackQuery, ...)
//! - Traits: Abstractions for infrastructure (BotApi, UpdateSource)

pub mod entities;
pub mod traits;
