//! Application layer - Dispatch and conversation logic
//! 
//! This layer contains:
//! - Errors: Error taxonomy shared by handlers and middleware
//! - Messaging: Filters, middleware, dispatching
//! - Conversation: Identity store and flows

pub mod conversation;
pub mod errors;
pub mod messaging;
