//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Platform integrations (console, in-memory)
//! - Scheduler: Delayed one-shot actions

pub mod adapters;
pub mod config;
pub mod scheduler;
