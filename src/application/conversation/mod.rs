//! Conversations - per-identity state machines on top of the dispatcher

pub mod flow;
pub mod session;

pub use flow::{Flow, State, StepHandler, DEFAULT_PROMPT, FALLBACK_GROUP};
pub use session::{DataMap, SessionCell, SessionStore};
