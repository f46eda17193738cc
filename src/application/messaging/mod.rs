//! Update handling - Event-driven dispatch through middleware to handlers

pub mod categories;
pub mod context;
pub mod dispatcher;
pub mod filters;
pub mod middleware;
pub mod parser;

pub use categories::Category;
pub use context::Context;
pub use dispatcher::{
    CommandHandle, Dispatcher, DispatcherConfig, GroupPolicy, HandlerHandle, IdentityPolicy,
    DEFAULT_GROUP,
};
pub use filters::{Filter, UpdateFilter};
pub use middleware::{
    AllowListMiddleware, Handler, HandlerResult, LoggingMiddleware, Middleware, MiddlewareChain,
    RateLimitMiddleware,
};
pub use parser::{CommandParser, ParsedCommand};
