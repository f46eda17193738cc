//! Application layer errors

use std::time::Duration;
use thiserror::Error;

/// General bot errors. Everything a handler or middleware returns travels
/// through the chain unchanged as one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    #[error("Middleware error: {0}")]
    Middleware(String),

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Unknown state: {0}")]
    UnknownState(String),

    #[error("State {state} is not declared in flow {flow}")]
    UndeclaredState { flow: String, state: String },

    #[error("Update has no identity to keep conversation state for")]
    NoIdentity,

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Bot API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for BotError {
    fn from(e: serde_json::Error) -> Self {
        BotError::Serialization(e.to_string())
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
