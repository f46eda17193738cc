use async_trait::async_trait;
use crate::application::errors::BotError;
use crate::domain::entities::Update;

/// Source of inbound updates (long polling, webhook, console)
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Wait for the next update. `Ok(None)` means the source is exhausted.
    async fn next_update(&mut self) -> Result<Option<Update>, BotError>;
}
