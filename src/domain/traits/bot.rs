use crate::application::errors::BotError;

/// Bot trait - the outbound half of the platform client.
///
/// Calls are blocking: handlers run synchronously on the dispatching worker.
pub trait BotApi: Send + Sync {
    /// Send a text message to a chat, returning the new message id
    fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, BotError>;

    /// Delete a message previously sent to a chat
    fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError>;

    /// Answer a callback query
    fn answer_callback_query(&self, query_id: &str, text: Option<&str>) -> Result<(), BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotInfo {
    pub id: i64,
    pub name: String,
    pub username: String,
}
