//! In-memory adapter: records outbound calls instead of sending them

use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;

use crate::application::errors::BotError;
use crate::domain::traits::{BotApi, BotInfo};

/// A message the bot would have sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

/// Bot adapter for tests and dry runs
pub struct MemoryAdapter {
    info: BotInfo,
    next_id: AtomicI64,
    sent: Mutex<Vec<SentMessage>>,
    deleted: Mutex<Vec<(i64, i64)>>,
    answered: Mutex<Vec<String>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: 0,
                name: "tgflow".to_string(),
                username: "tgflow_bot".to_string(),
            },
            next_id: AtomicI64::new(1),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            answered: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Texts of sent messages, oldest first
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|m| m.text.clone()).collect()
    }

    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.text.clone())
            .collect()
    }

    /// (chat id, message id) pairs deleted so far
    pub fn deleted(&self) -> Vec<(i64, i64)> {
        self.deleted.lock().clone()
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
        self.deleted.lock().clear();
        self.answered.lock().clear();
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BotApi for MemoryAdapter {
    fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, BotError> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().push(SentMessage {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(message_id)
    }

    fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError> {
        self.deleted.lock().push((chat_id, message_id));
        Ok(())
    }

    fn answer_callback_query(&self, query_id: &str, _text: Option<&str>) -> Result<(), BotError> {
        self.answered.lock().push(query_id.to_string());
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
