//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::application::errors::BotError;
use crate::domain::entities::{Chat, Message, Update, User};
use crate::domain::traits::{BotApi, BotInfo, UpdateSource};

/// Console bot adapter for local development.
///
/// Each stdin line becomes a text message from the configured user; a line
/// starting with `{` is read as a JSON update instead.
pub struct ConsoleAdapter {
    info: BotInfo,
    user_id: i64,
    chat_id: i64,
    next_update_id: i64,
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleAdapter {
    pub fn new(user_id: i64, chat_id: i64) -> Self {
        Self {
            info: BotInfo {
                id: 0,
                name: "tgflow".to_string(),
                username: "console".to_string(),
            },
            user_id,
            chat_id,
            next_update_id: 1,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Outbound half, cheap to share across workers
    pub fn sender(&self) -> ConsoleSender {
        ConsoleSender {
            info: self.info.clone(),
        }
    }

    fn parse_line(&mut self, line: &str) -> Result<Update, BotError> {
        let update_id = self.next_update_id;
        self.next_update_id += 1;

        if line.starts_with('{') {
            let mut update: Update = serde_json::from_str(line)?;
            if update.update_id == 0 {
                update.update_id = update_id;
            }
            return Ok(update);
        }

        let user = User::new(self.user_id).with_username("console");
        let message = Message::from_text(update_id, Chat::private(self.chat_id), line).with_sender(user);
        Ok(Update::from_message(update_id, message))
    }
}

#[async_trait]
impl UpdateSource for ConsoleAdapter {
    async fn next_update(&mut self) -> Result<Option<Update>, BotError> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| BotError::Internal(format!("stdin: {}", e)))?;
            let Some(line) = line else {
                return Ok(None);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return self.parse_line(line).map(Some);
        }
    }
}

/// Prints outbound calls to stdout
#[derive(Clone)]
pub struct ConsoleSender {
    info: BotInfo,
}

impl BotApi for ConsoleSender {
    fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, BotError> {
        println!("[BOT -> {}] {}", chat_id, text);
        Ok(0)
    }

    fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError> {
        println!("[BOT] deleted message {} in {}", message_id, chat_id);
        Ok(())
    }

    fn answer_callback_query(&self, query_id: &str, text: Option<&str>) -> Result<(), BotError> {
        println!("[BOT] answered {} {}", query_id, text.unwrap_or(""));
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parse_text_and_json_lines() {
        let mut adapter = ConsoleAdapter::new(5, 6);

        let text = adapter.parse_line("/start").unwrap();
        assert_eq!(text.update_id, 1);
        assert_eq!(text.effective_user().map(|u| u.id), Some(5));
        assert_eq!(text.effective_chat().map(|c| c.id), Some(6));

        let json = adapter
            .parse_line(r#"{"callback_query":{"id":"c","from":{"id":9,"first_name":"X"},"data":"go"}}"#)
            .unwrap();
        assert_eq!(json.update_id, 2);
        assert_eq!(json.callback_query.unwrap().data.as_deref(), Some("go"));

        assert!(adapter.parse_line("{not json").is_err());
    }
}
