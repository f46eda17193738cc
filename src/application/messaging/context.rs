//! Per-update context shared by every link of a handler chain

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::{Chat, Message, Update, User};
use crate::domain::traits::BotApi;
use crate::infrastructure::scheduler;
use super::parser::{CommandParser, ParsedCommand};

/// Context passed through middleware chain and handlers
#[derive(Clone)]
pub struct Context {
    pub update: Arc<Update>,
    /// Scratch values middleware hands to later links
    pub data: HashMap<String, String>,
    bot: Arc<dyn BotApi>,
    identity: Option<i64>,
    parser: Arc<CommandParser>,
    continue_groups: bool,
    // Flows that already ran a step for this update
    handled_flows: HashSet<String>,
}

impl Context {
    pub fn new(
        update: Arc<Update>,
        bot: Arc<dyn BotApi>,
        identity: Option<i64>,
        parser: Arc<CommandParser>,
    ) -> Self {
        Self {
            update,
            data: HashMap::new(),
            bot,
            identity,
            parser,
            continue_groups: false,
            handled_flows: HashSet::new(),
        }
    }

    pub fn bot(&self) -> &Arc<dyn BotApi> {
        &self.bot
    }

    /// Conversation identity resolved for this update, if any
    pub fn identity(&self) -> Option<i64> {
        self.identity
    }

    pub fn effective_user(&self) -> Option<&User> {
        self.update.effective_user()
    }

    pub fn effective_chat(&self) -> Option<&Chat> {
        self.update.effective_chat()
    }

    pub fn effective_message(&self) -> Option<&Message> {
        self.update.effective_message()
    }

    /// Text of the effective message (or its caption)
    pub fn text(&self) -> Option<&str> {
        self.effective_message().and_then(|m| m.text_or_caption())
    }

    /// The command carried by the effective message, if any
    pub fn command(&self) -> Option<ParsedCommand> {
        self.effective_message()
            .and_then(|m| m.text.as_deref())
            .and_then(|t| self.parser.parse(t))
    }

    /// Command arguments, empty when the update is not a command
    pub fn args(&self) -> Vec<String> {
        self.command().map(|c| c.args).unwrap_or_default()
    }

    /// Get data from context
    pub fn get(&self, key: &str) -> Option<&String> {
        self.data.get(key)
    }

    /// Set data in context
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Ask the dispatcher to keep going into later groups after this handler
    pub fn continue_groups(&mut self) {
        self.continue_groups = true;
    }

    pub(crate) fn wants_continue(&self) -> bool {
        self.continue_groups
    }

    pub(crate) fn reset_continue(&mut self) {
        self.continue_groups = false;
    }

    pub(crate) fn mark_handled(&mut self, flow: &str) {
        if !self.handled_flows.contains(flow) {
            self.handled_flows.insert(flow.to_string());
        }
    }

    /// Whether `flow` already ran a step for this update
    pub fn handled_by(&self, flow: &str) -> bool {
        self.handled_flows.contains(flow)
    }

    /// Send a text message to the effective chat
    pub fn reply(&self, text: &str) -> Result<i64, BotError> {
        let chat = self
            .effective_chat()
            .ok_or_else(|| BotError::Api("update has no chat to reply to".to_string()))?;
        self.bot.send_message(chat.id, text)
    }

    /// Answer the callback query this update carries; no-op for other updates
    pub fn answer_callback(&self, text: Option<&str>) -> Result<(), BotError> {
        match &self.update.callback_query {
            Some(query) => self.bot.answer_callback_query(&query.id, text),
            None => Ok(()),
        }
    }

    /// Delete a message after `delay` without blocking the handler
    pub fn delete_after(&self, chat_id: i64, message_id: i64, delay: Duration) {
        let bot = Arc::clone(&self.bot);
        scheduler::run_after(delay, move || {
            if let Err(e) = bot.delete_message(chat_id, message_id) {
                tracing::warn!(chat_id, message_id, "Delayed delete failed: {}", e);
            }
        });
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("update_id", &self.update.update_id)
            .field("identity", &self.identity)
            .field("data", &self.data)
            .field("handled_flows", &self.handled_flows)
            .finish()
    }
}
