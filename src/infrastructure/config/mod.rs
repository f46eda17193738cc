//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;
use crate::application::messaging::DispatcherConfig;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    pub security: SecurityConfig,
    pub whitelist: WhitelistConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConversationConfig {
    /// Reply used when an update reaches a flow with nothing to handle it
    pub default_prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecurityConfig {
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Whitelist configuration for user access control
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WhitelistConfig {
    pub enabled: bool,
    pub users: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub user_id: i64,
    pub chat_id: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "tgflow".to_string(),
                username: None,
            },
            dispatcher: DispatcherConfig::default(),
            conversation: ConversationConfig::default(),
            security: SecurityConfig {
                rate_limit: RateLimitConfig {
                    enabled: true,
                    max_requests: 20,
                    window_seconds: 60,
                },
            },
            whitelist: WhitelistConfig {
                enabled: false,
                users: Vec::new(),
            },
            adapters: AdaptersConfig {
                console: Some(ConsoleConfig {
                    enabled: true,
                    user_id: 1000,
                    chat_id: 1000,
                }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.name.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.name".to_string()));
        }
        if self.dispatcher.command_triggers.iter().any(|c| c.is_whitespace()) {
            return Err(ConfigError::InvalidValue(
                "dispatcher.command-triggers must not contain whitespace".to_string(),
            ));
        }
        let limit = &self.security.rate_limit;
        if limit.enabled && (limit.max_requests == 0 || limit.window_seconds == 0) {
            return Err(ConfigError::InvalidValue(
                "security.rate-limit needs a non-zero budget and window".to_string(),
            ));
        }
        Ok(())
    }

    /// Dispatcher settings with the bot username folded in
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        let mut config = self.dispatcher.clone();
        if config.bot_username.is_none() {
            config.bot_username = self.bot.username.clone();
        }
        config
    }

    /// Defaults with environment overrides applied
    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Override fields from `BOT_USERNAME` and `BOT_PREFIX`
    pub fn apply_env(&mut self) {
        if let Ok(username) = std::env::var("BOT_USERNAME") {
            self.bot.username = Some(username);
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            let triggers: Vec<char> = prefix.chars().filter(|c| !c.is_whitespace()).collect();
            if !triggers.is_empty() {
                self.dispatcher.command_triggers = triggers;
            }
        }
    }
}
