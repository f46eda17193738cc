//! Command parser - Splits "/name@bot args" text into its parts

use once_cell::sync::Lazy;
use regex_lite::Regex;

static COMMAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([^\s@]+)(?:@(\S+))?(?:\s+(.*))?$").expect("command pattern is valid")
});

/// A command extracted from message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name without trigger or mention
    pub name: String,
    /// `@botname` suffix, if the command was addressed explicitly
    pub mention: Option<String>,
    pub args: Vec<String>,
    /// Everything after the command token, untouched
    pub raw_args: String,
}

/// Parses command messages
#[derive(Debug, Clone)]
pub struct CommandParser {
    triggers: Vec<char>,
    bot_username: Option<String>,
}

impl CommandParser {
    pub fn new(triggers: Vec<char>, bot_username: Option<String>) -> Self {
        let triggers = if triggers.is_empty() { vec!['/'] } else { triggers };
        Self {
            triggers,
            bot_username: bot_username.map(|u| u.trim_start_matches('@').to_lowercase()),
        }
    }

    pub fn triggers(&self) -> &[char] {
        &self.triggers
    }

    pub fn is_command(&self, text: &str) -> bool {
        self.parse(text).is_some()
    }

    /// Parse a command. Commands addressed to a different bot yield `None`.
    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        let mut chars = text.chars();
        let first = chars.next()?;
        if !self.triggers.contains(&first) {
            return None;
        }

        let caps = COMMAND_RE.captures(chars.as_str())?;
        let name = caps.get(1)?.as_str().to_lowercase();
        let mention = caps.get(2).map(|m| m.as_str().to_string());

        if let (Some(mention), Some(own)) = (&mention, &self.bot_username) {
            if mention.to_lowercase() != *own {
                return None;
            }
        }

        let raw_args = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        let args = raw_args.split_whitespace().map(|s| s.to_string()).collect();

        Some(ParsedCommand {
            name,
            mention,
            args,
            raw_args,
        })
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(vec!['/'], None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let parser = CommandParser::default();
        let cmd = parser.parse("/Start").unwrap();
        assert_eq!(cmd.name, "start");
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.mention, None);
    }

    #[test]
    fn test_parse_args_and_mention() {
        let parser = CommandParser::new(vec!['/', '!'], Some("@Flow_Bot".to_string()));
        let cmd = parser.parse("!echo@flow_bot hello   world").unwrap();
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.mention.as_deref(), Some("flow_bot"));
        assert_eq!(cmd.args, vec!["hello", "world"]);
        assert_eq!(cmd.raw_args, "hello   world");
    }

    #[test]
    fn test_command_for_other_bot_is_ignored() {
        let parser = CommandParser::new(vec!['/'], Some("flow_bot".to_string()));
        assert!(parser.parse("/start@other_bot").is_none());
    }

    #[test]
    fn test_plain_text_is_not_command() {
        let parser = CommandParser::default();
        assert!(!parser.is_command("hello /start"));
        assert!(!parser.is_command("/"));
        assert!(!parser.is_command(""));
    }
}
