//! Update dispatcher - Routes updates to registered handlers
//!
//! Handlers live in numbered groups. Groups run in ascending order; inside a
//! group the first entry whose filter matches wins. An entry is identified by
//! its (group, name) pair, so registering the same pair again swaps the
//! handler instead of adding a second one.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::application::conversation::session::SessionStore;
use crate::application::errors::BotError;
use crate::domain::entities::Update;
use crate::domain::traits::BotApi;
use super::categories::{Category, OnCallbackQuery, OnMessage};
use super::context::Context;
use super::filters::{self, Filter, UpdateFilter};
use super::middleware::{Handler, HandlerResult, Middleware, MiddlewareChain};
use super::parser::CommandParser;

/// Group used by the registration shortcuts
pub const DEFAULT_GROUP: i32 = 0;

/// What happens after a group produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupPolicy {
    /// Dispatch ends with the first group that matched, unless the handler
    /// calls [`Context::continue_groups`]
    #[default]
    Stop,
    /// Every group gets its first match
    Continue,
}

/// How the conversation identity of an update is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityPolicy {
    /// User id, else chat id
    #[default]
    UserOrChat,
    User,
    Chat,
}

impl IdentityPolicy {
    /// Identity for an update. Zero ids are treated as missing; nothing
    /// resolves to a shared default bucket.
    pub fn resolve(&self, update: &Update) -> Option<i64> {
        let user = update.effective_user().map(|u| u.id).filter(|id| *id != 0);
        let chat = update.effective_chat().map(|c| c.id).filter(|id| *id != 0);
        match self {
            IdentityPolicy::UserOrChat => user.or(chat),
            IdentityPolicy::User => user,
            IdentityPolicy::Chat => chat,
        }
    }
}

/// Dispatcher settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DispatcherConfig {
    pub group_policy: GroupPolicy,
    pub identity: IdentityPolicy,
    pub command_triggers: Vec<char>,
    /// Commands addressed to another `@bot` are ignored when set
    pub bot_username: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            group_policy: GroupPolicy::Stop,
            identity: IdentityPolicy::UserOrChat,
            command_triggers: vec!['/'],
            bot_username: None,
        }
    }
}

/// Reference to a registered handler
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerHandle {
    pub group: i32,
    pub name: String,
}

/// Reference to a registered command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHandle {
    /// Command name, lowercased and without trigger
    pub command: String,
    pub handle: HandlerHandle,
}

#[derive(Clone)]
struct HandlerEntry {
    name: String,
    filter: Option<UpdateFilter>,
    response: Handler,
}

impl HandlerEntry {
    fn matches(&self, update: &Update) -> bool {
        self.filter.as_ref().map_or(true, |f| f(update))
    }
}

type GroupTable = BTreeMap<i32, Vec<HandlerEntry>>;

/// Update dispatcher - owns the handler registry and the identity store of
/// one bot instance
pub struct Dispatcher {
    config: DispatcherConfig,
    bot: Arc<dyn BotApi>,
    parser: Arc<CommandParser>,
    sessions: Arc<SessionStore>,
    middleware: RwLock<MiddlewareChain>,
    // Copy-on-write: dispatch takes a snapshot and never holds the lock
    // while a handler runs
    groups: RwLock<Arc<GroupTable>>,
}

impl Dispatcher {
    pub fn new(bot: Arc<dyn BotApi>, config: DispatcherConfig) -> Self {
        let parser = CommandParser::new(config.command_triggers.clone(), config.bot_username.clone());
        Self {
            config,
            bot,
            parser: Arc::new(parser),
            sessions: Arc::new(SessionStore::new()),
            middleware: RwLock::new(MiddlewareChain::new()),
            groups: RwLock::new(Arc::new(GroupTable::new())),
        }
    }

    /// Add middleware to the chain
    pub fn with_middleware<M: Middleware + 'static>(self, middleware: M) -> Self {
        self.use_middleware(middleware);
        self
    }

    /// Append a middleware. Handlers are wrapped when they are registered, so
    /// handlers registered earlier do not run it.
    pub fn use_middleware<M: Middleware + 'static>(&self, middleware: M) {
        let registered = self.len();
        if registered > 0 {
            tracing::warn!(
                "Middleware added after {} handlers were registered; they will not run it",
                registered
            );
        }
        self.middleware.write().push(Arc::new(middleware));
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn bot(&self) -> &Arc<dyn BotApi> {
        &self.bot
    }

    pub fn parser(&self) -> &Arc<CommandParser> {
        &self.parser
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn resolve_identity(&self, update: &Update) -> Option<i64> {
        self.config.identity.resolve(update)
    }

    /// Register a handler over whole updates. A `None` filter matches
    /// every update.
    pub fn register<F>(
        &self,
        group: i32,
        name: impl Into<String>,
        filter: Option<UpdateFilter>,
        handler: F,
    ) -> HandlerHandle
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        let name = name.into();
        let response = self.middleware.read().compose(Arc::new(handler));

        let mut groups = self.groups.write();
        let table = Arc::make_mut(&mut *groups);
        let entries = table.entry(group).or_default();

        let before = entries.len();
        entries.retain(|e| e.name != name);
        if entries.len() != before {
            tracing::info!(group, name = %name, "Replaced handler");
        } else {
            tracing::debug!(group, name = %name, "Registered handler");
        }

        entries.push(HandlerEntry {
            name: name.clone(),
            filter,
            response,
        });

        HandlerHandle { group, name }
    }

    /// Register a handler for one update category. Updates of other
    /// categories never reach `filter`.
    pub fn register_for<C, F>(
        &self,
        group: i32,
        name: impl Into<String>,
        filter: Option<Filter<C::Payload>>,
        handler: F,
    ) -> HandlerHandle
    where
        C: Category,
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::trace!(category = C::NAME, name = %name, "Category registration");
        self.register(group, name, Some(filters::lift(C::extract, filter)), handler)
    }

    /// Message handler in the default group
    pub fn message<F>(
        &self,
        name: impl Into<String>,
        filter: Option<Filter<crate::domain::entities::Message>>,
        handler: F,
    ) -> HandlerHandle
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_for::<OnMessage, F>(DEFAULT_GROUP, name, filter, handler)
    }

    /// Callback query handler in the default group
    pub fn callback_query<F>(
        &self,
        name: impl Into<String>,
        filter: Option<Filter<crate::domain::entities::CallbackQuery>>,
        handler: F,
    ) -> HandlerHandle
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_for::<OnCallbackQuery, F>(DEFAULT_GROUP, name, filter, handler)
    }

    /// Command handler in the default group, named `command_<name>`
    pub fn command<F>(&self, name: &str, handler: F) -> CommandHandle
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        let command = name
            .trim_start_matches(|c| self.parser.triggers().contains(&c))
            .to_lowercase();
        let filter = filters::message::command(Arc::clone(&self.parser), command.clone());
        let handle = self.message(format!("command_{}", command), Some(filter), handler);
        tracing::info!(command = %command, "Registered command");
        CommandHandle { command, handle }
    }

    /// Remove a handler; returns whether it was registered
    pub fn remove(&self, handle: &HandlerHandle) -> bool {
        let mut groups = self.groups.write();
        let table = Arc::make_mut(&mut *groups);
        let Some(entries) = table.get_mut(&handle.group) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.name != handle.name);
        let removed = entries.len() != before;
        if entries.is_empty() {
            table.remove(&handle.group);
        }
        removed
    }

    /// Handler names of a group, in match order
    pub fn handler_names(&self, group: i32) -> Vec<String> {
        self.groups
            .read()
            .get(&group)
            .map(|entries| entries.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn groups(&self) -> Vec<i32> {
        self.groups.read().keys().copied().collect()
    }

    /// Number of registered handlers across all groups
    pub fn len(&self) -> usize {
        self.groups.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Idle sessions are not kept once their update is done
    fn release_session(&self, identity: Option<i64>) {
        if let Some(identity) = identity {
            self.sessions.evict(identity);
        }
    }

    /// Dispatch an update. Returns the handlers that ran; a handler error
    /// stops dispatch and is returned as is.
    pub fn dispatch(&self, update: Update) -> Result<Vec<HandlerHandle>, BotError> {
        let update = Arc::new(update);
        let identity = self.resolve_identity(&update);
        let table = Arc::clone(&*self.groups.read());

        let mut ctx = Context::new(
            Arc::clone(&update),
            Arc::clone(&self.bot),
            identity,
            Arc::clone(&self.parser),
        );
        let mut fired = Vec::new();

        for (group, entries) in table.iter() {
            let Some(entry) = entries.iter().find(|e| e.matches(&update)) else {
                continue;
            };

            tracing::debug!(
                update_id = update.update_id,
                group = *group,
                handler = %entry.name,
                "Dispatching"
            );

            ctx.reset_continue();
            if let Err(e) = (entry.response)(&mut ctx) {
                tracing::debug!(
                    update_id = update.update_id,
                    handler = %entry.name,
                    "Handler failed: {}",
                    e
                );
                self.release_session(identity);
                return Err(e);
            }

            fired.push(HandlerHandle {
                group: *group,
                name: entry.name.clone(),
            });

            if self.config.group_policy == GroupPolicy::Stop && !ctx.wants_continue() {
                break;
            }
        }

        self.release_session(identity);

        if fired.is_empty() {
            tracing::debug!(
                update_id = update.update_id,
                kind = update.kind().as_str(),
                "No handler matched"
            );
        }

        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CallbackQuery, Chat, Message, Poll, User};
    use crate::infrastructure::adapters::memory::MemoryAdapter;
    use parking_lot::Mutex;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(MemoryAdapter::new()), DispatcherConfig::default())
    }

    fn text(user_id: i64, text: &str) -> Update {
        let msg = Message::from_text(1, Chat::private(user_id), text).with_sender(User::new(user_id));
        Update::from_message(1, msg)
    }

    fn tracker(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> impl Fn(&mut Context) -> HandlerResult {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        move |_ctx: &mut Context| {
            log.lock().push(tag.clone());
            Ok(())
        }
    }

    #[test]
    fn test_first_match_in_group_wins() {
        let d = dispatcher();
        let log = Arc::new(Mutex::new(Vec::new()));
        d.message("hello", Some(filters::message::prefix("hel")), tracker(&log, "hello"));
        d.message("any", None, tracker(&log, "any"));

        let fired = d.dispatch(text(1, "help")).unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].name, "hello");

        d.dispatch(text(1, "bye")).unwrap();
        assert_eq!(*log.lock(), vec!["hello", "any"]);
    }

    #[test]
    fn test_groups_in_ascending_order() {
        let d = dispatcher();
        let log = Arc::new(Mutex::new(Vec::new()));
        d.register(10, "late", None, tracker(&log, "late"));
        d.register(-5, "early", None, tracker(&log, "early"));

        let fired = d.dispatch(text(1, "x")).unwrap();
        assert_eq!(fired, vec![HandlerHandle { group: -5, name: "early".to_string() }]);
        assert_eq!(*log.lock(), vec!["early"]);
        assert_eq!(d.groups(), vec![-5, 10]);
    }

    #[test]
    fn test_continue_policy_and_override() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let config = DispatcherConfig {
            group_policy: GroupPolicy::Continue,
            ..DispatcherConfig::default()
        };
        let d = Dispatcher::new(Arc::new(MemoryAdapter::new()), config);
        d.register(0, "a", None, tracker(&log, "a"));
        d.register(1, "b", None, tracker(&log, "b"));
        assert_eq!(d.dispatch(text(1, "x")).unwrap().len(), 2);

        let d = dispatcher();
        let inner = Arc::clone(&log);
        d.register(0, "a", None, move |ctx: &mut Context| {
            inner.lock().push("a2".to_string());
            ctx.continue_groups();
            Ok(())
        });
        d.register(1, "b", None, tracker(&log, "b2"));
        assert_eq!(d.dispatch(text(1, "x")).unwrap().len(), 2);
        assert_eq!(*log.lock(), vec!["a", "b", "a2", "b2"]);
    }

    #[test]
    fn test_reregistration_replaces_entry() {
        let d = dispatcher();
        let log = Arc::new(Mutex::new(Vec::new()));
        d.message("greet", None, tracker(&log, "old"));
        d.message("other", None, tracker(&log, "other"));
        d.message("greet", None, tracker(&log, "new"));

        assert_eq!(d.len(), 2);
        // Replacement moves to the end of the group
        assert_eq!(d.handler_names(DEFAULT_GROUP), vec!["other", "greet"]);

        // Same name in another group is a different entry
        d.register(1, "greet", None, tracker(&log, "g1"));
        assert_eq!(d.len(), 3);

        d.remove(&HandlerHandle { group: DEFAULT_GROUP, name: "other".to_string() });
        d.dispatch(text(1, "hi")).unwrap();
        assert_eq!(*log.lock(), vec!["new"]);
    }

    #[test]
    fn test_command_naming_and_replacement() {
        let d = dispatcher();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = d.command("/Start", tracker(&log, "first"));
        let second = d.command("start", tracker(&log, "second"));

        assert_eq!(first.handle.name, "command_start");
        assert_eq!(first, second);
        assert_eq!(d.len(), 1);

        d.dispatch(text(1, "/START now")).unwrap();
        assert!(d.dispatch(text(1, "start")).unwrap().is_empty());
        assert_eq!(*log.lock(), vec!["second"]);
    }

    #[test]
    fn test_handler_error_returned_unchanged() {
        let d = dispatcher();
        let log = Arc::new(Mutex::new(Vec::new()));
        d.register(0, "fails", None, |_ctx: &mut Context| {
            Err(BotError::Handler("boom".to_string()))
        });
        d.register(1, "after", None, tracker(&log, "after"));

        let err = d.dispatch(text(1, "x")).unwrap_err();
        assert_eq!(err, BotError::Handler("boom".to_string()));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_middleware_wraps_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mw_log = Arc::clone(&log);
        let d = dispatcher().with_middleware(move |ctx: &mut Context| -> HandlerResult {
            mw_log.lock().push("mw".to_string());
            if ctx.text() == Some("blocked") {
                return Err(BotError::Middleware("blocked".to_string()));
            }
            Ok(())
        });
        d.message("h", None, tracker(&log, "h"));

        d.dispatch(text(1, "ok")).unwrap();
        assert!(d.dispatch(text(1, "blocked")).is_err());
        assert_eq!(*log.lock(), vec!["mw", "h", "mw"]);
    }

    #[test]
    fn test_category_filters_ignore_other_payloads() {
        let d = dispatcher();
        let log = Arc::new(Mutex::new(Vec::new()));
        d.callback_query("cb", Some(filters::callback_query::prefix("pick:")), tracker(&log, "cb"));

        assert!(d.dispatch(text(1, "pick:a")).unwrap().is_empty());

        let mut poll = Update::new(2);
        poll.poll = Some(Poll {
            id: "p".to_string(),
            question: "q".to_string(),
            options: vec![],
            total_voter_count: 0,
            is_closed: false,
            is_anonymous: true,
        });
        assert!(d.dispatch(poll).unwrap().is_empty());

        let query = CallbackQuery::new("q1", User::new(3), "pick:a");
        assert_eq!(d.dispatch(Update::from_callback_query(3, query)).unwrap().len(), 1);
        assert_eq!(*log.lock(), vec!["cb"]);
    }

    #[test]
    fn test_identity_policies() {
        let in_group = Message::from_text(1, Chat::group(-100, "g"), "x").with_sender(User::new(7));
        let update = Update::from_message(1, in_group);
        assert_eq!(IdentityPolicy::UserOrChat.resolve(&update), Some(7));
        assert_eq!(IdentityPolicy::User.resolve(&update), Some(7));
        assert_eq!(IdentityPolicy::Chat.resolve(&update), Some(-100));

        let anonymous = Update::from_message(2, Message::from_text(1, Chat::group(-100, "g"), "x"));
        assert_eq!(IdentityPolicy::UserOrChat.resolve(&anonymous), Some(-100));
        assert_eq!(IdentityPolicy::User.resolve(&anonymous), None);
        assert_eq!(IdentityPolicy::UserOrChat.resolve(&Update::new(3)), None);
    }

    #[test]
    fn test_registration_during_dispatch() {
        let d = Arc::new(dispatcher());
        let inner = Arc::clone(&d);
        d.message("installer", None, move |_ctx: &mut Context| {
            inner.message("installed", None, |_ctx: &mut Context| Ok(()));
            Ok(())
        });
        d.dispatch(text(1, "x")).unwrap();
        assert_eq!(d.handler_names(DEFAULT_GROUP), vec!["installer", "installed"]);
    }
}
