//! Conversation engine - named states with one step handler each
//!
//! A [`Flow`] maps state names to step handlers. A command entry jumps into
//! the first state; every later update from the same identity is routed by
//! the flow's catch-all registration to the step of the state it is in.
//!
//! `Jump` and the catch-all both hold the identity lock while the step runs,
//! so updates for one identity are handled one at a time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::application::errors::{BotError, ConfigError};
use crate::application::messaging::dispatcher::{CommandHandle, Dispatcher, HandlerHandle};
use crate::application::messaging::{Context, HandlerResult};
use super::session::{DataMap, SessionCell, SessionStore};

/// Step handler: receives the update context and the identity's state
pub type StepHandler = Arc<dyn Fn(&mut Context, &State) -> HandlerResult + Send + Sync>;

/// Reply sent by the catch-all when nothing else applies
pub const DEFAULT_PROMPT: &str = "Sorry, I didn't get that. Send /start to begin.";

/// Lowest priority group; the catch-all registers here by default
pub const FALLBACK_GROUP: i32 = i32::MAX;

struct FlowCore {
    name: String,
    steps: RwLock<HashMap<String, StepHandler>>,
    fallback: RwLock<Option<StepHandler>>,
    declared: Option<HashSet<String>>,
    sessions: Arc<SessionStore>,
}

impl FlowCore {
    fn state_at(self: &Arc<Self>, identity: i64) -> State {
        State {
            identity,
            cell: self.sessions.cell(identity),
            flow: Arc::clone(self),
        }
    }

    fn state_for(self: &Arc<Self>, ctx: &Context) -> Result<State, BotError> {
        let identity = ctx.identity().ok_or(BotError::NoIdentity)?;
        Ok(self.state_at(identity))
    }

    fn step_for(&self, state: &str) -> Option<StepHandler> {
        self.steps.read().get(state).cloned()
    }

    fn check_declared(&self, state: &str) -> Result<(), BotError> {
        match &self.declared {
            Some(declared) if !declared.contains(state) => Err(BotError::UndeclaredState {
                flow: self.name.clone(),
                state: state.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Conversation state of one identity, as seen from one flow
pub struct State {
    identity: i64,
    cell: Arc<SessionCell>,
    flow: Arc<FlowCore>,
}

impl State {
    pub fn identity(&self) -> i64 {
        self.identity
    }

    /// Current state; `None` when no conversation is active
    pub fn get(&self) -> Option<String> {
        self.cell.state()
    }

    /// Set the state without running its step
    pub fn set(&self, state: impl Into<String>) {
        self.cell.set_state(state);
    }

    /// Drop state and data
    pub fn clear(&self) {
        self.cell.clear();
    }

    /// Data map for the conversation, created on first access
    pub fn data(&self) -> Arc<DataMap> {
        self.cell.data()
    }

    /// Move to `state` and run its step.
    ///
    /// If the flow has no step for `state`, state and data are cleared and
    /// [`BotError::UnknownState`] is returned.
    ///
    /// The identity lock is held while the step runs. A step may jump its own
    /// identity again, but must not jump another identity: two steps doing
    /// that in opposite directions deadlock.
    pub fn jump(&self, ctx: &mut Context, state: &str) -> HandlerResult {
        let _guard = self.cell.lock();
        self.cell.set_state(state);
        // The catch-all of this flow must not run the step a second time
        ctx.mark_handled(&self.flow.name);

        match self.flow.step_for(state) {
            Some(step) => {
                tracing::debug!(flow = %self.flow.name, identity = self.identity, state, "Jump");
                step(ctx, self)
            }
            None => {
                self.cell.clear();
                tracing::warn!(
                    flow = %self.flow.name,
                    identity = self.identity,
                    state,
                    "Jump to state without step, conversation cleared"
                );
                Err(BotError::UnknownState(state.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("flow", &self.flow.name)
            .field("identity", &self.identity)
            .field("state", &self.get())
            .finish()
    }
}

/// A conversation template bound to one dispatcher
#[derive(Clone)]
pub struct Flow {
    core: Arc<FlowCore>,
    dispatcher: Arc<Dispatcher>,
}

impl Flow {
    /// Open flow: any state name may be bound
    pub fn new(name: impl Into<String>, dispatcher: &Arc<Dispatcher>) -> Self {
        Self::build(name.into(), dispatcher, None)
    }

    /// Closed flow: only the listed states may be bound or entered
    pub fn with_states<I, S>(name: impl Into<String>, dispatcher: &Arc<Dispatcher>, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let declared = states.into_iter().map(Into::into).collect();
        Self::build(name.into(), dispatcher, Some(declared))
    }

    fn build(name: String, dispatcher: &Arc<Dispatcher>, declared: Option<HashSet<String>>) -> Self {
        Self {
            core: Arc::new(FlowCore {
                name,
                steps: RwLock::new(HashMap::new()),
                fallback: RwLock::new(None),
                declared,
                sessions: Arc::clone(dispatcher.sessions()),
            }),
            dispatcher: Arc::clone(dispatcher),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Register `command` to start the conversation at `initial`
    pub fn entry(&self, command: &str, initial: impl Into<String>) -> Result<CommandHandle, BotError> {
        let initial = initial.into();
        self.core.check_declared(&initial)?;

        let core = Arc::clone(&self.core);
        let handle = self.dispatcher.command(command, move |ctx: &mut Context| {
            let state = core.state_for(ctx)?;
            state.jump(ctx, &initial)
        });
        Ok(handle)
    }

    /// Bind the step handler of `state`
    pub fn step<F>(&self, state: impl Into<String>, handler: F) -> Result<&Self, BotError>
    where
        F: Fn(&mut Context, &State) -> HandlerResult + Send + Sync + 'static,
    {
        let state = state.into();
        self.core.check_declared(&state)?;
        if self.core.steps.write().insert(state.clone(), Arc::new(handler)).is_some() {
            tracing::debug!(flow = %self.core.name, state = %state, "Replaced step");
        }
        Ok(self)
    }

    /// Handler for updates whose current state has no step
    pub fn fallback<F>(&self, handler: F) -> &Self
    where
        F: Fn(&mut Context, &State) -> HandlerResult + Send + Sync + 'static,
    {
        *self.core.fallback.write() = Some(Arc::new(handler));
        self
    }

    /// Install the catch-all in the lowest priority group
    pub fn register(&self, default_prompt: Option<&str>) -> HandlerHandle {
        self.register_in_group(FALLBACK_GROUP, default_prompt)
    }

    /// Install the catch-all in `group`. It matches every update and runs the
    /// current state's step, else the fallback, else clears the conversation
    /// and replies with the prompt.
    pub fn register_in_group(&self, group: i32, default_prompt: Option<&str>) -> HandlerHandle {
        let core = Arc::clone(&self.core);
        let prompt = default_prompt.unwrap_or(DEFAULT_PROMPT).to_string();

        let handle = self.dispatcher.register(
            group,
            format!("flow_{}", self.core.name),
            None,
            move |ctx: &mut Context| -> HandlerResult {
                let Some(identity) = ctx.identity() else {
                    tracing::trace!(flow = %core.name, "Update without identity skipped");
                    return Ok(());
                };

                if ctx.handled_by(&core.name) {
                    tracing::trace!(flow = %core.name, identity, "Already handled by this flow");
                    return Ok(());
                }

                let state = core.state_at(identity);
                let _guard = state.cell.lock();
                ctx.mark_handled(&core.name);

                if let Some(step) = state.get().and_then(|s| core.step_for(&s)) {
                    return step(ctx, &state);
                }

                let fallback = core.fallback.read().clone();
                if let Some(fallback) = fallback {
                    return fallback(ctx, &state);
                }

                state.clear();
                if ctx.effective_chat().is_some() {
                    ctx.reply(&prompt)?;
                }
                Ok(())
            },
        );

        tracing::info!(flow = %self.core.name, group, "Registered flow");
        handle
    }

    /// State accessor for the identity of `ctx`
    pub fn state(&self, ctx: &Context) -> Result<State, BotError> {
        self.core.state_for(ctx)
    }

    /// State accessor for an explicit identity
    pub fn state_of(&self, identity: i64) -> State {
        self.core.state_at(identity)
    }

    /// Names of states that have a step, sorted
    pub fn states(&self) -> Vec<String> {
        let mut states: Vec<String> = self.core.steps.read().keys().cloned().collect();
        states.sort();
        states
    }

    /// Closed flows: every declared state must have a step
    pub fn validate(&self) -> Result<(), BotError> {
        let Some(declared) = &self.core.declared else {
            return Ok(());
        };
        let steps = self.core.steps.read();
        let mut missing: Vec<&str> = declared
            .iter()
            .filter(|s| !steps.contains_key(s.as_str()))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        Err(ConfigError::MissingField(format!(
            "flow {} has no step for: {}",
            self.core.name,
            missing.join(", ")
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::messaging::dispatcher::DispatcherConfig;
    use crate::domain::entities::{Chat, Message, Update, User};
    use crate::infrastructure::adapters::memory::MemoryAdapter;

    fn setup() -> (Arc<MemoryAdapter>, Arc<Dispatcher>) {
        let bot = Arc::new(MemoryAdapter::new());
        let dispatcher = Arc::new(Dispatcher::new(bot.clone(), DispatcherConfig::default()));
        (bot, dispatcher)
    }

    fn text(user_id: i64, text: &str) -> Update {
        let msg = Message::from_text(1, Chat::private(user_id), text).with_sender(User::new(user_id));
        Update::from_message(1, msg)
    }

    #[test]
    fn test_closed_flow_rejects_undeclared_states() {
        let (_bot, d) = setup();
        let flow = Flow::with_states("order", &d, ["size", "confirm"]);

        assert!(flow.step("size", |_ctx: &mut Context, _s: &State| Ok(())).is_ok());
        assert_eq!(
            flow.step("colour", |_ctx: &mut Context, _s: &State| Ok(())).err(),
            Some(BotError::UndeclaredState {
                flow: "order".to_string(),
                state: "colour".to_string()
            })
        );
        assert!(flow.entry("/order", "nowhere").is_err());
        assert!(flow.validate().is_err());

        flow.step("confirm", |_ctx: &mut Context, _s: &State| Ok(())).unwrap();
        assert!(flow.validate().is_ok());
        assert_eq!(flow.states(), vec!["confirm", "size"]);
    }

    #[test]
    fn test_state_requires_identity() {
        let (_bot, d) = setup();
        let flow = Flow::new("f", &d);
        flow.register(None);

        let ctx = Context::new(
            Arc::new(Update::new(1)),
            d.bot().clone(),
            None,
            d.parser().clone(),
        );
        assert_eq!(flow.state(&ctx).err(), Some(BotError::NoIdentity));

        // The catch-all lets identity-less updates through untouched
        assert_eq!(d.dispatch(Update::new(2)).unwrap().len(), 1);
    }

    #[test]
    fn test_step_can_reenter_its_own_identity() {
        let (bot, d) = setup();
        let flow = Flow::new("nested", &d);
        flow.step("a", |ctx: &mut Context, state: &State| {
            state.data().set("visited_a", true)?;
            state.jump(ctx, "b")
        })
        .unwrap()
        .step("b", |ctx: &mut Context, state: &State| {
            let visited: bool = state.data().get("visited_a").unwrap_or(false);
            ctx.reply(&format!("b after a: {}", visited))?;
            Ok(())
        })
        .unwrap();
        flow.entry("go", "a").unwrap();

        d.dispatch(text(4, "/go")).unwrap();
        assert_eq!(flow.state_of(4).get().as_deref(), Some("b"));
        assert_eq!(bot.texts(), vec!["b after a: true"]);
    }
}
