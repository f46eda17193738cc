//! Middleware system for update processing pipeline

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::application::errors::BotError;
use super::context::Context;

/// Result of a handler or middleware
pub type HandlerResult = Result<(), BotError>;

/// Handler function type
pub type Handler = Arc<dyn Fn(&mut Context) -> HandlerResult + Send + Sync>;

/// Middleware trait - runs before the handler and may stop the chain by
/// returning an error
pub trait Middleware: Send + Sync {
    fn process(&self, ctx: &mut Context) -> HandlerResult;
}

impl<F> Middleware for F
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync,
{
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        self(ctx)
    }
}

/// Middleware chain builder
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Wrap `leaf` so every middleware runs first, in the order added.
    /// The first error ends the chain and is returned as is.
    pub fn compose(&self, leaf: Handler) -> Handler {
        self.middlewares.iter().rev().fold(leaf, |next: Handler, mw| -> Handler {
            let mw = Arc::clone(mw);
            Arc::new(move |ctx: &mut Context| {
                mw.process(ctx)?;
                next(ctx)
            })
        })
    }
}

// Identity count above which idle rate limit windows are dropped
const SWEEP_THRESHOLD: usize = 1024;

/// Rate limit middleware, keyed by conversation identity
pub struct RateLimitMiddleware {
    requests: Mutex<HashMap<i64, Vec<Instant>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimitMiddleware {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    fn check_rate_limit(&self, key: i64) -> HandlerResult {
        let mut requests = self.requests.lock();
        let now = Instant::now();

        if requests.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            requests.retain(|_, times| times.last().map_or(false, |t| now.duration_since(*t) < window));
        }

        let times = requests.entry(key).or_default();

        // Remove old requests outside the window
        times.retain(|&t| now.duration_since(t) < self.window);

        if times.len() >= self.max_requests as usize {
            let retry_after = times
                .first()
                .map(|t| self.window.saturating_sub(now.duration_since(*t)))
                .unwrap_or(self.window);

            return Err(BotError::RateLimited { retry_after });
        }

        times.push(now);
        Ok(())
    }
}

impl Middleware for RateLimitMiddleware {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        match ctx.identity() {
            Some(key) => self.check_rate_limit(key),
            // Anonymous updates (polls, ...) are not limited
            None => Ok(()),
        }
    }
}

/// Rejects updates from users outside the allow list
pub struct AllowListMiddleware {
    users: HashSet<i64>,
}

impl AllowListMiddleware {
    pub fn new(users: impl IntoIterator<Item = i64>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }
}

impl Middleware for AllowListMiddleware {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        match ctx.effective_user() {
            Some(user) if self.users.contains(&user.id) => Ok(()),
            Some(user) => {
                tracing::warn!(user_id = user.id, "Unauthorized access attempt");
                Err(BotError::PermissionDenied(format!("user {} is not allowed", user.id)))
            }
            None => Ok(()),
        }
    }
}

/// Logging middleware for debugging
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn process(&self, ctx: &mut Context) -> HandlerResult {
        let message = ctx.effective_message();
        let preview = match (ctx.text(), message) {
            (Some(text), _) => text.chars().take(50).collect::<String>(),
            (None, Some(m)) => format!("[{}]", m.message_type().as_str()),
            (None, None) => format!("[{}]", ctx.update.kind().as_str()),
        };

        tracing::debug!(
            update_id = ctx.update.update_id,
            identity = ?ctx.identity(),
            sent_at = ?message.and_then(|m| m.timestamp()),
            "{}",
            preview
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::messaging::parser::CommandParser;
    use crate::domain::entities::{Chat, Message, Update, User};
    use crate::infrastructure::adapters::memory::MemoryAdapter;

    fn context(user_id: i64) -> Context {
        let msg = Message::from_text(1, Chat::private(user_id), "hi").with_sender(User::new(user_id));
        Context::new(
            Arc::new(Update::from_message(1, msg)),
            Arc::new(MemoryAdapter::new()),
            Some(user_id),
            Arc::new(CommandParser::default()),
        )
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> impl Middleware {
        let log = Arc::clone(log);
        move |_ctx: &mut Context| -> HandlerResult {
            log.lock().push(name.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_runs_in_registration_order_then_leaf() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new()
            .add(recorder(&log, "first"))
            .add(recorder(&log, "second"))
            .add(recorder(&log, "third"));

        let leaf_log = Arc::clone(&log);
        let leaf: Handler = Arc::new(move |_ctx: &mut Context| {
            leaf_log.lock().push("leaf".to_string());
            Ok(())
        });

        let composed = chain.compose(leaf);
        composed(&mut context(1)).unwrap();

        assert_eq!(*log.lock(), vec!["first", "second", "third", "leaf"]);
    }

    #[test]
    fn test_error_short_circuits_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new()
            .add(recorder(&log, "first"))
            .add(|_ctx: &mut Context| -> HandlerResult {
                Err(BotError::Middleware("stop here".to_string()))
            })
            .add(recorder(&log, "third"));

        let leaf_log = Arc::clone(&log);
        let composed = chain.compose(Arc::new(move |_ctx: &mut Context| {
            leaf_log.lock().push("leaf".to_string());
            Ok(())
        }));

        let err = composed(&mut context(1)).unwrap_err();
        assert_eq!(err, BotError::Middleware("stop here".to_string()));
        assert_eq!(*log.lock(), vec!["first"]);
    }

    #[test]
    fn test_empty_chain_is_leaf() {
        let composed = MiddlewareChain::new().compose(Arc::new(|ctx: &mut Context| {
            ctx.set("seen", "yes");
            Ok(())
        }));
        let mut ctx = context(1);
        composed(&mut ctx).unwrap();
        assert_eq!(ctx.get("seen").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_rate_limit_rejects_over_budget() {
        let limiter = RateLimitMiddleware::new(2, 60);
        let mut ctx = context(5);
        assert!(limiter.process(&mut ctx).is_ok());
        assert!(limiter.process(&mut ctx).is_ok());
        assert!(matches!(
            limiter.process(&mut ctx),
            Err(BotError::RateLimited { .. })
        ));
        // Other identities have their own window
        assert!(limiter.process(&mut context(6)).is_ok());
    }

    #[test]
    fn test_rate_limit_drops_idle_windows() {
        let limiter = RateLimitMiddleware::new(1, 0);
        for id in 0..SWEEP_THRESHOLD as i64 {
            assert!(limiter.check_rate_limit(id).is_ok());
        }
        assert_eq!(limiter.requests.lock().len(), SWEEP_THRESHOLD);

        // A zero window makes every entry idle
        assert!(limiter.check_rate_limit(-1).is_ok());
        assert_eq!(limiter.requests.lock().len(), 1);
    }

    #[test]
    fn test_logging_passes_media_messages() {
        let photo = Message::new(1, Chat::private(3))
            .with_sender(User::new(3))
            .with_photo(crate::domain::entities::PhotoSize {
                file_id: "f".to_string(),
                width: 1,
                height: 1,
            });
        assert_eq!(photo.message_type().as_str(), "photo");
        let mut ctx = Context::new(
            Arc::new(Update::from_message(1, photo)),
            Arc::new(MemoryAdapter::new()),
            Some(3),
            Arc::new(CommandParser::default()),
        );
        assert!(LoggingMiddleware.process(&mut ctx).is_ok());
    }

    #[test]
    fn test_allow_list() {
        let allow = AllowListMiddleware::new([100]);
        assert!(allow.process(&mut context(100)).is_ok());
        assert!(matches!(
            allow.process(&mut context(999)),
            Err(BotError::PermissionDenied(_))
        ));
    }
}
