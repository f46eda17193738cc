use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use tgflow::application::conversation::{Flow, State};
use tgflow::application::messaging::{
    AllowListMiddleware, Context, Dispatcher, HandlerResult, LoggingMiddleware,
    RateLimitMiddleware,
};
use tgflow::infrastructure::adapters::ConsoleAdapter;
use tgflow::infrastructure::config::Config;
use tgflow::{BotApi, BotError, UpdateSource};

#[derive(Parser)]
#[command(name = "tgflow")]
#[command(about = "Conversation flows over a chat bot dispatcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo bot on the console
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_bot(&cli.config) {
                tracing::error!("Bot stopped: {}", e);
            }
        }
        Commands::Version => {
            println!("tgflow v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => init_config(),
    }
}

fn load_config(config_path: &str) -> Config {
    if !std::path::Path::new(config_path).exists() {
        return Config::load_env();
    }
    match Config::load(config_path) {
        Ok(mut config) => {
            config.apply_env();
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        }
    }
}

fn run_bot(config_path: &str) -> Result<(), BotError> {
    let config = load_config(config_path);
    tracing::info!("Starting {}", config.bot.name);

    let console = config.adapters.console.clone().unwrap_or(
        tgflow::infrastructure::config::ConsoleConfig {
            enabled: true,
            user_id: 1000,
            chat_id: 1000,
        },
    );
    let mut source = ConsoleAdapter::new(console.user_id, console.chat_id);

    let sender = source.sender();
    let info = sender.bot_info();
    tracing::info!(bot_id = info.id, username = %info.username, "Connected as {}", info.name);

    let mut dispatcher_config = config.dispatcher_config();
    if dispatcher_config.bot_username.is_none() {
        dispatcher_config.bot_username = Some(info.username);
    }
    let dispatcher = Dispatcher::new(Arc::new(sender), dispatcher_config)
        .with_middleware(LoggingMiddleware);
    if config.whitelist.enabled {
        dispatcher.use_middleware(AllowListMiddleware::new(config.whitelist.users.clone()));
    }
    if config.security.rate_limit.enabled {
        let limit = &config.security.rate_limit;
        dispatcher.use_middleware(RateLimitMiddleware::new(limit.max_requests, limit.window_seconds));
    }
    let dispatcher = Arc::new(dispatcher);

    register_survey(&dispatcher, config.conversation.default_prompt.as_deref())?;
    tracing::info!("{} handlers registered", dispatcher.len());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("runtime: {}", e)))?;

    rt.block_on(async move {
        while let Some(update) = source.next_update().await? {
            let dispatcher = Arc::clone(&dispatcher);
            let update_id = update.update_id;
            // One blocking worker per update
            tokio::spawn(async move {
                match tokio::task::spawn_blocking(move || dispatcher.dispatch(update)).await {
                    Ok(Ok(fired)) => tracing::debug!(update_id, handlers = fired.len(), "Update handled"),
                    Ok(Err(e)) => tracing::warn!(update_id, "Update failed: {}", e),
                    Err(e) => tracing::error!(update_id, "Worker panicked: {}", e),
                }
            });
        }
        tracing::info!("Input closed, shutting down");
        Ok::<(), BotError>(())
    })
}

/// Context key marking the state a step was just jumped into
const ENTERED: &str = "entered";

fn entering(ctx: &Context, state: &State) -> bool {
    ctx.command().is_some() || ctx.get(ENTERED).map(String::as_str) == state.get().as_deref()
}

fn advance(ctx: &mut Context, state: &State, next: &str) -> HandlerResult {
    ctx.set(ENTERED, next);
    state.jump(ctx, next)
}

fn register_survey(dispatcher: &Arc<Dispatcher>, prompt: Option<&str>) -> Result<(), BotError> {
    dispatcher.command("help", |ctx: &mut Context| {
        ctx.reply("/start - take the survey\n/cancel - stop it")?;
        Ok(())
    });

    let flow = Flow::with_states("survey", dispatcher, ["color", "animal", "done"]);

    flow.step("color", |ctx: &mut Context, state: &State| {
        if entering(ctx, state) {
            ctx.reply("What's your favourite colour?")?;
            return Ok(());
        }
        let answer = ctx.text().unwrap_or_default().to_string();
        state.data().set("color", answer)?;
        advance(ctx, state, "animal")
    })?
    .step("animal", |ctx: &mut Context, state: &State| {
        if entering(ctx, state) {
            let color: String = state.data().get("color").unwrap_or_default();
            ctx.reply(&format!("{} it is. And your favourite animal?", color))?;
            return Ok(());
        }
        let answer = ctx.text().unwrap_or_default().to_string();
        state.data().set("animal", answer)?;
        advance(ctx, state, "done")
    })?
    .step("done", |ctx: &mut Context, state: &State| {
        let data = state.data();
        let color: String = data.get("color").unwrap_or_default();
        let animal: String = data.get("animal").unwrap_or_default();
        let sent = ctx.reply(&format!("A {} {}. Thanks!", color, animal))?;
        if let Some(chat) = ctx.effective_chat() {
            ctx.delete_after(chat.id, sent, Duration::from_secs(30));
        }
        state.clear();
        Ok(())
    })?;
    flow.validate()?;

    flow.entry("start", "color")?;

    let cancel = flow.clone();
    dispatcher.command("cancel", move |ctx: &mut Context| {
        cancel.state(ctx)?.clear();
        ctx.reply("Cancelled.")?;
        Ok(())
    });

    flow.register(prompt);
    Ok(())
}

fn init_config() {
    match Config::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("{}", e),
    }
}
