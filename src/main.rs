//! checkr - a tool-using chat agent watched by temporal assertions
//!
//! Usage:
//!   checkr                                  → chat on the console
//!   checkr chat --assert assertion1:mainfn  → chat with an assertion loaded
//!   checkr chat --scripted                  → offline, the model echoes queries
//!   checkr assertions                       → list loadable assertion programs
//!   checkr version                          → show version

use checkr_agent::{AgentConfig, CheckrAgent, ClockMode};
use checkr_llm::{LlmProvider, OpenAiProvider, ScriptedProvider};
use checkr_monitor::{AssertionCatalog, ASSERTION_TARGET};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Parser)]
#[command(
    name = "checkr",
    about = "Tool-using chat agent with lifecycle events and temporal assertions",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    chat: ChatArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent in the terminal (default)
    Chat(ChatArgs),
    /// List the assertion programs that can be loaded
    Assertions,
    /// Show version
    Version,
}

#[derive(Args, Clone, Default)]
struct ChatArgs {
    /// Path to agent config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Agent name
    #[arg(short, long)]
    name: Option<String>,

    /// Extra system instruction
    #[arg(short, long)]
    instruction: Option<String>,

    /// Assertion program to load, as module:entry (repeatable)
    #[arg(short = 'a', long = "assert")]
    assertions: Vec<String>,

    /// OpenAI-compatible endpoint root (e.g. http://localhost:11434/v1)
    #[arg(long)]
    base_url: Option<String>,

    /// Run offline: the model echoes each query back
    #[arg(long, default_value_t = false)]
    scripted: bool,

    /// Timestamp events with a fixed step instead of wall time
    #[arg(long)]
    step_clock: Option<f64>,

    /// Write assertion output to <dir>/assertions.log
    #[arg(long)]
    assertion_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Chat(args)) => chat(args).await?,
        Some(Commands::Assertions) => {
            for spec in AssertionCatalog::builtin().list() {
                println!("{}", spec);
            }
        }
        Some(Commands::Version) => {
            println!("checkr v{}", env!("CARGO_PKG_VERSION"));
        }
        None => chat(cli.chat).await?,
    }

    Ok(())
}

fn init_tracing(assertion_log: Option<&PathBuf>) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match assertion_log {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, "assertions.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
                    meta.target() == ASSERTION_TARGET
                }));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

fn resolve_config(args: &ChatArgs) -> AgentConfig {
    let mut config = args
        .config
        .as_deref()
        .map(AgentConfig::load)
        .unwrap_or_default();

    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(name) = &args.name {
        config.name = name.clone();
    }
    if let Some(instruction) = &args.instruction {
        config.instruction = Some(instruction.clone());
    }
    if let Some(url) = &args.base_url {
        config.provider.base_url = Some(url.clone());
    }
    if let Some(step) = args.step_clock {
        config.clock.mode = ClockMode::Step;
        config.clock.step = step;
    }
    config.assertions.extend(args.assertions.iter().cloned());
    config
}

fn build_provider(args: &ChatArgs, config: &AgentConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    if args.scripted {
        return Ok(Arc::new(ScriptedProvider::echo()));
    }

    let api_key = std::env::var("OPENAI_API_KEY")
        .or_else(|_| std::env::var("CHECKR_API_KEY"))
        .ok();
    let provider = match (api_key, &config.provider.base_url) {
        (Some(key), _) => OpenAiProvider::new(key),
        (None, Some(_)) => OpenAiProvider::anonymous(),
        (None, None) => {
            anyhow::bail!("OPENAI_API_KEY or CHECKR_API_KEY not set (or pass --base-url, or --scripted)")
        }
    };
    let provider = match &config.provider.base_url {
        Some(url) => provider.with_base_url(url),
        None => provider,
    };
    Ok(Arc::new(provider.with_timeout(config.provider.timeout_secs)))
}

async fn chat(args: ChatArgs) -> anyhow::Result<()> {
    let _guard = init_tracing(args.assertion_log.as_ref())?;

    let config = resolve_config(&args);
    let provider = build_provider(&args, &config)?;
    tracing::info!("WELCOME: model={} provider={}", config.model, provider.name());

    let mut agent = CheckrAgent::new(&config, provider)?;
    for tool in checkr_tools::demo_tools() {
        agent.add_tool_arc(tool)?;
    }

    agent.chat_loop().await?;
    Ok(())
}
