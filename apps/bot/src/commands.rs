//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use pilelog_backend::BackendClient;
use pilelog_core::{DialogueSettings, Engine};
use pilelog_shared::{AppConfig, init_config, load_config, load_config_from, resolve_token};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PileLog: record pile driving through a chat dialogue.
#[derive(Parser)]
#[command(
    name = "pilelog",
    version,
    about = "Chat bot that records pile-driving events and files them with the project backend.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.pilelog/pilelog.toml.
    #[arg(long, env = "PILELOG_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override the backend base URL from the config file.
    #[arg(long, env = "PILELOG_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start the Telegram bot (long polling).
    Run,

    /// Run the dialogue in this terminal against the configured backend.
    Console,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pilelog=info,teloxide=warn",
        1 => "pilelog=debug,teloxide=info",
        _ => "pilelog=trace,teloxide=debug",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run => cmd_run(cli.config, cli.backend_url).await,
        Command::Console => cmd_console(cli.config, cli.backend_url).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config, cli.backend_url).await,
        },
    }
}

/// Load the config file (explicit path or default location) and apply CLI overrides.
fn resolve_config(path: Option<PathBuf>, backend_url: Option<String>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(&path)?,
        None => load_config()?,
    };

    if let Some(url) = backend_url {
        config.backend.base_url = url;
    }

    config.validate()?;
    Ok(config)
}

fn build_engine(config: &AppConfig) -> Result<Arc<Engine<BackendClient>>> {
    let backend = BackendClient::new(&config.backend)?;
    Ok(Arc::new(Engine::new(backend, DialogueSettings::from(config))))
}

async fn cmd_run(path: Option<PathBuf>, backend_url: Option<String>) -> Result<()> {
    let config = resolve_config(path, backend_url)?;
    let token = resolve_token(&config)?;
    let engine = build_engine(&config)?;

    info!(
        backend = %config.backend.base_url,
        project_id = config.project.id,
        max_groups = config.dialogue.max_groups,
        "starting Telegram bot"
    );

    crate::telegram::run(engine, token).await;
    Ok(())
}

async fn cmd_console(path: Option<PathBuf>, backend_url: Option<String>) -> Result<()> {
    let config = resolve_config(path, backend_url)?;
    let engine = build_engine(&config)?;

    info!(backend = %config.backend.base_url, "starting console session");

    crate::console::run(engine).await
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<PathBuf>, backend_url: Option<String>) -> Result<()> {
    let config = resolve_config(path, backend_url)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
