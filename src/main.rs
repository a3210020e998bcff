use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use hilda::application::errors::BotError;
use hilda::application::formatting::{Sheet, DEFAULT_SHEET};
use hilda::application::messaging::{CommandParser, Dispatch, Dispatcher};
use hilda::application::services::{AuditService, CommandService};
use hilda::infrastructure::adapters::discord;
use hilda::infrastructure::adapters::memory::MemoryGateway;
use hilda::infrastructure::config::Config;

#[derive(Parser)]
#[command(name = "hilda")]
#[command(about = "A Discord bot for managing server messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config and BOT_TOKEN)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and start handling commands
    Run,
    /// Try the commands offline against an in-memory server
    Console,
    /// Show version
    Version,
    /// Write a default config.yaml and sheet.md
    InitConfig,
}

fn main() {
    // Before logging, so RUST_LOG can come from .env
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = dotenv {
        tracing::debug!("No .env loaded: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => load_config(&cli.config, cli.token).and_then(run_bot),
        Commands::Console => load_config(&cli.config, cli.token).and_then(run_console),
        Commands::Version => {
            println!("hilda v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(config_path: &str, token_override: Option<String>) -> Result<Config, BotError> {
    let mut config = if Path::new(config_path).exists() {
        let mut config = Config::load(config_path)?;
        config.apply_env()?;
        config
    } else {
        tracing::debug!("{} not found, using defaults", config_path);
        Config::load_env()?
    };

    if let Some(token) = token_override {
        config.bot.token = Some(token);
    }
    Ok(config)
}

fn build_dispatcher(config: &Config) -> Result<Dispatcher, BotError> {
    let sheet = Arc::new(Sheet::load_or_default(&config.sheet.path)?);
    let commands = CommandService::new(config.command_settings(), sheet.clone());
    let audit = AuditService::new(sheet, &config.audit.channel);
    Ok(Dispatcher::new(CommandParser::new(&config.bot.prefix), commands, audit))
}

fn run_bot(config: Config) -> Result<(), BotError> {
    let token = config.token()?.to_string();
    let dispatcher = Arc::new(build_dispatcher(&config)?);

    tracing::info!(
        "Starting {} (prefix {:?}, running locally: {})",
        config.bot.name,
        config.bot.prefix,
        config.bot.running_locally
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(discord::start_bot(&token, dispatcher))
}

fn run_console(config: Config) -> Result<(), BotError> {
    let dispatcher = build_dispatcher(&config)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(console_loop(dispatcher))
}

/// Read lines from stdin and post them to #general of a local test server
async fn console_loop(dispatcher: Dispatcher) -> Result<(), BotError> {
    let gateway = MemoryGateway::new().with_echo();
    let guild = gateway.add_guild("Local").await;
    let general = gateway.add_channel(&guild, "general").await;
    gateway.add_channel(&guild, "audit").await;
    gateway.add_channel(&guild, "archive").await;
    let user = gateway.add_member(&guild, "you", None).await;

    tracing::info!("Console mode: type messages or commands, Ctrl-D to quit");
    println!("Channels: #general (you are here), #audit, #archive");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let incoming = gateway.receive(&general, &user, &line).await?;
        if let Dispatch::UnknownCommand(name) = dispatcher.dispatch(&gateway, incoming).await {
            println!("[hilda] unknown command: {}", name);
        }
    }
    Ok(())
}

fn init_config(config_path: &str) -> Result<(), BotError> {
    let config = Config::default();

    if Path::new(config_path).exists() {
        println!("{} already exists, leaving it alone", config_path);
    } else {
        std::fs::write(config_path, config.to_yaml()?)?;
        println!("Config written to {}", config_path);
    }

    if config.sheet.path.exists() {
        println!("{} already exists, leaving it alone", config.sheet.path.display());
    } else {
        std::fs::write(&config.sheet.path, DEFAULT_SHEET)?;
        println!("Sheet written to {}", config.sheet.path.display());
    }
    Ok(())
}
