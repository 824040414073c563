//! CLI for atc-watch
//!
//! Subcommands:
//! - `run`: poll the feed and deliver notifications until Ctrl-C (default)
//! - `check`: fetch the feed once and print the watched positions online

use std::sync::Arc;

use atc_watch::command::CommandHandler;
use atc_watch::config::{Settings, load_config_from};
use atc_watch::feed::{SnapshotSource, VatsimFeed};
use atc_watch::monitor::{MessageFormat, PollLoop, SubscriptionRegistry};
use atc_watch::notify::{DiscordNotifier, Fanout, LogNotifier, Notifier};
use atc_watch::transport::{GatewayHub, start_gateway};
use atc_watch::utils::error::AppError;
use atc_watch::utils::logging;
use clap::{Parser, Subcommand};
use tokio::task::JoinError;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "atc-watch", version, about)]
struct Cli {
    /// Config file, extension optional.
    #[arg(short, long, default_value = "config/default")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Poll the feed and deliver notifications
    Run,
    /// Fetch the feed once and print the watched positions online
    Check,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match load_config_from(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    logging::init(&settings.logging.level);
    settings.validate();

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(settings).await,
        Command::Check => check(settings).await,
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn feed(settings: &Settings) -> Result<VatsimFeed, AppError> {
    Ok(VatsimFeed::new(
        &settings.feed.url,
        &settings.feed.watched,
        settings.feed_timeout(),
    )?)
}

async fn discord(settings: &Settings) -> Result<Option<DiscordNotifier>, AppError> {
    let (Some(token), Some(channel_id)) = (
        settings.discord.token.as_deref(),
        settings.discord.channel_id,
    ) else {
        return Ok(None);
    };

    let notifier = DiscordNotifier::new(token, channel_id, settings.discord.guild_id)?;
    if let Err(e) = notifier.verify().await {
        warn!("Discord channel check failed, deliveries will likely fail: {e}");
    }
    Ok(Some(notifier))
}

async fn run(settings: Settings) -> Result<(), AppError> {
    let registry = SubscriptionRegistry::shared();
    let source = Arc::new(feed(&settings)?);

    let mut sinks: Vec<Arc<dyn Notifier>> = Vec::new();
    match discord(&settings).await? {
        Some(notifier) => sinks.push(Arc::new(notifier)),
        None => sinks.push(Arc::new(LogNotifier)),
    }

    let gateway = if settings.gateway.enabled {
        let hub = Arc::new(GatewayHub::new());
        sinks.push(hub.clone());
        let commands = CommandHandler::new(registry.clone(), &settings.feed.watched);
        Some(tokio::spawn(start_gateway(
            settings.gateway_addr(),
            commands,
            hub,
        )))
    } else {
        None
    };

    let notifier: Arc<dyn Notifier> = if sinks.len() == 1 {
        sinks.remove(0)
    } else {
        Arc::new(Fanout::new(sinks))
    };

    let poll = PollLoop::new(
        source,
        notifier,
        registry,
        MessageFormat::new(settings.discord.role_id),
    )
    .spawn(settings.poll_interval());

    let gateway_exit = async {
        match gateway {
            Some(handle) => handle.await,
            None => std::future::pending::<Result<std::io::Result<()>, JoinError>>().await,
        }
    };

    let result = tokio::select! {
        exit = gateway_exit => match exit {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("Command gateway failed: {e}");
                Err(AppError::Io(e))
            }
            Err(e) => {
                error!("Command gateway task failed: {e}");
                Ok(())
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
            Ok(())
        }
    };

    poll.shutdown().await;
    result
}

async fn check(settings: Settings) -> Result<(), AppError> {
    let feed = feed(&settings)?;
    let active = feed.fetch().await?;

    if active.is_empty() {
        println!("No watched positions online.");
    } else {
        for callsign in &active {
            println!("{callsign}");
        }
    }
    Ok(())
}
