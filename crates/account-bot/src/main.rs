//! Account Manager Bot - Main entry point.

use account_bot::commands::*;
use account_bot::config::Config;
use account_bot::dispatcher::Dispatcher;
use account_bot::error::AppResult;
use account_client::GatewayClient;
use account_store::AccountStore;
use anyhow::Context;
use auth_flow::{AuthOrchestrator, ConversationTracker, PendingAuthRegistry};
use std::sync::Arc;
use telegram_client::{TelegramClient, UpdateReceiver};
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting Account Manager Bot...");

    // Open the record store
    let store = AccountStore::open(&config.store.db_path)
        .await
        .context("Failed to open record store")?;

    // Gateway connector
    let gateway = GatewayClient::new(&config.gateway.base_url, config.gateway.timeout)
        .context("Failed to create gateway client")?;

    if gateway.health_check().await {
        info!("Gateway healthy at {}", config.gateway.base_url);
    } else {
        warn!(
            "Gateway not reachable at {} - will retry on requests",
            config.gateway.base_url
        );
    }

    // Core orchestration
    let registry = PendingAuthRegistry::new(
        Arc::new(gateway),
        store.clone(),
        config.auth.pending_ttl,
    );
    let states = ConversationTracker::new(config.auth.state_ttl);
    let orchestrator = AuthOrchestrator::new(registry, states, store.clone());

    // Telegram transport
    let telegram = TelegramClient::new(&config.telegram.api_url, &config.telegram.bot_token)
        .context("Failed to create Telegram client")?;

    // Command handlers; the default auth-flow handler goes last
    let handlers: Vec<Box<dyn CommandHandler>> = vec![
        Box::new(StartHandler::new(orchestrator.clone())),
        Box::new(HelpHandler::new()),
        Box::new(AddNumberHandler::new(orchestrator.clone())),
        Box::new(MyNumbersHandler::new(store.clone())),
        Box::new(AuthFlowHandler::new(orchestrator.clone(), telegram.clone())),
    ];

    info!("Registered {} command handlers", handlers.len());

    let dispatcher = Dispatcher::new(telegram.clone(), store, handlers);

    // Start the update receiver
    let receiver = UpdateReceiver::new(telegram, config.telegram.poll_timeout);
    let mut stream = Box::pin(receiver.stream());

    info!("Listening for updates...");

    // Main update loop: strictly sequential, one update at a time. The
    // in-memory registry and state tracker rely on this ordering.
    loop {
        tokio::select! {
            Some(update) = stream.next() => {
                if let Err(e) = dispatcher.handle_update(&update).await {
                    // One bad update must not take the loop down.
                    error!("Failed to process update {}: {}", update.update_id, e);
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
