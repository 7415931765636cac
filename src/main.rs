//! Chat Relay - replays chat events from stdin through the relay core.
//!
//! Reads newline-delimited JSON events and prints every delivery as a JSON
//! line on stdout. Logs go to stderr.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

use chat_relay::config::{
    apply_env_overrides, get_config_path, load_and_validate, validate_config, Config,
};
use chat_relay::replay::{JsonLinesSink, ReplaySession};
use chat_relay::sink::{ChatLogger, DeliverySink, FileChatLogger, TracingChatLogger};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Chat Relay v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).unwrap_or_else(get_config_path);
    let config = load(&config_path)?;

    info!("Configuration loaded");
    info!("  Default channel: {}", config.default_channel);
    info!(
        "  Chat log: {}",
        config.chat_log.file.as_deref().unwrap_or("tracing")
    );

    let chat_log: Arc<dyn ChatLogger> = match &config.chat_log.file {
        Some(path) => Arc::new(FileChatLogger::new(path)),
        None => Arc::new(TracingChatLogger),
    };
    let delivery: Arc<dyn DeliverySink> = Arc::new(JsonLinesSink::new(std::io::stdout()));
    let session = ReplaySession::from_config(&config, delivery, chat_log);
    info!("Active modules: {:?}", session.dispatcher().modules().active_modules());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut handled = 0usize;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown signal received - stopping replay");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    handled += 1;
                    if let Err(e) = session.handle_line(&line) {
                        warn!(line = handled, "Event failed: {}", e);
                    }
                }
                Ok(None) => {
                    info!("End of input");
                    break;
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            },
        }
    }

    info!("Replayed {} lines. Exiting...", handled);
    Ok(())
}

/// Load and validate the config file, or fall back to defaults when it does not exist.
fn load(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        warn!("{} not found, using default configuration", path);
        let config = apply_env_overrides(Config::default());
        validate_config(&config)?;
        return Ok(config);
    }

    info!("Loading configuration from {}...", path);
    let config = load_and_validate(path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", path);
        e
    })?;
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
