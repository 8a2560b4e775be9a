use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use toolrelay_core::logging::{init_tracing, Logger, TracingLogger};
use toolrelay_core::{Relay, RelayConfig};

mod chat;
mod routes;
mod server;

#[derive(Parser)]
#[command(author, version, about = "Let a chat model call tools from several MCP servers", long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/toolrelay/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Answer with a local echo model instead of calling the configured one
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat in the terminal
    Chat,
    /// Serve the chat over HTTP
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,
        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },
}

fn load_config(cli: &Cli) -> Result<RelayConfig> {
    let path = cli.config.clone().unwrap_or_else(RelayConfig::default_path);
    let mut config = RelayConfig::read(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    if cli.mock {
        config.model.provider = "mock".to_string();
        if config.model.model.trim().is_empty() {
            config.model.model = "echo".to_string();
        }
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = load_config(&cli)?;
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new());

    let relay = Relay::from_config(&config, logger)
        .await
        .context("starting toolrelay")?;
    for failure in relay.connection_failures() {
        warn!("{}", failure);
    }
    info!("connected tool servers: {}", relay.registry().provider_ids().join(", "));

    let result = match cli.command {
        Command::Chat => chat::run(&relay).await,
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            server::run(&relay, &host, port, config.session_limits()).await
        }
    };

    relay.shutdown().await;
    result
}
