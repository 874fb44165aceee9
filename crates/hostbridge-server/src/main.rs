//! hostbridge, an HTTP host for bridge applications.
//!
//! # Usage
//!
//! ```text
//! hostbridge serve --config hostbridge.toml --bind 0.0.0.0:8080
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hostbridge_host::{AppBuilder, BridgeHost};
use hostbridge_server::{BridgeServer, DemoBootstrapper, ServerConfig};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hostbridge", about = "HTTP host for bridge applications")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the demo application.
    Serve {
        /// Path to a hostbridge.toml configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to listen on; overrides the config file.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, bind } => {
            let mut config = match config {
                Some(path) => ServerConfig::from_file(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            init_tracing(&config.logging.filter)?;
            serve(config).await
        }
    }
}

fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    info!(bind = %config.server.bind, "hostbridge starting");

    let host = BridgeHost::new(DemoBootstrapper::default())?.with_config(config.host_config());
    let app = AppBuilder::new().run(host).build()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => {
                error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        }
        let _ = shutdown_tx.send(true);
    });

    BridgeServer::new(config.server.bind, app)
        .with_options(config.body_options())
        .serve(shutdown_rx)
        .await?;

    info!("hostbridge stopped");
    Ok(())
}
