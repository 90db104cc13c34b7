//! FlashBank - A Small Concurrent Account Server
//!
//! This is the main entry point for the FlashBank server.
//! It parses arguments, binds the TCP listener and runs the server until
//! Ctrl+C (or SIGTERM), at which point the ledger is saved.

use clap::Parser;
use flashbank::config::ServerConfig;
use flashbank::server;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// FlashBank account server
#[derive(Parser, Debug)]
#[command(name = "flashbank")]
#[command(about = "A small concurrent account server")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = flashbank::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = flashbank::DEFAULT_PORT)]
    port: u16,

    /// Ledger file, loaded at startup and written at shutdown
    #[arg(short, long, default_value = flashbank::DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Artificial delay per store operation, in milliseconds
    #[arg(long, default_value_t = 5000)]
    delay_ms: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig::builder()
            .host(args.host)
            .port(args.port)
            .data_file(args.data_file)
            .processing_delay(Duration::from_millis(args.delay_ms))
            .build()
    }
}

fn print_banner(config: &ServerConfig) {
    println!(
        r#"
FlashBank v{} - Concurrent Account Server
──────────────────────────────────────────────────────────────
Server started on {}
Ledger file: {}
Ready to accept connections.

Use Ctrl+C to shutdown and save the ledger.
"#,
        flashbank::VERSION,
        config.bind_address(),
        config.data_file.display()
    );
}

/// Completes on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from(Args::parse());

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    print_banner(&config);

    server::run(listener, &config, shutdown_signal()).await;

    Ok(())
}
