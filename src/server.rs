//! Connection Acceptor
//!
//! Accepts TCP connections and spawns one task per client. The surrounding
//! [`run`] owns the ledger's lifecycle: load at startup, serve until the
//! shutdown future completes, then snapshot and save exactly once.
//!
//! If the ledger file exists but cannot be read, the server starts empty and
//! saves to a `.recovered` file beside it instead of overwriting it.
//!
//! Binding the listener is left to the caller, so tests can bind port 0.

use crate::commands::CommandHandler;
use crate::config::ServerConfig;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::{self, AccountStore};
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main loop that accepts incoming connections.
///
/// Never returns; accept errors are logged and the loop keeps going.
pub async fn accept_loop(
    listener: TcpListener,
    store: Arc<AccountStore>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                // Create a command handler for this connection
                let handler = CommandHandler::new(Arc::clone(&store));
                let stats = Arc::clone(&stats);

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Accepts connections until `shutdown` completes.
///
/// Handlers already spawned are not drained; they keep running until the
/// runtime stops.
pub async fn serve<F>(
    listener: TcpListener,
    store: Arc<AccountStore>,
    stats: Arc<ConnectionStats>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = accept_loop(listener, store, stats) => {}
        _ = shutdown => {
            info!("Shutdown signal received, stopping server...");
        }
    }
}

/// Loads the ledger, serves clients until `shutdown`, then saves the ledger.
///
/// Persistence failures are logged and never abort the server. Returns the
/// store so callers can inspect the final state.
pub async fn run<F>(
    listener: TcpListener,
    config: &ServerConfig,
    shutdown: F,
) -> Arc<AccountStore>
where
    F: Future<Output = ()>,
{
    let (accounts, save_path) = match storage::load(&config.data_file).await {
        Ok(accounts) => (accounts, config.data_file.clone()),
        Err(e) => {
            let save_path = storage::recovery_path_for(&config.data_file);
            error!(
                error = %e,
                save_path = %save_path.display(),
                "Failed to load ledger, starting empty"
            );
            (Vec::new(), save_path)
        }
    };

    let store = Arc::new(AccountStore::with_accounts(
        accounts,
        config.processing_delay,
    ));
    let accounts = store.len().await;
    info!(
        accounts,
        delay_ms = config.processing_delay.as_millis() as u64,
        "Account store initialized"
    );

    let stats = Arc::new(ConnectionStats::new());
    serve(listener, Arc::clone(&store), Arc::clone(&stats), shutdown).await;

    let snapshot = store.snapshot().await;
    if let Err(e) = storage::save(&save_path, &snapshot).await {
        error!(error = %e, "Failed to save ledger");
    }

    let store_stats = store.stats();
    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        accounts_created = store_stats.accounts_created,
        sign_ins = store_stats.sign_ins,
        failed_sign_ins = store_stats.failed_sign_ins,
        deposits = store_stats.deposits,
        withdrawals = store_stats.withdrawals,
        rejected_ops = store_stats.rejected_ops,
        "Server shutdown complete"
    );

    store
}
