//! # FlashBank - A Small Concurrent Account Server
//!
//! FlashBank is a transactional account server written in Rust. Clients
//! connect over TCP, register or sign in, and deposit to or withdraw from
//! accounts held in a shared in-memory ledger. The ledger is loaded from a
//! flat file at startup and written back when the server shuts down.
//!
//! ## Features
//!
//! - **Line Protocol**: Plain-text commands (`SIGNIN`, `CREATE`, `DEPOSIT`,
//!   `WITHDRAW`, `BALANCE`), one reply line per command
//! - **Serialized Store**: One fair lock over the whole ledger, with a
//!   configurable processing delay held under it
//! - **Fixed-Point Money**: Balances are `Decimal` values kept to the cent
//! - **Async I/O**: Built on Tokio, one task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              FlashBank                                  │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Acceptor)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │   Line      │    │              AccountStore                    │   │
//! │  │   Parser    │    │      Mutex<Vec<Account>> + delay             │   │
//! │  └─────────────┘    └──────────────────────────────────────────────┘   │
//! │                                               ▲ │                       │
//! │                                          load │ │ save (on shutdown)    │
//! │                     ┌─────────────────────────┴─▼─────────────────────┐ │
//! │                     │           data.csv                              │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flashbank::config::ServerConfig;
//! use flashbank::server;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(config.bind_address()).await.unwrap();
//!
//!     // Loads data.csv, serves until Ctrl+C, then saves data.csv
//!     server::run(listener, &config, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: Command and reply types, command parser
//! - [`storage`]: Account store and flat-file persistence
//! - [`commands`]: Executes commands against the store
//! - [`connection`]: Per-client read/execute/reply loop
//! - [`server`]: Accept loop and server lifecycle
//! - [`client`]: Async client used by the ATM binary
//! - [`config`]: Server configuration

pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use client::{BankClient, ClientError};
pub use commands::CommandHandler;
pub use config::ServerConfig;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{parse_command, Command, ParseError, Response};
pub use storage::{Account, AccountStore, StoreError};

/// The default port FlashBank listens on
pub const DEFAULT_PORT: u16 = 8080;

/// The default host FlashBank binds to (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// The default ledger file
pub const DEFAULT_DATA_FILE: &str = "data.csv";

/// Version of FlashBank
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
