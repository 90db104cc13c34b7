//! Storage Module
//!
//! This module provides the account ledger for FlashBank: the shared,
//! lock-protected record store and the flat-file adapter that loads it at
//! startup and snapshots it at shutdown.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AccountStore                           │
//! │   Mutex<Vec<Account>>  (one lock, FIFO, delay under lock)   │
//! └─────────────────────────────────────────────────────────────┘
//!               ▲ with_accounts()            │ snapshot()
//!               │                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                persistence::{load, save}                    │
//! │        name,credential,balance,reserved  (per line)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use flashbank::storage::{AccountStore, StoreError};
//! use rust_decimal::Decimal;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let store = AccountStore::new(Duration::ZERO);
//! let index = store.create_account("alice", "secret1").await;
//!
//! store.deposit(index, Decimal::from(100)).await.unwrap();
//! assert_eq!(
//!     store.withdraw(index, Decimal::from(150)).await,
//!     Err(StoreError::InsufficientFunds)
//! );
//! # });
//! ```

pub mod account;
pub mod engine;
pub mod persistence;

// Re-export commonly used types
pub use account::{format_money, round_money, Account, AccountSummary, MAX_FIELD_LEN};
pub use engine::{AccountStore, StoreError, StoreStats, DEFAULT_PROCESSING_DELAY};
pub use persistence::{load, recovery_path_for, save, PersistenceError};
