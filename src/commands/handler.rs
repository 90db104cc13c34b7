//! Command Handler Module
//!
//! This module executes decoded commands against the account store and turns
//! the outcome into a protocol reply.
//!
//! ## Supported Commands
//!
//! - `SIGNIN name credential` - Look up an account, reply with index and balance
//! - `CREATE name credential` - Append a new account with a zero balance
//! - `DEPOSIT index amount` - Add funds, reply with the new balance
//! - `WITHDRAW index amount` - Remove funds, reply with the new balance
//! - `BALANCE index` - Reply with the current balance
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │  Command    │───>│  execute()  │───>│  Response   │     │
//! │  └─────────────┘    └──────┬──────┘    └─────────────┘     │
//! │                            │                                │
//! │                            ▼                                │
//! │                      AccountStore                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The handler holds no per-client state. The "current account" lives on the
//! client, which sends its index with every `DEPOSIT`/`WITHDRAW`.

use crate::protocol::{Command, Response};
use crate::storage::{AccountStore, StoreError};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Executes commands against the shared account store.
#[derive(Clone)]
pub struct CommandHandler {
    /// The account store
    store: Arc<AccountStore>,
}

impl CommandHandler {
    /// Creates a new command handler with the given store.
    pub fn new(store: Arc<AccountStore>) -> Self {
        Self { store }
    }

    /// Executes a command and returns the reply.
    ///
    /// Every failure becomes an `ERROR` reply; nothing here ends the session.
    pub async fn execute(&self, command: Command) -> Response {
        match command {
            Command::SignIn { name, credential } => self.cmd_signin(&name, &credential).await,
            Command::Create { name, credential } => self.cmd_create(&name, &credential).await,
            Command::Deposit { index, amount } => self.cmd_deposit(index, amount).await,
            Command::Withdraw { index, amount } => self.cmd_withdraw(index, amount).await,
            Command::Balance { index } => self.cmd_balance(index).await,
        }
    }

    async fn cmd_signin(&self, name: &str, credential: &str) -> Response {
        match self.store.authenticate(name, credential).await {
            Ok(summary) => Response::signed_in(summary),
            Err(e) => Response::error(e),
        }
    }

    async fn cmd_create(&self, name: &str, credential: &str) -> Response {
        self.store.create_account(name, credential).await;
        Response::success()
    }

    async fn cmd_deposit(&self, index: i64, amount: Decimal) -> Response {
        let result = match to_index(index) {
            Ok(index) => self.store.deposit(index, amount).await,
            Err(e) => Err(e),
        };
        balance_reply(result)
    }

    async fn cmd_withdraw(&self, index: i64, amount: Decimal) -> Response {
        let result = match to_index(index) {
            Ok(index) => self.store.withdraw(index, amount).await,
            Err(e) => Err(e),
        };
        balance_reply(result)
    }

    async fn cmd_balance(&self, index: i64) -> Response {
        let result = match to_index(index) {
            Ok(index) => self.store.get_balance(index).await,
            Err(e) => Err(e),
        };
        balance_reply(result)
    }
}

/// Negative indices can never name an account.
fn to_index(index: i64) -> Result<usize, StoreError> {
    usize::try_from(index).map_err(|_| StoreError::InvalidIndex)
}

fn balance_reply(result: Result<Decimal, StoreError>) -> Response {
    match result {
        Ok(balance) => Response::balance(balance),
        Err(e) => Response::error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_command;
    use std::time::Duration;

    fn create_handler() -> CommandHandler {
        CommandHandler::new(Arc::new(AccountStore::new(Duration::ZERO)))
    }

    async fn run(handler: &CommandHandler, line: &str) -> String {
        let command = parse_command(line.as_bytes()).unwrap();
        handler.execute(command).await.to_string()
    }

    #[tokio::test]
    async fn test_account_scenario() {
        let handler = create_handler();

        assert_eq!(run(&handler, "CREATE alice secret1").await, "SUCCESS");
        assert_eq!(run(&handler, "SIGNIN alice secret1").await, "SUCCESS 0 0.00");
        assert_eq!(run(&handler, "DEPOSIT 0 100.00").await, "SUCCESS 100.00");
        assert_eq!(
            run(&handler, "WITHDRAW 0 150.00").await,
            "ERROR Insufficient funds"
        );
        assert_eq!(run(&handler, "WITHDRAW 0 40.00").await, "SUCCESS 60.00");
        assert_eq!(run(&handler, "BALANCE 0").await, "SUCCESS 60.00");
    }

    #[tokio::test]
    async fn test_signin_failure() {
        let handler = create_handler();
        assert_eq!(
            run(&handler, "SIGNIN bob wrongpass").await,
            "ERROR Account not found or incorrect password"
        );
    }

    #[tokio::test]
    async fn test_invalid_index() {
        let handler = create_handler();
        run(&handler, "CREATE alice secret1").await;
        run(&handler, "CREATE bob hunter2").await;

        assert_eq!(
            run(&handler, "DEPOSIT 5 10.00").await,
            "ERROR Invalid account index"
        );
        assert_eq!(
            run(&handler, "WITHDRAW -1 10.00").await,
            "ERROR Invalid account index"
        );
        assert_eq!(run(&handler, "BALANCE 2").await, "ERROR Invalid account index");
    }

    #[tokio::test]
    async fn test_invalid_amount() {
        let handler = create_handler();
        run(&handler, "CREATE alice secret1").await;

        assert_eq!(run(&handler, "DEPOSIT 0 0").await, "ERROR Invalid amount");
        assert_eq!(run(&handler, "DEPOSIT 0 -10").await, "ERROR Invalid amount");
        assert_eq!(run(&handler, "WITHDRAW 0 0.00").await, "ERROR Invalid amount");
    }

    #[tokio::test]
    async fn test_second_signin_sees_latest_balance() {
        let handler = create_handler();
        run(&handler, "CREATE alice secret1").await;
        run(&handler, "CREATE bob hunter2").await;
        run(&handler, "DEPOSIT 1 25.5").await;

        assert_eq!(run(&handler, "SIGNIN bob hunter2").await, "SUCCESS 1 25.50");
    }
}
