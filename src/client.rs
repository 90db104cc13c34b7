//! Async Client
//!
//! A thin client for the FlashBank protocol. Each call sends one command and
//! waits for one reply, which is what the server's unframed protocol expects:
//! never send a second command before the first reply has arrived.
//!
//! ## Example
//!
//! ```ignore
//! use flashbank::client::BankClient;
//! use rust_decimal::Decimal;
//!
//! let mut client = BankClient::connect("127.0.0.1:8080").await?;
//! client.create_account("alice", "secret1").await?;
//! let account = client.sign_in("alice", "secret1").await?;
//! let balance = client.deposit(account.index, Decimal::from(100)).await?;
//! ```

use crate::protocol::{Command, Response, MAX_COMMAND_SIZE};
use crate::storage::AccountSummary;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::trace;

/// Errors returned by [`BankClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection
    #[error("server closed the connection")]
    Disconnected,

    /// The server answered `ERROR <reason>`
    #[error("{0}")]
    Server(String),

    /// The reply could not be understood
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// A connection to a FlashBank server.
pub struct BankClient {
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl BankClient {
    /// Connects to a server.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            buffer: vec![0u8; MAX_COMMAND_SIZE],
        })
    }

    /// Signs in and returns the account's index and balance.
    pub async fn sign_in(
        &mut self,
        name: &str,
        credential: &str,
    ) -> Result<AccountSummary, ClientError> {
        let reply = self
            .request(&Command::SignIn {
                name: name.to_string(),
                credential: credential.to_string(),
            })
            .await?;

        match reply.as_slice() {
            [index, balance] => Ok(AccountSummary {
                index: index
                    .parse()
                    .map_err(|_| ClientError::UnexpectedReply(reply.join(" ")))?,
                balance: parse_balance(balance)?,
            }),
            _ => Err(ClientError::UnexpectedReply(reply.join(" "))),
        }
    }

    /// Creates an account. The server does not report the new index; sign in
    /// to learn it.
    pub async fn create_account(
        &mut self,
        name: &str,
        credential: &str,
    ) -> Result<(), ClientError> {
        self.request(&Command::Create {
            name: name.to_string(),
            credential: credential.to_string(),
        })
        .await?;
        Ok(())
    }

    /// Deposits into an account and returns the new balance.
    pub async fn deposit(&mut self, index: usize, amount: Decimal) -> Result<Decimal, ClientError> {
        let reply = self
            .request(&Command::Deposit {
                index: index as i64,
                amount,
            })
            .await?;
        single_balance(&reply)
    }

    /// Withdraws from an account and returns the new balance.
    pub async fn withdraw(
        &mut self,
        index: usize,
        amount: Decimal,
    ) -> Result<Decimal, ClientError> {
        let reply = self
            .request(&Command::Withdraw {
                index: index as i64,
                amount,
            })
            .await?;
        single_balance(&reply)
    }

    /// Returns an account's balance.
    pub async fn balance(&mut self, index: usize) -> Result<Decimal, ClientError> {
        let reply = self
            .request(&Command::Balance {
                index: index as i64,
            })
            .await?;
        single_balance(&reply)
    }

    /// Sends one command and returns the payload tokens of a `SUCCESS` reply.
    async fn request(&mut self, command: &Command) -> Result<Vec<String>, ClientError> {
        self.stream.write_all(&command.serialize()).await?;
        trace!(command = command.name(), "Sent command");

        let n = self.stream.read(&mut self.buffer).await?;
        if n == 0 {
            return Err(ClientError::Disconnected);
        }

        let text = String::from_utf8_lossy(&self.buffer[..n]).into_owned();
        match Response::parse(&text) {
            Some(Response::Success(payload)) => Ok(payload),
            Some(Response::Error(reason)) => Err(ClientError::Server(reason)),
            None => Err(ClientError::UnexpectedReply(text.trim().to_string())),
        }
    }
}

fn parse_balance(token: &str) -> Result<Decimal, ClientError> {
    Decimal::from_str(token).map_err(|_| ClientError::UnexpectedReply(token.to_string()))
}

fn single_balance(reply: &[String]) -> Result<Decimal, ClientError> {
    match reply {
        [balance] => parse_balance(balance),
        _ => Err(ClientError::UnexpectedReply(reply.join(" "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandHandler;
    use crate::connection::{handle_connection, ConnectionStats};
    use crate::storage::AccountStore;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn create_test_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(AccountStore::new(Duration::ZERO));
        let stats = Arc::new(ConnectionStats::new());

        tokio::spawn(async move {
            while let Ok((stream, client_addr)) = listener.accept().await {
                let handler = CommandHandler::new(Arc::clone(&store));
                tokio::spawn(handle_connection(
                    stream,
                    client_addr,
                    handler,
                    Arc::clone(&stats),
                ));
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_client_round_trip() {
        let addr = create_test_server().await;
        let mut client = BankClient::connect(addr).await.unwrap();

        client.create_account("alice", "secret1").await.unwrap();
        let account = client.sign_in("alice", "secret1").await.unwrap();
        assert_eq!(account.index, 0);
        assert_eq!(account.balance, Decimal::ZERO);

        let dec = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(client.deposit(0, dec("100.00")).await.unwrap(), dec("100"));
        assert_eq!(client.withdraw(0, dec("40.00")).await.unwrap(), dec("60"));
        assert_eq!(client.balance(0).await.unwrap(), dec("60"));
    }

    #[tokio::test]
    async fn test_client_surfaces_server_errors() {
        let addr = create_test_server().await;
        let mut client = BankClient::connect(addr).await.unwrap();

        match client.sign_in("bob", "wrongpass").await {
            Err(ClientError::Server(reason)) => {
                assert_eq!(reason, "Account not found or incorrect password")
            }
            other => panic!("unexpected result {:?}", other),
        }

        match client.withdraw(3, Decimal::ONE).await {
            Err(ClientError::Server(reason)) => assert_eq!(reason, "Invalid account index"),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
