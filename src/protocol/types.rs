//! Protocol Data Types
//!
//! This module defines the commands clients send and the replies the server
//! returns. Both are single lines of whitespace-separated ASCII tokens.
//!
//! ## Examples
//!
//! ```text
//! CREATE alice secret1     ->  SUCCESS
//! SIGNIN alice secret1     ->  SUCCESS 0 0.00
//! DEPOSIT 0 100.00         ->  SUCCESS 100.00
//! WITHDRAW 0 150.00        ->  ERROR Insufficient funds
//! BALANCE 0                ->  SUCCESS 100.00
//! HELLO                    ->  ERROR Unknown command
//! ```

use crate::storage::{format_money, AccountSummary};
use rust_decimal::Decimal;
use std::fmt;

/// Reply keyword for successful commands
pub const SUCCESS: &str = "SUCCESS";

/// Reply keyword for failed commands
pub const ERROR: &str = "ERROR";

/// A decoded client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `SIGNIN name credential`
    SignIn { name: String, credential: String },

    /// `CREATE name credential`
    Create { name: String, credential: String },

    /// `DEPOSIT index amount`
    Deposit { index: i64, amount: Decimal },

    /// `WITHDRAW index amount`
    Withdraw { index: i64, amount: Decimal },

    /// `BALANCE index`
    Balance { index: i64 },
}

impl Command {
    /// Returns the command keyword.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SignIn { .. } => "SIGNIN",
            Command::Create { .. } => "CREATE",
            Command::Deposit { .. } => "DEPOSIT",
            Command::Withdraw { .. } => "WITHDRAW",
            Command::Balance { .. } => "BALANCE",
        }
    }

    /// Serializes the command for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SignIn { name, credential } | Command::Create { name, credential } => {
                write!(f, "{} {} {}", self.name(), name, credential)
            }
            Command::Deposit { index, amount } | Command::Withdraw { index, amount } => {
                write!(f, "{} {} {}", self.name(), index, format_money(*amount))
            }
            Command::Balance { index } => write!(f, "{} {}", self.name(), index),
        }
    }
}

/// A reply to a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `SUCCESS` followed by zero or more payload tokens
    Success(Vec<String>),

    /// `ERROR` followed by a human-readable reason
    Error(String),
}

impl Response {
    /// A bare `SUCCESS`.
    pub fn success() -> Self {
        Response::Success(Vec::new())
    }

    /// `SUCCESS <index> <balance>`
    pub fn signed_in(summary: AccountSummary) -> Self {
        Response::Success(vec![
            summary.index.to_string(),
            format_money(summary.balance),
        ])
    }

    /// `SUCCESS <balance>`
    pub fn balance(balance: Decimal) -> Self {
        Response::Success(vec![format_money(balance)])
    }

    /// `ERROR <reason>`
    pub fn error(reason: impl fmt::Display) -> Self {
        Response::Error(reason.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// Serializes the reply for sending over the wire, newline-terminated.
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = self.to_string();
        line.push('\n');
        line.into_bytes()
    }

    /// Decodes a reply line received from the server.
    ///
    /// Returns `None` if the line starts with neither keyword.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (keyword, rest) = line.split_once(' ').unwrap_or((line, ""));

        match keyword {
            SUCCESS => Some(Response::Success(
                rest.split_whitespace().map(str::to_string).collect(),
            )),
            ERROR => Some(Response::Error(rest.trim().to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Success(payload) => {
                f.write_str(SUCCESS)?;
                for token in payload {
                    write!(f, " {}", token)?;
                }
                Ok(())
            }
            Response::Error(reason) => write!(f, "{} {}", ERROR, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_serialize_responses() {
        assert_eq!(Response::success().serialize(), b"SUCCESS\n");
        assert_eq!(
            Response::signed_in(AccountSummary {
                index: 0,
                balance: Decimal::ZERO
            })
            .serialize(),
            b"SUCCESS 0 0.00\n"
        );
        assert_eq!(
            Response::balance(Decimal::from_str("60").unwrap()).serialize(),
            b"SUCCESS 60.00\n"
        );
        assert_eq!(
            Response::error("Insufficient funds").serialize(),
            b"ERROR Insufficient funds\n"
        );
    }

    #[test]
    fn test_parse_responses() {
        assert_eq!(Response::parse("SUCCESS\n"), Some(Response::success()));
        assert_eq!(
            Response::parse("SUCCESS 3 12.50"),
            Some(Response::Success(vec!["3".into(), "12.50".into()]))
        );
        assert_eq!(
            Response::parse("ERROR Account not found or incorrect password\n"),
            Some(Response::Error(
                "Account not found or incorrect password".into()
            ))
        );
        assert_eq!(Response::parse("+OK"), None);
    }

    #[test]
    fn test_command_display() {
        let cmd = Command::Deposit {
            index: 0,
            amount: Decimal::from(100),
        };
        assert_eq!(cmd.to_string(), "DEPOSIT 0 100.00");

        let cmd = Command::SignIn {
            name: "alice".into(),
            credential: "secret1".into(),
        };
        assert_eq!(cmd.serialize(), b"SIGNIN alice secret1");
        assert_eq!(cmd.name(), "SIGNIN");
    }
}
