//! Command Parser
//!
//! Decodes one received chunk of bytes into a [`Command`].
//!
//! The wire protocol has no framing: each read from the socket is treated as
//! exactly one command. The parser therefore works on a whole buffer and
//! never asks for more data.
//!
//! ## Rules
//!
//! 1. Tokens are separated by any ASCII whitespace (so a trailing `\r\n` is
//!    harmless).
//! 2. The keyword is case-sensitive. An unknown or missing keyword is
//!    [`ParseError::UnknownCommand`].
//! 3. A known keyword with bad arguments is [`ParseError::Malformed`]; the
//!    connection stays usable either way.
//! 4. A numeric index too large for `i64` is [`ParseError::InvalidIndex`],
//!    and an amount that is not a number is [`ParseError::InvalidAmount`].
//!    Both reply with the same reason the store would give.

use crate::protocol::types::Command;
use crate::storage::MAX_FIELD_LEN;
use rust_decimal::Decimal;
use std::num::IntErrorKind;
use std::str::FromStr;
use thiserror::Error;

/// Largest chunk read from a client as a single command.
pub const MAX_COMMAND_SIZE: usize = 1024;

/// Errors that can occur while decoding a command.
///
/// The `Display` text is the reason sent back in the `ERROR` reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command")]
    UnknownCommand,

    #[error("Malformed command: {0}")]
    Malformed(String),

    #[error("Invalid account index")]
    InvalidIndex,

    #[error("Invalid amount")]
    InvalidAmount,
}

impl ParseError {
    fn malformed(detail: impl Into<String>) -> Self {
        ParseError::Malformed(detail.into())
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a received chunk as one command.
pub fn parse_command(buf: &[u8]) -> ParseResult<Command> {
    let text = std::str::from_utf8(buf).map_err(|_| ParseError::malformed("invalid UTF-8"))?;
    let mut tokens = text.split_ascii_whitespace();

    let keyword = tokens.next().ok_or(ParseError::UnknownCommand)?;
    let args: Vec<&str> = tokens.collect();

    match keyword {
        "SIGNIN" => {
            let (name, credential) = credentials(keyword, &args)?;
            Ok(Command::SignIn { name, credential })
        }
        "CREATE" => {
            let (name, credential) = credentials(keyword, &args)?;
            Ok(Command::Create { name, credential })
        }
        "DEPOSIT" => {
            let (index, amount) = index_and_amount(keyword, &args)?;
            Ok(Command::Deposit { index, amount })
        }
        "WITHDRAW" => {
            let (index, amount) = index_and_amount(keyword, &args)?;
            Ok(Command::Withdraw { index, amount })
        }
        "BALANCE" => {
            expect_args(keyword, &args, 1)?;
            Ok(Command::Balance {
                index: parse_index(args[0])?,
            })
        }
        _ => Err(ParseError::UnknownCommand),
    }
}

fn expect_args(keyword: &str, args: &[&str], count: usize) -> ParseResult<()> {
    if args.len() != count {
        return Err(ParseError::malformed(format!(
            "{} expects {} arguments, got {}",
            keyword,
            count,
            args.len()
        )));
    }
    Ok(())
}

fn credentials(keyword: &str, args: &[&str]) -> ParseResult<(String, String)> {
    expect_args(keyword, args, 2)?;
    Ok((field("name", args[0])?, field("password", args[1])?))
}

fn index_and_amount(keyword: &str, args: &[&str]) -> ParseResult<(i64, Decimal)> {
    expect_args(keyword, args, 2)?;
    Ok((parse_index(args[0])?, parse_amount(args[1])?))
}

/// Validates a name or credential token.
fn field(what: &str, token: &str) -> ParseResult<String> {
    if token.len() > MAX_FIELD_LEN {
        return Err(ParseError::malformed(format!(
            "{} longer than {} bytes",
            what, MAX_FIELD_LEN
        )));
    }
    // Commas would corrupt the ledger file
    if token.contains(',') {
        return Err(ParseError::malformed(format!("{} contains ','", what)));
    }
    Ok(token.to_string())
}

fn parse_index(token: &str) -> ParseResult<i64> {
    token.parse::<i64>().map_err(|e| match e.kind() {
        // Numeric, but no account can live there
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ParseError::InvalidIndex,
        _ => ParseError::malformed(format!("invalid account index '{}'", token)),
    })
}

fn parse_amount(token: &str) -> ParseResult<Decimal> {
    Decimal::from_str(token).map_err(|_| ParseError::InvalidAmount)
}
