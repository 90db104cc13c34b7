//! Text Protocol Implementation
//!
//! This module implements the line-based protocol spoken between FlashBank
//! and its clients.
//!
//! ## Overview
//!
//! Each message is one line of whitespace-separated tokens. A command is a
//! case-sensitive keyword plus its arguments; a reply starts with `SUCCESS`
//! or `ERROR`. There is no length framing: one socket read is one command.
//!
//! | Command | Arguments | Success reply |
//! |---|---|---|
//! | `SIGNIN` | name credential | `SUCCESS <index> <balance>` |
//! | `CREATE` | name credential | `SUCCESS` |
//! | `DEPOSIT` | index amount | `SUCCESS <balance>` |
//! | `WITHDRAW` | index amount | `SUCCESS <balance>` |
//! | `BALANCE` | index | `SUCCESS <balance>` |
//!
//! Failures are `ERROR <reason>`.
//!
//! ## Modules
//!
//! - `types`: Defines `Command`, `Response` and their wire encoding
//! - `parser`: Decodes a received chunk into a `Command`
//!
//! ## Example
//!
//! ```
//! use flashbank::protocol::{parse_command, Command, Response};
//!
//! let cmd = parse_command(b"BALANCE 0\n").unwrap();
//! assert_eq!(cmd, Command::Balance { index: 0 });
//!
//! let reply = Response::error("Invalid account index");
//! assert_eq!(reply.serialize(), b"ERROR Invalid account index\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_command, ParseError, ParseResult, MAX_COMMAND_SIZE};
pub use types::{Command, Response};
