//! Command Handler Module
//!
//! This module implements the command processing layer for FlashBank.
//! It receives decoded commands, executes them against the account store,
//! and returns the matching replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Parser         │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ AccountStore    │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `SIGNIN`, `CREATE`
//! - `DEPOSIT`, `WITHDRAW`, `BALANCE`

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;
