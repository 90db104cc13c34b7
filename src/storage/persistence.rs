//! Flat-File Persistence
//!
//! The ledger is persisted as a plain text file, one account per line:
//!
//! ```text
//! name,credential,balance,reserved
//! alice,secret1,60.00,4242
//! bob,hunter2,0.00,4242
//! ```
//!
//! The file is read once at startup and written once at shutdown. The index
//! of an account is its position among the non-blank lines; it is not stored.
//! `reserved` is a legacy integer column that is carried through untouched.
//!
//! A line that does not decode, including one that is not valid UTF-8, still
//! occupies its index. It is loaded as an unusable placeholder and written
//! back unchanged, so a restart never shifts indices or drops data.

use crate::storage::account::{format_money, round_money, Account};
use bytes::Bytes;
use rust_decimal::Decimal;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while loading or saving the ledger file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors for a single malformed line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("not valid UTF-8")]
    Encoding,

    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),

    #[error("empty name")]
    EmptyName,

    #[error("invalid balance: {0}")]
    InvalidBalance(String),

    #[error("invalid reserved field: {0}")]
    InvalidReserved(String),
}

/// Encodes one account as a line (without the trailing newline).
pub fn encode_record(account: &Account) -> String {
    format!(
        "{},{},{},{}",
        account.owner_name,
        account.credential,
        format_money(account.balance),
        account.reserved
    )
}

/// Decodes one line into an account with the given index.
pub fn decode_record(line: &str, index: usize) -> Result<Account, RecordError> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
    if fields.len() != 4 {
        return Err(RecordError::FieldCount(fields.len()));
    }

    let name = fields[0];
    if name.is_empty() {
        return Err(RecordError::EmptyName);
    }

    let balance = Decimal::from_str(fields[2].trim())
        .ok()
        .filter(|b| *b >= Decimal::ZERO)
        .ok_or_else(|| RecordError::InvalidBalance(fields[2].to_string()))?;

    let reserved = fields[3]
        .trim()
        .parse::<i64>()
        .map_err(|_| RecordError::InvalidReserved(fields[3].to_string()))?;

    let mut account = Account::new(index, name, fields[1], reserved);
    account.balance = round_money(balance);
    Ok(account)
}

/// Loads all accounts from `path`, in file order.
///
/// A missing file is an empty ledger. Every non-blank line yields one
/// account; lines that fail to decode become [`Account::unreadable`].
pub async fn load(path: impl AsRef<Path>) -> Result<Vec<Account>, PersistenceError> {
    let path = path.as_ref();

    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No ledger file, starting empty");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut accounts = Vec::new();
    let mut unreadable = 0usize;
    for (line_no, line) in contents.split(|&b| b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let index = accounts.len();
        let decoded = std::str::from_utf8(line)
            .map_err(|_| RecordError::Encoding)
            .and_then(|text| decode_record(text, index));

        match decoded {
            Ok(account) => accounts.push(account),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = line_no + 1,
                    index,
                    error = %e,
                    "Keeping unreadable ledger record as-is"
                );
                unreadable += 1;
                accounts.push(Account::unreadable(index, Bytes::copy_from_slice(line)));
            }
        }
    }

    info!(
        path = %path.display(),
        accounts = accounts.len(),
        unreadable,
        "Ledger loaded"
    );
    Ok(accounts)
}

/// Writes all accounts to `path`, replacing its previous contents.
pub async fn save(path: impl AsRef<Path>, accounts: &[Account]) -> Result<(), PersistenceError> {
    let path = path.as_ref();

    let mut contents = Vec::with_capacity(accounts.len() * 32);
    for account in accounts {
        match &account.raw_line {
            Some(raw) => contents.extend_from_slice(raw),
            None => contents.extend_from_slice(encode_record(account).as_bytes()),
        }
        contents.push(b'\n');
    }

    // Write aside, then rename over the old file
    let tmp_path = tmp_path_for(path);
    let write_err = |source: std::io::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp_path, &contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_err)?;

    debug!(path = %path.display(), bytes = contents.len(), "Ledger file replaced");
    info!(path = %path.display(), accounts = accounts.len(), "Ledger saved");
    Ok(())
}

/// Where the ledger is saved when the original file could not be read.
///
/// Saving there leaves the unread file untouched for an operator to inspect.
pub fn recovery_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".recovered");
    path.with_file_name(name)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
