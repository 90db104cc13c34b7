//! Account Records
//!
//! An [`Account`] is one ledger entry. Accounts are only ever appended to the
//! store; after creation, the balance is the only field that changes.
//!
//! ## Money
//!
//! Balances and amounts are [`Decimal`] values kept at two decimal places.
//! Every amount entering the store goes through [`round_money`], so the
//! ledger never accumulates sub-cent drift.

use bytes::Bytes;
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for balances and amounts.
pub const MONEY_SCALE: u32 = 2;

/// Maximum length in bytes of a name or credential.
pub const MAX_FIELD_LEN: usize = 49;

/// Rounds an amount to whole cents, half away from zero.
#[inline]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount the way it appears on the wire and on disk (`100.00`).
pub fn format_money(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Position in the store, assigned at creation and never reused
    pub index: usize,
    /// Owner name (not unique)
    pub owner_name: String,
    /// Plaintext shared secret
    pub credential: String,
    /// Current balance, never negative
    pub balance: Decimal,
    /// Legacy process-id column, carried through for file compatibility
    pub reserved: i64,
    /// Raw ledger line that could not be decoded. Such an account holds its
    /// index but can never be used, and is saved back byte for byte.
    pub raw_line: Option<Bytes>,
}

impl Account {
    /// Creates an account with a zero balance.
    pub fn new(
        index: usize,
        owner_name: impl Into<String>,
        credential: impl Into<String>,
        reserved: i64,
    ) -> Self {
        Self {
            index,
            owner_name: owner_name.into(),
            credential: credential.into(),
            balance: Decimal::ZERO,
            reserved,
            raw_line: None,
        }
    }

    /// Creates a placeholder for a ledger line that failed to decode.
    pub fn unreadable(index: usize, raw_line: impl Into<Bytes>) -> Self {
        Self {
            raw_line: Some(raw_line.into()),
            ..Self::new(index, "", "", 0)
        }
    }

    /// Returns false for placeholders of unreadable ledger lines.
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.raw_line.is_none()
    }

    /// Returns true if both name and credential match exactly.
    #[inline]
    pub fn matches(&self, name: &str, credential: &str) -> bool {
        self.is_usable() && self.owner_name == name && self.credential == credential
    }
}

/// The part of an account a successful sign-in reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSummary {
    pub index: usize,
    pub balance: Decimal,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            index: account.index,
            balance: account.balance,
        }
    }
}
