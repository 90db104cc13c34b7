//! Thread-Safe Account Store
//!
//! This module implements the record store for FlashBank: an append-only
//! sequence of accounts shared by every client connection.
//!
//! ## Design Decisions
//!
//! 1. **One Lock**: The whole account table sits behind a single
//!    `tokio::sync::Mutex`. Every operation is totally ordered by lock
//!    acquisition, and the mutex is fair, so waiters are admitted FIFO.
//! 2. **Processing Delay**: Each client-facing operation sleeps for
//!    `processing_delay` *while holding the lock*. This models a slow backing
//!    store and makes contention visible under concurrent load.
//! 3. **Stable Indices**: Accounts live in a `Vec` and are never removed, so
//!    an account's index is its position for the lifetime of the process.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────┐  ┌──────────┐  ┌──────────┐
//! │ client 1 │  │ client 2 │  │ client N │
//! └────┬─────┘  └────┬─────┘  └────┬─────┘
//!      └─────────────┼─────────────┘
//!                    ▼ lock() (FIFO)
//! ┌─────────────────────────────────────────┐
//! │ AccountStore                            │
//! │   Mutex<Vec<Account>>                   │
//! │   sleep(processing_delay) under lock    │
//! └─────────────────────────────────────────┘
//! ```

use crate::storage::account::{round_money, Account, AccountSummary};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Default artificial delay per operation (the original branch server slept 5s).
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_secs(5);

/// Errors returned by store operations.
///
/// The `Display` text of each variant is the reason sent to clients.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid account index")]
    InvalidIndex,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Account not found or incorrect password")]
    AuthFailed,
}

/// Store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub accounts_created: u64,
    pub sign_ins: u64,
    pub failed_sign_ins: u64,
    pub deposits: u64,
    pub withdrawals: u64,
    pub rejected_ops: u64,
}

/// The shared account store.
///
/// Wrap it in an `Arc` and hand a clone to every connection task.
///
/// # Example
///
/// ```
/// use flashbank::storage::AccountStore;
/// use rust_decimal::Decimal;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let store = AccountStore::new(Duration::ZERO);
///
/// let index = store.create_account("alice", "secret1").await;
/// assert_eq!(index, 0);
///
/// let balance = store.deposit(index, Decimal::from(100)).await.unwrap();
/// assert_eq!(balance, Decimal::from(100));
/// # });
/// ```
pub struct AccountStore {
    /// All accounts, in index order
    accounts: Mutex<Vec<Account>>,

    /// Delay held under the lock by every client-facing operation
    processing_delay: Duration,

    /// Value written to the legacy column of new accounts
    reserved_tag: i64,

    accounts_created: AtomicU64,
    sign_ins: AtomicU64,
    failed_sign_ins: AtomicU64,
    deposits: AtomicU64,
    withdrawals: AtomicU64,
    rejected_ops: AtomicU64,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("processing_delay", &self.processing_delay)
            .field(
                "accounts_created",
                &self.accounts_created.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESSING_DELAY)
    }
}

impl AccountStore {
    /// Creates an empty store.
    pub fn new(processing_delay: Duration) -> Self {
        Self::with_accounts(Vec::new(), processing_delay)
    }

    /// Creates a store from previously persisted accounts.
    ///
    /// Indices are re-derived from position, whatever the records carried.
    pub fn with_accounts(mut accounts: Vec<Account>, processing_delay: Duration) -> Self {
        for (index, account) in accounts.iter_mut().enumerate() {
            account.index = index;
            account.balance = round_money(account.balance);
        }

        Self {
            accounts: Mutex::new(accounts),
            processing_delay,
            reserved_tag: i64::from(std::process::id()),
            accounts_created: AtomicU64::new(0),
            sign_ins: AtomicU64::new(0),
            failed_sign_ins: AtomicU64::new(0),
            deposits: AtomicU64::new(0),
            withdrawals: AtomicU64::new(0),
            rejected_ops: AtomicU64::new(0),
        }
    }

    /// Acquires the table lock and waits out the processing delay.
    async fn lock_and_process(&self) -> MutexGuard<'_, Vec<Account>> {
        let guard = self.accounts.lock().await;
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }
        guard
    }

    /// Looks up an account that operations may touch.
    fn usable(accounts: &mut [Account], index: usize) -> Option<&mut Account> {
        accounts.get_mut(index).filter(|a| a.is_usable())
    }

    fn reject(&self, err: StoreError) -> StoreError {
        self.rejected_ops.fetch_add(1, Ordering::Relaxed);
        err
    }

    /// Appends a new account with a zero balance and returns its index.
    ///
    /// Duplicate names are allowed.
    pub async fn create_account(&self, name: &str, credential: &str) -> usize {
        let mut accounts = self.lock_and_process().await;

        let index = accounts.len();
        accounts.push(Account::new(index, name, credential, self.reserved_tag));
        self.accounts_created.fetch_add(1, Ordering::Relaxed);

        info!(index, name, "Account created");
        index
    }

    /// Finds the first account, in index order, matching name and credential.
    pub async fn authenticate(
        &self,
        name: &str,
        credential: &str,
    ) -> Result<AccountSummary, StoreError> {
        let accounts = self.lock_and_process().await;

        match accounts.iter().find(|a| a.matches(name, credential)) {
            Some(account) => {
                self.sign_ins.fetch_add(1, Ordering::Relaxed);
                info!(index = account.index, name, "Sign-in successful");
                Ok(AccountSummary::from(account))
            }
            None => {
                self.failed_sign_ins.fetch_add(1, Ordering::Relaxed);
                debug!(name, "Sign-in failed");
                Err(self.reject(StoreError::AuthFailed))
            }
        }
    }

    /// Returns the balance of an account.
    pub async fn get_balance(&self, index: usize) -> Result<Decimal, StoreError> {
        let mut accounts = self.lock_and_process().await;

        Self::usable(&mut accounts, index)
            .map(|a| a.balance)
            .ok_or_else(|| self.reject(StoreError::InvalidIndex))
    }

    /// Adds a strictly positive amount to an account and returns the new balance.
    pub async fn deposit(&self, index: usize, amount: Decimal) -> Result<Decimal, StoreError> {
        let mut accounts = self.lock_and_process().await;

        let Some(account) = Self::usable(&mut accounts, index) else {
            debug!(index, "Deposit rejected: invalid index");
            return Err(self.reject(StoreError::InvalidIndex));
        };

        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            debug!(index, %amount, "Deposit rejected: invalid amount");
            return Err(self.reject(StoreError::InvalidAmount));
        }

        let Some(balance) = account.balance.checked_add(amount) else {
            debug!(index, %amount, "Deposit rejected: balance overflow");
            return Err(self.reject(StoreError::InvalidAmount));
        };

        account.balance = round_money(balance);
        self.deposits.fetch_add(1, Ordering::Relaxed);

        info!(index, %amount, balance = %account.balance, "Deposit");
        Ok(account.balance)
    }

    /// Removes a strictly positive amount from an account and returns the new
    /// balance.
    ///
    /// A withdrawal larger than the balance is rejected in full.
    pub async fn withdraw(&self, index: usize, amount: Decimal) -> Result<Decimal, StoreError> {
        let mut accounts = self.lock_and_process().await;

        let Some(account) = Self::usable(&mut accounts, index) else {
            debug!(index, "Withdrawal rejected: invalid index");
            return Err(self.reject(StoreError::InvalidIndex));
        };

        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            debug!(index, %amount, "Withdrawal rejected: invalid amount");
            return Err(self.reject(StoreError::InvalidAmount));
        }

        if amount > account.balance {
            debug!(
                index,
                %amount,
                balance = %account.balance,
                "Withdrawal rejected: insufficient funds"
            );
            return Err(self.reject(StoreError::InsufficientFunds));
        }

        account.balance = round_money(account.balance - amount);
        self.withdrawals.fetch_add(1, Ordering::Relaxed);

        info!(index, %amount, balance = %account.balance, "Withdrawal");
        Ok(account.balance)
    }

    /// Returns a copy of every account, in index order.
    ///
    /// Takes the lock but not the processing delay, so a snapshot never
    /// observes a half-applied operation.
    pub async fn snapshot(&self) -> Vec<Account> {
        self.accounts.lock().await.clone()
    }

    /// Returns the number of accounts.
    pub async fn len(&self) -> usize {
        self.accounts.lock().await.len()
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            accounts_created: self.accounts_created.load(Ordering::Relaxed),
            sign_ins: self.sign_ins.load(Ordering::Relaxed),
            failed_sign_ins: self.failed_sign_ins.load(Ordering::Relaxed),
            deposits: self.deposits.load(Ordering::Relaxed),
            withdrawals: self.withdrawals.load(Ordering::Relaxed),
            rejected_ops: self.rejected_ops.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Instant;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn store() -> AccountStore {
        AccountStore::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_create_assigns_dense_indices() {
        let store = store();

        assert_eq!(store.create_account("alice", "secret1").await, 0);
        assert_eq!(store.create_account("bob", "hunter2").await, 1);
        assert_eq!(store.create_account("alice", "other").await, 2);
        assert_eq!(store.len().await, 3);
        assert_eq!(store.stats().accounts_created, 3);
    }

    #[tokio::test]
    async fn test_authenticate_first_match_wins() {
        let store = store();
        store.create_account("alice", "secret1").await;
        store.create_account("alice", "secret1").await;

        let summary = store.authenticate("alice", "secret1").await.unwrap();
        assert_eq!(summary.index, 0);
        assert_eq!(summary.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_authenticate_failure() {
        let store = store();
        assert_eq!(
            store.authenticate("bob", "wrongpass").await,
            Err(StoreError::AuthFailed)
        );

        store.create_account("bob", "rightpass").await;
        assert_eq!(
            store.authenticate("bob", "wrongpass").await,
            Err(StoreError::AuthFailed)
        );
        assert_eq!(store.stats().failed_sign_ins, 2);
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw() {
        let store = store();
        let index = store.create_account("alice", "secret1").await;

        assert_eq!(store.deposit(index, dec("100.00")).await, Ok(dec("100.00")));
        assert_eq!(
            store.withdraw(index, dec("150.00")).await,
            Err(StoreError::InsufficientFunds)
        );
        assert_eq!(store.get_balance(index).await, Ok(dec("100.00")));
        assert_eq!(store.withdraw(index, dec("40.00")).await, Ok(dec("60.00")));
    }

    #[tokio::test]
    async fn test_withdraw_entire_balance() {
        let store = store();
        let index = store.create_account("alice", "secret1").await;
        store.deposit(index, dec("12.34")).await.unwrap();

        assert_eq!(store.withdraw(index, dec("12.34")).await, Ok(Decimal::ZERO));
        assert_eq!(
            store.withdraw(index, dec("0.01")).await,
            Err(StoreError::InsufficientFunds)
        );
    }

    #[tokio::test]
    async fn test_deposit_withdraw_round_trip() {
        let store = store();
        let index = store.create_account("alice", "secret1").await;
        store.deposit(index, dec("10.10")).await.unwrap();

        for amount in ["0.01", "0.10", "33.33", "1234.56"] {
            store.deposit(index, dec(amount)).await.unwrap();
            store.withdraw(index, dec(amount)).await.unwrap();
            assert_eq!(store.get_balance(index).await, Ok(dec("10.10")));
        }
    }

    #[tokio::test]
    async fn test_invalid_amounts() {
        let store = store();
        let index = store.create_account("alice", "secret1").await;

        assert_eq!(
            store.deposit(index, Decimal::ZERO).await,
            Err(StoreError::InvalidAmount)
        );
        assert_eq!(
            store.deposit(index, dec("-5")).await,
            Err(StoreError::InvalidAmount)
        );
        // Rounds to 0.00
        assert_eq!(
            store.deposit(index, dec("0.004")).await,
            Err(StoreError::InvalidAmount)
        );
        assert_eq!(
            store.withdraw(index, dec("-1")).await,
            Err(StoreError::InvalidAmount)
        );
        assert_eq!(store.get_balance(index).await, Ok(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_invalid_index() {
        let store = store();
        store.create_account("alice", "secret1").await;
        store.create_account("bob", "hunter2").await;

        assert_eq!(
            store.deposit(5, dec("10.00")).await,
            Err(StoreError::InvalidIndex)
        );
        assert_eq!(
            store.withdraw(2, dec("10.00")).await,
            Err(StoreError::InvalidIndex)
        );
        assert_eq!(store.get_balance(9).await, Err(StoreError::InvalidIndex));
        // Index is checked before the amount
        assert_eq!(
            store.deposit(5, dec("-1")).await,
            Err(StoreError::InvalidIndex)
        );
    }

    #[tokio::test]
    async fn test_amounts_are_rounded_to_cents() {
        let store = store();
        let index = store.create_account("alice", "secret1").await;

        assert_eq!(store.deposit(index, dec("1.005")).await, Ok(dec("1.01")));
        assert!(store.deposit(index, dec("0.001")).await.is_err());
    }

    #[tokio::test]
    async fn test_deposit_overflow_is_rejected() {
        let store = store();
        let index = store.create_account("alice", "secret1").await;
        store.deposit(index, Decimal::MAX).await.unwrap();

        assert_eq!(
            store.deposit(index, Decimal::MAX).await,
            Err(StoreError::InvalidAmount)
        );
        assert_eq!(store.get_balance(index).await, Ok(Decimal::MAX));
    }

    #[tokio::test]
    async fn test_with_accounts_rederives_indices() {
        let mut a = Account::new(7, "alice", "secret1", 42);
        a.balance = dec("5.00");
        let b = Account::new(3, "bob", "hunter2", 42);

        let store = AccountStore::with_accounts(vec![a, b], Duration::ZERO);
        let snapshot = store.snapshot().await;

        assert_eq!(snapshot[0].index, 0);
        assert_eq!(snapshot[1].index, 1);
        assert_eq!(snapshot[0].reserved, 42);
        assert_eq!(store.create_account("carol", "pw").await, 2);
        assert_eq!(
            store.authenticate("alice", "secret1").await.unwrap().balance,
            dec("5.00")
        );
    }

    #[tokio::test]
    async fn test_unreadable_slot_keeps_its_index() {
        let mut bob = Account::new(2, "bob", "hunter2", 1);
        bob.balance = dec("5.00");
        let accounts = vec![
            Account::new(0, "alice", "secret1", 1),
            Account::unreadable(1, &b"garbage"[..]),
            bob,
        ];
        let store = AccountStore::with_accounts(accounts, Duration::ZERO);

        assert_eq!(store.authenticate("bob", "hunter2").await.unwrap().index, 2);
        assert_eq!(store.get_balance(1).await, Err(StoreError::InvalidIndex));
        assert_eq!(
            store.deposit(1, dec("1.00")).await,
            Err(StoreError::InvalidIndex)
        );
        assert_eq!(
            store.withdraw(1, dec("1.00")).await,
            Err(StoreError::InvalidIndex)
        );
        assert_eq!(store.create_account("carol", "pw").await, 3);
        assert_eq!(store.snapshot().await[1].raw_line.as_deref(), Some(&b"garbage"[..]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_are_dense() {
        let store = Arc::new(store());
        let mut handles = vec![];

        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create_account(&format!("user{}", i), "pw").await
            }));
        }

        let mut indices = Vec::new();
        for handle in handles {
            indices.push(handle.await.unwrap());
        }
        indices.sort_unstable();

        assert_eq!(indices, (0..50).collect::<Vec<_>>());
        assert_eq!(store.len().await, 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_withdrawals_never_overdraw() {
        let store = Arc::new(store());
        let index = store.create_account("alice", "secret1").await;
        store.deposit(index, dec("100.00")).await.unwrap();

        let mut handles = vec![];
        for _ in 0..30 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.withdraw(index, dec("7.00")).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 14);
        assert_eq!(store.get_balance(index).await, Ok(dec("2.00")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_operations_are_serialized_by_delay() {
        let delay = Duration::from_millis(50);
        let store = Arc::new(AccountStore::new(delay));
        let start = Instant::now();

        let mut handles = vec![];
        for i in 0..4 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create_account(&format!("user{}", i), "pw").await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Four operations, each holding the lock for the full delay
        assert!(start.elapsed() >= delay * 4);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = store();
        let index = store.create_account("alice", "secret1").await;
        store.deposit(index, dec("10")).await.unwrap();
        store.withdraw(index, dec("3")).await.unwrap();
        let _ = store.withdraw(index, dec("300")).await;
        store.authenticate("alice", "secret1").await.unwrap();

        let stats = store.stats();
        assert_eq!(stats.accounts_created, 1);
        assert_eq!(stats.deposits, 1);
        assert_eq!(stats.withdrawals, 1);
        assert_eq!(stats.sign_ins, 1);
        assert_eq!(stats.rejected_ops, 1);
    }
}
