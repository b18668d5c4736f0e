//! Balance ledger: per-account read-compute-write-append
//!
//! This module provides the `BalanceLedger` struct, which coordinates an
//! account store, a history log and a key lock manager.
//!
//! # Design
//!
//! `charge` and `use_points` run their whole critical section inside the key
//! lock manager's exclusive region for the account:
//!
//! ```text
//! validate amount            (no lock, no store access)
//! with_exclusive(id):
//!     read balance
//!     check funds            (use only)
//!     write new balance      -> StorageFailure { BalanceWrite } on error, no append
//!     append history entry   -> StorageFailure { HistoryAppend } on error
//! ```
//!
//! Because the append happens before the region is released, the order of an
//! account's history entries is the order in which its balance writes
//! committed.
//!
//! A failed append leaves the already committed balance in place and is
//! reported to the caller; no compensating write is attempted.
//!
//! # Reads
//!
//! `get_balance` and `get_history` bypass the lock manager. They see whatever
//! the stores hold at the time of the call, which may already be stale when
//! the caller looks at it.

use chrono::Utc;
use tracing::{debug, error, warn};

use super::account_store::InMemoryAccountStore;
use super::history_log::InMemoryHistoryLog;
use super::lock_manager::{KeyLockManager, LockConfig};
use super::traits::{AccountStore, HistoryLog, KeyLock};
use crate::types::{
    Account, AccountId, CommandRecord, CommandType, HistoryEntry, HistoryKind, LedgerError,
    Points,
};

/// Ledger over the in-memory stores, with the lock manager chosen at runtime
pub type InMemoryLedger = BalanceLedger<InMemoryAccountStore, InMemoryHistoryLog, KeyLockManager>;

/// Point balance ledger
///
/// Thread-safe: share it behind an `Arc` and call it from any number of
/// threads. Operations on the same account are serialized; operations on
/// different accounts are not.
#[derive(Debug)]
pub struct BalanceLedger<S, H, L> {
    accounts: S,
    history: H,
    locks: L,
}

impl InMemoryLedger {
    /// Create a ledger over fresh in-memory stores
    pub fn in_memory(config: &LockConfig) -> Self {
        Self::new(
            InMemoryAccountStore::new(),
            InMemoryHistoryLog::new(),
            KeyLockManager::from_config(config),
        )
    }
}

impl<S, H, L> BalanceLedger<S, H, L>
where
    S: AccountStore,
    H: HistoryLog,
    L: KeyLock,
{
    pub fn new(accounts: S, history: H, locks: L) -> Self {
        Self {
            accounts,
            history,
            locks,
        }
    }

    /// The underlying account store
    pub fn accounts(&self) -> &S {
        &self.accounts
    }

    /// The underlying history log
    pub fn history(&self) -> &H {
        &self.history
    }

    /// The underlying key lock manager
    pub fn locks(&self) -> &L {
        &self.locks
    }

    /// Current account state, or an empty account if it was never written
    pub fn get_balance(&self, id: AccountId) -> Account {
        self.accounts.read(id).unwrap_or_else(|| Account::empty(id))
    }

    /// All history entries of the account, oldest first
    ///
    /// The returned vector is a snapshot: it is finite, can be iterated any
    /// number of times, and is empty for accounts without history.
    pub fn get_history(&self, id: AccountId) -> Vec<HistoryEntry> {
        self.history.read_all(id)
    }

    /// Add `amount` points to the account
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is negative, or the new balance would overflow
    /// * `StorageFailure` - the balance write or the history append failed
    pub fn charge(&self, id: AccountId, amount: Points) -> Result<Account, LedgerError> {
        if amount < 0 {
            return Err(Self::reject(LedgerError::invalid_amount(id, amount)));
        }

        self.locks.with_exclusive(id, || {
            let balance = self.current_balance(id);
            let new_balance = balance
                .checked_add(amount)
                .ok_or_else(|| Self::reject(LedgerError::invalid_amount(id, amount)))?;

            self.commit(id, new_balance, HistoryKind::Charge)
        })
    }

    /// Spend `amount` points from the account
    ///
    /// The funds check and the balance write happen in the same exclusive
    /// region, so two concurrent uses can never both pass against the same
    /// balance.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is negative
    /// * `InsufficientFunds` - the balance is lower than `amount`
    /// * `StorageFailure` - the balance write or the history append failed
    pub fn use_points(&self, id: AccountId, amount: Points) -> Result<Account, LedgerError> {
        if amount < 0 {
            return Err(Self::reject(LedgerError::invalid_amount(id, amount)));
        }

        self.locks.with_exclusive(id, || {
            let balance = self.current_balance(id);
            if balance < amount {
                return Err(Self::reject(LedgerError::insufficient_funds(
                    id, balance, amount,
                )));
            }

            self.commit(id, balance - amount, HistoryKind::Use)
        })
    }

    /// Apply a replayed command
    pub fn apply(&self, record: &CommandRecord) -> Result<Account, LedgerError> {
        match record.command {
            CommandType::Charge => self.charge(record.account, record.amount),
            CommandType::Use => self.use_points(record.account, record.amount),
        }
    }

    fn current_balance(&self, id: AccountId) -> Points {
        self.accounts.read(id).map_or(0, |account| account.balance)
    }

    /// Write the new balance and append its history entry
    ///
    /// Must run inside the account's exclusive region.
    fn commit(
        &self,
        id: AccountId,
        new_balance: Points,
        kind: HistoryKind,
    ) -> Result<Account, LedgerError> {
        let account = self.accounts.write(id, new_balance).map_err(|e| {
            error!(account = id, %kind, error = %e, "Balance write failed");
            LedgerError::write_failed(id, e)
        })?;

        self.history
            .append(id, new_balance, kind, Utc::now())
            .map_err(|e| {
                error!(
                    account = id,
                    %kind,
                    balance = new_balance,
                    error = %e,
                    "History append failed after balance write committed"
                );
                LedgerError::append_failed(id, e)
            })?;

        debug!(account = id, %kind, balance = new_balance, "Committed balance change");
        Ok(account)
    }

    fn reject(error: LedgerError) -> LedgerError {
        warn!(error = %error, "Rejected ledger operation");
        error
    }
}
