//! Error types for the point ledger
//!
//! This module defines the errors that the ledger and its storage
//! collaborators can report.
//!
//! # Error Categories
//!
//! - **Store Errors**: failures reported by the account store or history log
//! - **Ledger Errors**: the closed taxonomy returned by `charge` and `use`:
//!   invalid amounts, insufficient funds and storage failures

use super::account::{AccountId, Points};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a storage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The account store rejected or lost a balance write
    #[error("Balance write failed for account {account}: {reason}")]
    WriteFailed {
        /// Account whose write failed
        account: AccountId,
        /// Description reported by the store
        reason: String,
    },

    /// The history log could not append an entry
    #[error("History append failed for account {account}: {reason}")]
    AppendFailed {
        /// Account whose append failed
        account: AccountId,
        /// Description reported by the log
        reason: String,
    },

    /// The store did not answer in time
    ///
    /// Stores that can block report a timeout instead of hanging, so the
    /// ledger never holds an account's exclusive region indefinitely.
    #[error("{operation} for account {account} timed out after {elapsed:?}")]
    Timeout {
        /// Store operation that timed out
        operation: String,
        /// Account the operation targeted
        account: AccountId,
        /// How long the store waited before giving up
        elapsed: Duration,
    },
}

/// Step of the exclusive region at which storage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStage {
    /// The balance write failed; nothing was committed
    BalanceWrite,

    /// The history append failed after the balance write committed
    HistoryAppend,
}

impl fmt::Display for StorageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageStage::BalanceWrite => f.write_str("balance write"),
            StorageStage::HistoryAppend => f.write_str("history append"),
        }
    }
}

/// Main error type for ledger operations
///
/// Every `charge` and `use` either returns the updated account or exactly one
/// of these variants. None of them are retried by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The requested amount is negative or cannot be applied
    ///
    /// Raised before any lock is taken or store accessed.
    #[error("Invalid amount {amount} for account {account}")]
    InvalidAmount {
        /// Account the request targeted
        account: AccountId,
        /// The rejected amount
        amount: Points,
    },

    /// The account balance does not cover the requested use
    ///
    /// Raised under the account's exclusive region; nothing is mutated.
    #[error("Insufficient funds for account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account the request targeted
        account: AccountId,
        /// Balance observed under the lock
        balance: Points,
        /// Amount that was requested
        requested: Points,
    },

    /// A storage collaborator failed during the exclusive region
    ///
    /// With `stage == BalanceWrite` nothing was committed. With
    /// `stage == HistoryAppend` the new balance is committed but has no
    /// matching history entry.
    #[error("Storage failure during {stage} for account {account}: {source}")]
    StorageFailure {
        /// Account the request targeted
        account: AccountId,
        /// Step at which the failure happened
        stage: StorageStage,
        /// Underlying store error
        source: StoreError,
    },
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(account: AccountId, amount: Points) -> Self {
        LedgerError::InvalidAmount { account, amount }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Points, requested: Points) -> Self {
        LedgerError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create a StorageFailure error for a failed balance write
    pub fn write_failed(account: AccountId, source: StoreError) -> Self {
        LedgerError::StorageFailure {
            account,
            stage: StorageStage::BalanceWrite,
            source,
        }
    }

    /// Create a StorageFailure error for a failed history append
    pub fn append_failed(account: AccountId, source: StoreError) -> Self {
        LedgerError::StorageFailure {
            account,
            stage: StorageStage::HistoryAppend,
            source,
        }
    }

    /// Whether the balance was committed despite the error
    pub fn balance_committed(&self) -> bool {
        matches!(
            self,
            LedgerError::StorageFailure {
                stage: StorageStage::HistoryAppend,
                ..
            }
        )
    }
}
