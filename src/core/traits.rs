//! Core traits for the ledger's collaborators
//!
//! This module defines the seams between the balance ledger and the things it
//! coordinates: the account store, the history log and the key lock manager.
//! In-memory implementations live next to this module; tests plug in failing
//! or blocking implementations through the same traits.

use chrono::{DateTime, Utc};

use crate::types::{Account, AccountId, HistoryEntry, HistoryKind, Points, StoreError};

/// Key-value persistence of account balances
///
/// Single-key reads and single-key writes are atomic. A read followed by a
/// write is NOT atomic; the ledger closes that gap with the key lock manager.
pub trait AccountStore: Send + Sync {
    /// Read the current account, or `None` if it was never written
    fn read(&self, id: AccountId) -> Option<Account>;

    /// Persist a new balance for the account and return the stored account
    fn write(&self, id: AccountId, balance: Points) -> Result<Account, StoreError>;
}

/// Append-only, per-account history of balance changes
pub trait HistoryLog: Send + Sync {
    /// Append an entry for the account
    fn append(
        &self,
        id: AccountId,
        resulting_balance: Points,
        kind: HistoryKind,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoryEntry, StoreError>;

    /// All entries of the account in insertion order
    fn read_all(&self, id: AccountId) -> Vec<HistoryEntry>;
}

/// Exclusive access per account id
///
/// `with_exclusive` runs the closure while no other `with_exclusive` call for
/// the same id is running. Calls for different ids must not serialize each
/// other (a striped implementation may, rarely, when two ids share a stripe).
/// The hold is released on every exit path, including panics.
pub trait KeyLock: Send + Sync {
    fn with_exclusive<R, F>(&self, id: AccountId, f: F) -> R
    where
        F: FnOnce() -> R;
}
