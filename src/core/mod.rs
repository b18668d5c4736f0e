//! Core ledger module
//!
//! This module contains the concurrency-control core and its collaborators:
//! - `traits` - Seams for the account store, history log and key lock manager
//! - `lock_manager` - Per-key and striped exclusive access per account id
//! - `account_store` - Thread-safe in-memory account balances
//! - `history_log` - Thread-safe in-memory append-only history
//! - `ledger` - Read-compute-write-append under the per-account lock
//! - `outcome` - Mapping of ledger results to reported outcomes
//! - `batch_processor` - Concurrent replay of command batches

pub mod account_store;
pub mod batch_processor;
pub mod history_log;
pub mod ledger;
pub mod lock_manager;
pub mod outcome;
pub mod traits;

pub use account_store::InMemoryAccountStore;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use history_log::InMemoryHistoryLog;
pub use ledger::{BalanceLedger, InMemoryLedger};
pub use lock_manager::{
    KeyLockManager, LockConfig, LockMode, PerKeyLockManager, StripedLockManager,
};
pub use outcome::{FailureReason, OutcomeSummary, RejectReason, TransactionOutcome};
pub use traits::{AccountStore, HistoryLog, KeyLock};
