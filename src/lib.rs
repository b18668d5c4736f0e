//! Rust Point Ledger Library
//! # Overview
//!
//! This library provides a point-balance ledger whose `charge` and `use`
//! operations are linearizable per account, plus a CSV replay surface with a
//! sync and an async strategy.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, HistoryEntry, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::ledger`] - Charge/use orchestration under the key lock
//!   - [`core::lock_manager`] - Per-key and striped exclusive regions
//!   - [`core::account_store`] - Account balance storage
//!   - [`core::history_log`] - Append-only balance history
//! - [`io`] - CSV command parsing and result output
//! - [`strategy`] - Sync and async replay pipelines
//! - [`logging`] - tracing subscriber setup
//!
//! # Operations
//!
//! - **Charge**: Add points to an account, creating it on first charge
//! - **Use**: Deduct points, rejected if the balance would go negative
//! - **Balance**: Current account state, an empty account if never charged
//! - **History**: Every committed change in commit order
//!
//! Each charge or use on one account runs read, write and history append as a
//! single exclusive region, so concurrent callers never lose an update and
//! never overdraw. Operations on different accounts do not wait on each other
//! in per-key lock mode.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{
    AccountStore, BalanceLedger, HistoryLog, InMemoryAccountStore, InMemoryHistoryLog,
    InMemoryLedger, KeyLock, KeyLockManager, LockConfig, LockMode, OutcomeSummary,
    TransactionOutcome,
};
pub use io::{write_balances_csv, write_history_csv};
pub use types::{
    Account, AccountId, CommandRecord, CommandType, HistoryEntry, HistoryKind, LedgerError,
    Points, StorageStage, StoreError,
};
