//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state and identifiers
//! - `history`: History entries and their kinds
//! - `command`: Replayable balance-changing commands
//! - `error`: Error types for the ledger and its stores

pub mod account;
pub mod command;
pub mod error;
pub mod history;

pub use account::{Account, AccountId, Points};
pub use command::{CommandRecord, CommandType};
pub use error::{LedgerError, StorageStage, StoreError};
pub use history::{HistoryEntry, HistoryKind};
