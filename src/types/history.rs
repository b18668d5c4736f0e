//! History-related types for the point ledger
//!
//! A history entry is the immutable record of one committed balance change.
//! Entries are only ever appended; the ledger appends them while it still
//! holds the account's exclusive region, so per-account history order is the
//! order in which balance writes committed.

use super::account::{AccountId, Points};
use chrono::{DateTime, Utc};
use std::fmt;

/// Kind of balance change recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    /// Points were added to the account
    Charge,

    /// Points were spent from the account
    Use,
}

impl HistoryKind {
    /// Upper-case label used in CSV output and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Charge => "CHARGE",
            HistoryKind::Use => "USE",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed balance change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Process-wide sequence number assigned by the history log
    pub seq: u64,

    /// The account whose balance changed
    pub account_id: AccountId,

    /// Balance of the account right after the change committed
    pub resulting_balance: Points,

    /// Whether the change was a charge or a use
    pub kind: HistoryKind,

    /// When the change was recorded
    pub timestamp: DateTime<Utc>,
}
