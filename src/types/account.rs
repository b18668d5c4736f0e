//! Account-related types for the point ledger
//!
//! This module defines the Account structure returned by every balance query
//! and by successful `charge`/`use` operations.

use chrono::{DateTime, Utc};

/// Account identifier
pub type AccountId = i64;

/// Point quantity
///
/// Signed so that negative request amounts can be represented and rejected
/// by the ledger instead of being unrepresentable at the boundary.
pub type Points = i64;

/// Current point balance of a single account
///
/// Accounts are created lazily: an id that was never written reads as an
/// empty account with a zero balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// The account ID
    pub id: AccountId,

    /// Current balance, never negative
    pub balance: Points,

    /// When the balance was last written
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create an account with the given balance, stamped with the current time
    pub fn new(id: AccountId, balance: Points) -> Self {
        Account {
            id,
            balance,
            updated_at: Utc::now(),
        }
    }

    /// The zero-balance account reported for ids that were never written
    pub fn empty(id: AccountId) -> Self {
        Self::new(id, 0)
    }
}
