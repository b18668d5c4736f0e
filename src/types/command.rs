//! Command-related types for replaying ledger operations
//!
//! A command is one balance-changing request read from an input file. Only
//! `charge` and `use` change balances, so those are the only command types.

use super::account::{AccountId, Points};

/// Balance-changing operations that can be replayed against the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    /// Add points to an account
    Charge,

    /// Spend points from an account (requires a sufficient balance)
    Use,
}

/// Input command record
///
/// The amount is kept signed: negative amounts are valid input rows and are
/// rejected by the ledger with `InvalidAmount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// The operation to perform
    pub command: CommandType,

    /// The account the operation applies to
    pub account: AccountId,

    /// Requested amount of points
    pub amount: Points,
}
