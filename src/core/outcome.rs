//! Transaction outcome reporting
//!
//! Maps ledger results onto the closed set of outcomes a surface reports:
//! success with the new account state, a rejection (caller or business-rule
//! error, nothing changed) or a failure (storage problem).

use std::fmt;

use crate::types::{Account, LedgerError};

/// Why a request was rejected without any state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    InvalidAmount,
    InsufficientFunds,
}

/// Why a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    StorageFailure,
}

/// Result of a `charge` or `use` request as seen by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Ok(Account),
    Rejected(RejectReason),
    Failed(FailureReason),
}

impl TransactionOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, TransactionOutcome::Ok(_))
    }

    /// Short label for reports and log fields
    pub fn label(&self) -> &'static str {
        match self {
            TransactionOutcome::Ok(_) => "ok",
            TransactionOutcome::Rejected(RejectReason::InvalidAmount) => "rejected:invalid_amount",
            TransactionOutcome::Rejected(RejectReason::InsufficientFunds) => {
                "rejected:insufficient_funds"
            }
            TransactionOutcome::Failed(FailureReason::StorageFailure) => "failed:storage_failure",
        }
    }
}

impl From<&LedgerError> for TransactionOutcome {
    fn from(error: &LedgerError) -> Self {
        match error {
            LedgerError::InvalidAmount { .. } => {
                TransactionOutcome::Rejected(RejectReason::InvalidAmount)
            }
            LedgerError::InsufficientFunds { .. } => {
                TransactionOutcome::Rejected(RejectReason::InsufficientFunds)
            }
            LedgerError::StorageFailure { .. } => {
                TransactionOutcome::Failed(FailureReason::StorageFailure)
            }
        }
    }
}

impl From<Result<Account, LedgerError>> for TransactionOutcome {
    fn from(result: Result<Account, LedgerError>) -> Self {
        match result {
            Ok(account) => TransactionOutcome::Ok(account),
            Err(error) => TransactionOutcome::from(&error),
        }
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Ok(account) => {
                write!(f, "ok (account {}, balance {})", account.id, account.balance)
            }
            other => f.write_str(other.label()),
        }
    }
}

/// Tally of outcomes over a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub ok: usize,
    pub invalid_amount: usize,
    pub insufficient_funds: usize,
    pub storage_failure: usize,
}

impl OutcomeSummary {
    pub fn record(&mut self, outcome: &TransactionOutcome) {
        match outcome {
            TransactionOutcome::Ok(_) => self.ok += 1,
            TransactionOutcome::Rejected(RejectReason::InvalidAmount) => self.invalid_amount += 1,
            TransactionOutcome::Rejected(RejectReason::InsufficientFunds) => {
                self.insufficient_funds += 1
            }
            TransactionOutcome::Failed(FailureReason::StorageFailure) => self.storage_failure += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.invalid_amount + self.insufficient_funds + self.storage_failure
    }
}

impl<'a> FromIterator<&'a TransactionOutcome> for OutcomeSummary {
    fn from_iter<I: IntoIterator<Item = &'a TransactionOutcome>>(iter: I) -> Self {
        let mut summary = OutcomeSummary::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StoreError;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_amount(
        LedgerError::invalid_amount(1, -10),
        TransactionOutcome::Rejected(RejectReason::InvalidAmount)
    )]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds(1, 0, 500),
        TransactionOutcome::Rejected(RejectReason::InsufficientFunds)
    )]
    #[case::write_failed(
        LedgerError::write_failed(1, StoreError::WriteFailed { account: 1, reason: "x".to_string() }),
        TransactionOutcome::Failed(FailureReason::StorageFailure)
    )]
    #[case::append_failed(
        LedgerError::append_failed(1, StoreError::AppendFailed { account: 1, reason: "x".to_string() }),
        TransactionOutcome::Failed(FailureReason::StorageFailure)
    )]
    fn test_error_mapping(#[case] error: LedgerError, #[case] expected: TransactionOutcome) {
        assert_eq!(TransactionOutcome::from(Err(error)), expected);
    }

    #[test]
    fn test_success_mapping_keeps_account() {
        let account = Account::new(1, 1000);

        let outcome = TransactionOutcome::from(Ok(account.clone()));

        assert!(outcome.is_ok());
        assert_eq!(outcome, TransactionOutcome::Ok(account));
        assert_eq!(outcome.to_string(), "ok (account 1, balance 1000)");
    }

    #[rstest]
    #[case::invalid(TransactionOutcome::Rejected(RejectReason::InvalidAmount), "rejected:invalid_amount")]
    #[case::insufficient(TransactionOutcome::Rejected(RejectReason::InsufficientFunds), "rejected:insufficient_funds")]
    #[case::storage(TransactionOutcome::Failed(FailureReason::StorageFailure), "failed:storage_failure")]
    fn test_labels(#[case] outcome: TransactionOutcome, #[case] expected: &str) {
        assert_eq!(outcome.label(), expected);
        assert_eq!(outcome.to_string(), expected);
        assert!(!outcome.is_ok());
    }

    #[test]
    fn test_summary_counts_each_outcome() {
        let outcomes = vec![
            TransactionOutcome::Ok(Account::new(1, 10)),
            TransactionOutcome::Ok(Account::new(1, 20)),
            TransactionOutcome::Rejected(RejectReason::InvalidAmount),
            TransactionOutcome::Rejected(RejectReason::InsufficientFunds),
            TransactionOutcome::Failed(FailureReason::StorageFailure),
        ];

        let summary: OutcomeSummary = outcomes.iter().collect();

        assert_eq!(
            summary,
            OutcomeSummary {
                ok: 2,
                invalid_amount: 1,
                insufficient_funds: 1,
                storage_failure: 1,
            }
        );
        assert_eq!(summary.total(), 5);
    }
}
