//! Processing strategy module for command replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing both CSV parsing and ledger processing. This allows different
//! processing implementations (synchronous, asynchronous batch) to be selected
//! at runtime.

use crate::cli::StrategyType;
use crate::core::{InMemoryLedger, LockConfig, OutcomeSummary};
use crate::io::csv_format::{write_balances_csv, write_history_csv};
use crate::types::HistoryEntry;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
///
/// Each strategy reads commands from a CSV file, replays them against a fresh
/// ledger and writes the final balances to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay commands from `input_path` and write results to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - The async runtime cannot be created
    /// - Output cannot be written
    ///
    /// Malformed rows and rejected or failed commands are logged and do not
    /// cause an error. Replay continues with the next row.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Options shared by every strategy
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Lock manager used by the replay ledger
    pub lock: LockConfig,

    /// Append each account's history after the balances
    pub include_history: bool,
}

/// Create a processing strategy based on the specified strategy type
///
/// `config` only applies to the async strategy and falls back to defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    options: ReplayOptions,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(options)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, options))
        }
    }
}

/// Write the final ledger state
///
/// Balances come first. With `include_history`, a blank line and a history
/// block follow, grouped by account id in ascending order.
pub(crate) fn write_ledger(
    ledger: &InMemoryLedger,
    include_history: bool,
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut accounts = ledger.accounts().get_all_accounts();
    accounts.sort_by_key(|account| account.id);

    write_balances_csv(&accounts, output)?;

    if include_history {
        let entries: Vec<HistoryEntry> = accounts
            .iter()
            .flat_map(|account| ledger.get_history(account.id))
            .collect();

        writeln!(output).map_err(|e| format!("Failed to write output: {}", e))?;
        write_history_csv(&entries, output)?;
    }

    Ok(())
}

fn log_summary(strategy: &str, summary: &OutcomeSummary, skipped_rows: usize) {
    info!(
        strategy,
        total = summary.total(),
        ok = summary.ok,
        invalid_amount = summary.invalid_amount,
        insufficient_funds = summary.insufficient_funds,
        storage_failure = summary.storage_failure,
        skipped_rows,
        "Replay complete"
    );
}
