//! Synchronous processing strategy
//!
//! Single-threaded replay: the `SyncReader` streams rows from the CSV file and
//! each command is applied to the ledger before the next row is read, so input
//! order is exactly commit order.

use crate::core::{InMemoryLedger, OutcomeSummary, TransactionOutcome};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{log_summary, write_ledger, ProcessingStrategy, ReplayOptions};
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Synchronous processing strategy
///
/// ```no_run
/// use rust_point_ledger::strategy::{ProcessingStrategy, ReplayOptions, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(ReplayOptions::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("commands.csv"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    options: ReplayOptions,
}

impl SyncProcessingStrategy {
    pub fn new(options: ReplayOptions) -> Self {
        Self { options }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let ledger = InMemoryLedger::in_memory(&self.options.lock);
        let reader = SyncReader::new(input_path)?;

        let mut summary = OutcomeSummary::default();
        let mut skipped_rows = 0;

        for result in reader {
            match result {
                Ok(record) => {
                    // Rejections and failures are logged by the ledger
                    let outcome = TransactionOutcome::from(ledger.apply(&record));
                    summary.record(&outcome);
                }
                Err(e) => {
                    skipped_rows += 1;
                    warn!(error = %e, "Skipping record");
                }
            }
        }

        log_summary("sync", &summary, skipped_rows);

        write_ledger(&ledger, self.options.include_history, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run(content: &str, options: ReplayOptions) -> String {
        let file = create_temp_csv(content);
        let mut output = Vec::new();

        SyncProcessingStrategy::new(options)
            .process(file.path(), &mut output)
            .unwrap();

        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let strategy = SyncProcessingStrategy::default();
        let mut output = Vec::new();

        let result = strategy.process(Path::new("nonexistent.csv"), &mut output);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_strategy_rejected_commands_leave_no_trace() {
        let output = run(
            "type,account,amount\n\
             use,1,500\n\
             charge,2,-10\n\
             charge,3,0\n",
            ReplayOptions::default(),
        );

        // Account 3 exists with a zero balance; accounts 1 and 2 were never written
        assert_eq!(output, "account,balance\n3,0\n");
    }

    #[test]
    fn test_sync_strategy_continues_on_malformed_record() {
        let output = run(
            "type,account,amount\n\
             charge,1,100\n\
             charge,2,lots\n\
             charge,3,50\n",
            ReplayOptions::default(),
        );

        assert_eq!(output, "account,balance\n1,100\n3,50\n");
    }

    #[test]
    fn test_sync_strategy_writes_history_in_commit_order() {
        let output = run(
            "type,account,amount\n\
             charge,1,1000\n\
             use,1,5000\n\
             use,1,400\n",
            ReplayOptions {
                include_history: true,
                ..ReplayOptions::default()
            },
        );

        assert_eq!(
            output,
            "account,balance\n1,600\n\n\
             account,seq,kind,resulting_balance\n1,1,CHARGE,1000\n1,2,USE,600\n"
        );
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncProcessingStrategy>();
    }
}
