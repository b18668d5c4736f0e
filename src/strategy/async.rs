//! Asynchronous batch processing strategy
//!
//! Replays commands in batches on a tokio multi-threaded runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches, preserve_order)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (account partitioning + blocking tasks)
//!         └── Arc<InMemoryLedger>
//!             ├── InMemoryAccountStore
//!             ├── InMemoryHistoryLog
//!             └── KeyLockManager
//! ```
//!
//! # Ordering
//!
//! Batches are replayed one after another. With `preserve_order`, each batch
//! is partitioned by account id and every account's commands run in input
//! order, so the final state matches the sync strategy. Without it, every
//! command of a batch is its own task and commands for the same account are
//! serialized only by the ledger's key lock manager; the final balances then
//! depend on which `use` commands won the race.

use crate::core::{BatchProcessor, InMemoryLedger, OutcomeSummary};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{log_summary, write_ledger, ProcessingStrategy, ReplayOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Configuration for batch processing
///
/// Controls how commands are batched, the number of worker threads and
/// whether per-account input order is kept within a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
    /// Replay each account's commands in input order
    pub preserve_order: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
            preserve_order: true,
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent_batches: usize, preserve_order: bool) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                fallback = default.batch_size,
                "Invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                fallback = default.max_concurrent_batches,
                "Invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
            preserve_order,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    options: ReplayOptions,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, options: ReplayOptions) -> Self {
        Self { config, options }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Replay commands batch by batch and write the final ledger state
    ///
    /// 1. Builds a multi-threaded runtime with `max_concurrent_batches` workers
    /// 2. Reads up to `batch_size` commands with `AsyncReader`
    /// 3. Replays the batch through `BatchProcessor` and waits for it
    /// 4. Repeats until the input is exhausted, then writes output
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let ledger = Arc::new(InMemoryLedger::in_memory(&self.options.lock));
            let processor = BatchProcessor::new(Arc::clone(&ledger));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // csv-async reads futures::io, tokio::fs::File implements tokio::io
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut summary = OutcomeSummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // A batch completes before the next is read, so an account's
                // commands never overtake each other across batches
                let results = if self.config.preserve_order {
                    processor.process_batch(batch).await
                } else {
                    processor.process_batch_unordered(batch).await
                };

                for result in &results {
                    summary.record(&result.outcome);
                }
            }

            let mode = if self.config.preserve_order {
                "async"
            } else {
                "async-unordered"
            };
            log_summary(mode, &summary, reader.skipped());

            write_ledger(&ledger, self.options.include_history, output)
        })
    }
}
