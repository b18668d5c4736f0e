//! Concurrent batch replay of ledger commands
//!
//! This module provides the `BatchProcessor` struct, which replays batches of
//! commands against a shared `InMemoryLedger` on a tokio runtime.
//!
//! # Design
//!
//! Two modes are offered:
//!
//! - **Partitioned** (`process_batch`): the batch is split by account id and
//!   each account's commands run sequentially in one task, so the replay is
//!   deterministic while different accounts proceed in parallel.
//! - **Unordered** (`process_batch_unordered`): every command is its own task.
//!   Commands for the same account race each other and are serialized only
//!   by the ledger's key lock manager.
//!
//! Ledger calls can block on an account's lock, so tasks run on tokio's
//! blocking pool.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Arc<InMemoryLedger>  (shared, thread-safe ledger)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::error;

use super::ledger::InMemoryLedger;
use super::outcome::TransactionOutcome;
use crate::types::{AccountId, CommandRecord};

/// Result of replaying a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was replayed
    pub record: CommandRecord,

    /// What the ledger reported for it
    pub outcome: TransactionOutcome,
}

/// Batch processor with account-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    /// Thread-safe ledger shared by all tasks
    ledger: Arc<InMemoryLedger>,
}

impl BatchProcessor {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self { ledger }
    }

    /// Partition a batch of commands by account ID
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one sub-batch
    /// - Commands for each account keep their original order
    pub fn partition_by_account(
        &self,
        batch: Vec<CommandRecord>,
    ) -> HashMap<AccountId, Vec<CommandRecord>> {
        let mut account_batches: HashMap<AccountId, Vec<CommandRecord>> = HashMap::new();

        for record in batch {
            account_batches
                .entry(record.account)
                .or_default()
                .push(record);
        }

        account_batches
    }

    /// Replay commands one after another on the calling thread
    ///
    /// Every command is replayed, even if earlier ones were rejected or failed.
    /// Results are in input order.
    pub fn process_commands(&self, commands: Vec<CommandRecord>) -> Vec<ProcessingResult> {
        commands
            .into_iter()
            .map(|record| {
                let outcome = TransactionOutcome::from(self.ledger.apply(&record));
                ProcessingResult { record, outcome }
            })
            .collect()
    }

    /// Replay a batch with one task per account
    ///
    /// Results are grouped by account; their order across accounts is
    /// unspecified.
    pub async fn process_batch(&self, batch: Vec<CommandRecord>) -> Vec<ProcessingResult> {
        let tasks = self
            .partition_by_account(batch)
            .into_values()
            .map(|commands| {
                let processor = self.clone();
                tokio::task::spawn_blocking(move || processor.process_commands(commands))
            });

        let mut results = Vec::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok(account_results) => results.extend(account_results),
                Err(e) => error!(error = %e, "Replay task panicked"),
            }
        }

        results
    }

    /// Replay a batch with one task per command
    ///
    /// Commands for the same account run concurrently; their relative order is
    /// decided by the key lock manager, not by the input.
    pub async fn process_batch_unordered(
        &self,
        batch: Vec<CommandRecord>,
    ) -> Vec<ProcessingResult> {
        let tasks = batch.into_iter().map(|record| {
            let ledger = Arc::clone(&self.ledger);
            tokio::task::spawn_blocking(move || {
                let outcome = TransactionOutcome::from(ledger.apply(&record));
                ProcessingResult { record, outcome }
            })
        });

        let mut results = Vec::new();
        for joined in join_all(tasks).await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!(error = %e, "Replay task panicked"),
            }
        }

        results
    }
}
