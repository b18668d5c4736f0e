//! Thread-safe in-memory history log
//!
//! This module provides the `InMemoryHistoryLog` struct, an append-only log of
//! balance changes keyed by account id.
//!
//! # Design
//!
//! Entries for one account are kept in a `Vec` inside a `DashMap` entry, so an
//! append is atomic with respect to reads of the same account and appends to
//! different accounts proceed in parallel. Every entry receives a process-wide
//! sequence number from an atomic counter.
//!
//! The log itself does not order concurrent appends for the same account; the
//! ledger appends while it holds the account's exclusive region, which makes
//! insertion order equal to commit order.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::traits::HistoryLog;
use crate::types::{AccountId, HistoryEntry, HistoryKind, Points, StoreError};

/// Thread-safe append-only history log
#[derive(Debug)]
pub struct InMemoryHistoryLog {
    /// History entries by account ID, in insertion order
    entries: DashMap<AccountId, Vec<HistoryEntry>>,

    /// Next sequence number to hand out
    next_seq: AtomicU64,
}

impl InMemoryHistoryLog {
    /// Create a new empty history log
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Total number of entries across all accounts
    pub fn total_entries(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for InMemoryHistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLog for InMemoryHistoryLog {
    fn append(
        &self,
        id: AccountId,
        resulting_balance: Points,
        kind: HistoryKind,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoryEntry, StoreError> {
        let mut account_entries = self.entries.entry(id).or_default();

        let entry = HistoryEntry {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            account_id: id,
            resulting_balance,
            kind,
            timestamp,
        };
        account_entries.push(entry.clone());

        Ok(entry)
    }

    fn read_all(&self, id: AccountId) -> Vec<HistoryEntry> {
        self.entries
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}
