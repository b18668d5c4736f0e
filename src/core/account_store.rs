//! Thread-safe in-memory account store
//!
//! This module provides the `InMemoryAccountStore` struct, which keeps account
//! balances in a `DashMap` so that single-key reads and writes are atomic and
//! accounts on different shards never contend.
//!
//! # Design
//!
//! The store offers no read-modify-write primitive: a read
//! followed by a write is two independent operations. Serializing them per
//! account is the ledger's job (see `core::lock_manager`).
//!
//! # Simulated Latency
//!
//! A store can be configured to sleep during writes, which widens the window
//! between a ledger's read and its write. Concurrency tests use this to make
//! lost-update races reproducible. An optional write timeout turns a slow
//! write into `StoreError::Timeout` instead of blocking the caller.

use std::thread;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;

use super::traits::AccountStore;
use crate::types::{Account, AccountId, Points, StoreError};

/// Thread-safe account balance store
///
/// `InMemoryAccountStore` provides concurrent access to account balances using
/// `DashMap` for fine-grained locking. Each `read` and `write` touches exactly
/// one entry and is atomic on its own.
#[derive(Debug)]
pub struct InMemoryAccountStore {
    /// Account balances by account ID
    accounts: DashMap<AccountId, Account>,

    /// Artificial delay applied to every write
    write_latency: Option<Duration>,

    /// Writes slower than this fail with `StoreError::Timeout`
    write_timeout: Option<Duration>,
}

impl InMemoryAccountStore {
    /// Create a new empty store without artificial latency
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            write_latency: None,
            write_timeout: None,
        }
    }

    /// Delay every write by `latency`
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = Some(latency);
        self
    }

    /// Fail writes whose latency exceeds `timeout`
    ///
    /// The store waits at most `timeout` and then reports the timeout without
    /// applying the write.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Get all accounts for final output
    ///
    /// The accounts are returned in an arbitrary order (determined by the
    /// internal hash map). The vector is a snapshot; concurrent writes after
    /// this call returns are not reflected.
    pub fn get_all_accounts(&self) -> Vec<Account> {
        self.accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of accounts that have been written at least once
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn read(&self, id: AccountId) -> Option<Account> {
        self.accounts.get(&id).map(|entry| entry.value().clone())
    }

    fn write(&self, id: AccountId, balance: Points) -> Result<Account, StoreError> {
        if let Some(latency) = self.write_latency {
            match self.write_timeout {
                Some(timeout) if latency > timeout => {
                    thread::sleep(timeout);
                    return Err(StoreError::Timeout {
                        operation: "write".to_string(),
                        account: id,
                        elapsed: timeout,
                    });
                }
                _ => thread::sleep(latency),
            }
        }

        let account = Account {
            id,
            balance,
            updated_at: Utc::now(),
        };
        self.accounts.insert(id, account.clone());
        Ok(account)
    }
}
