//! CSV format handling for command records and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain types
//! - Balance and history output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{Account, AccountId, CommandRecord, CommandType, HistoryEntry, Points};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, account, amount.
/// The amount is read as text so that a missing or malformed amount can be
/// reported with the offending value.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub command: String,
    pub account: AccountId,
    pub amount: Option<String>,
}

/// Convert a CsvRecord to a CommandRecord
///
/// This function:
/// - Parses the command string (case-insensitive) into a CommandType
/// - Parses the amount into an integer number of points
///
/// Negative amounts are accepted here; rejecting them is the ledger's job.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<CommandRecord, String> {
    let command = match csv_record.command.to_lowercase().as_str() {
        "charge" => CommandType::Charge,
        "use" => CommandType::Use,
        _ => {
            return Err(format!(
                "Invalid command type: '{}' for account {}",
                csv_record.command, csv_record.account
            ))
        }
    };

    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => {
            amount_str.trim().parse::<Points>().map_err(|_| {
                format!(
                    "Invalid amount '{}' for account {}",
                    amount_str, csv_record.account
                )
            })?
        }
        _ => {
            return Err(format!(
                "{:?} command for account {} requires an amount",
                command, csv_record.account
            ))
        }
    };

    Ok(CommandRecord {
        command,
        account: csv_record.account,
        amount,
    })
}

/// Write account balances to CSV format
///
/// Writes accounts with columns: account, balance.
/// Accounts are sorted by account ID for deterministic output.
pub fn write_balances_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id);

    for account in sorted_accounts {
        writer
            .write_record(&[account.id.to_string(), account.balance.to_string()])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write history entries to CSV format
///
/// Writes entries with columns: account, seq, kind, resulting_balance.
/// Entries are expected grouped per account in history order and are written
/// as given. Timestamps are left out so that output is reproducible.
pub fn write_history_csv(entries: &[HistoryEntry], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "seq", "kind", "resulting_balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for entry in entries {
        writer
            .write_record(&[
                entry.account_id.to_string(),
                entry.seq.to_string(),
                entry.kind.to_string(),
                entry.resulting_balance.to_string(),
            ])
            .map_err(|e| format!("Failed to write history record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
