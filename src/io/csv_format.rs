//! CSV format handling for replay inputs and reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - `SeedRow` and `RequestRow` structures for deserialization
//! - Conversion from CSV rows to domain types
//! - Ledger and account report serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{Account, AccountSeed, OwnerId, Request, TransactionRecord};
use chrono::SecondsFormat;
use csv::Writer;
use serde::Deserialize;
use std::io::Write;

/// A CSV row that converts into a domain value
pub trait CsvRow: for<'de> Deserialize<'de> {
    type Output;

    fn convert(self) -> Result<Self::Output, String>;
}

/// Row of the accounts file: `owner, name, balance`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SeedRow {
    pub owner: OwnerId,
    pub name: String,
    pub balance: u64,
}

impl CsvRow for SeedRow {
    type Output = AccountSeed;

    fn convert(self) -> Result<AccountSeed, String> {
        convert_seed_row(self)
    }
}

/// Row of the requests file: `type, owner, account, amount, ref`
///
/// Every column but `type` is optional; which ones a request needs depends
/// on its type.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RequestRow {
    #[serde(rename = "type")]
    pub request_type: String,
    pub owner: Option<OwnerId>,
    pub account: Option<String>,
    pub amount: Option<u64>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

impl CsvRow for RequestRow {
    type Output = Request;

    fn convert(self) -> Result<Request, String> {
        convert_request_row(self)
    }
}

/// Convert a SeedRow to an AccountSeed
///
/// The owner name must not be empty.
pub fn convert_seed_row(row: SeedRow) -> Result<AccountSeed, String> {
    if row.name.trim().is_empty() {
        return Err(format!("Owner {} requires a name", row.owner));
    }

    Ok(AccountSeed {
        owner: row.owner,
        name: row.name,
        balance: row.balance,
    })
}

/// Convert a RequestRow to a Request
///
/// This function:
/// - Parses the request type (case insensitive)
/// - Checks that the columns the type needs are present
/// - Ignores the columns it does not need
///
/// # Returns
///
/// Result containing either:
/// - Ok(Request) - Successfully converted request
/// - Err(String) - Error message describing the conversion failure
pub fn convert_request_row(row: RequestRow) -> Result<Request, String> {
    let request_type = row.request_type.to_lowercase();
    let reference = row.reference.filter(|r| !r.is_empty());
    let account = row.account.filter(|a| !a.is_empty());

    match request_type.as_str() {
        "debit" => Ok(Request::Debit {
            owner: row.owner.ok_or_else(|| missing("debit", "owner"))?,
            account: account.ok_or_else(|| missing("debit", "account"))?,
            amount: row.amount.ok_or_else(|| missing("debit", "amount"))?,
            label: reference,
        }),
        "reverse" => Ok(Request::Reverse {
            account: account.ok_or_else(|| missing("reverse", "account"))?,
            amount: row.amount.ok_or_else(|| missing("reverse", "amount"))?,
            reference: reference.ok_or_else(|| missing("reverse", "ref"))?,
        }),
        "query" => Ok(Request::Query {
            reference: reference.ok_or_else(|| missing("query", "ref"))?,
        }),
        _ => Err(format!("Invalid request type: '{}'", row.request_type)),
    }
}

fn missing(request_type: &str, column: &str) -> String {
    format!("{} request requires '{}'", request_type, column)
}

/// Write ledger records to CSV format
///
/// Columns: id, kind, outcome, account, amount, balance_after,
/// transaction_id, transacted_at. Records are sorted by id.
pub fn write_ledger_csv(records: &[TransactionRecord], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "kind",
            "outcome",
            "account",
            "amount",
            "balance_after",
            "transaction_id",
            "transacted_at",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| record.id);

    for record in sorted {
        writer
            .write_record(&[
                record.id.to_string(),
                record.kind.to_string(),
                record.outcome.to_string(),
                record.account_number,
                record.amount.to_string(),
                record.balance_after.to_string(),
                record.correlation_id.to_string(),
                record
                    .transacted_at
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ])
            .map_err(|e| format!("Failed to write ledger record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write account states to CSV format
///
/// Columns: account, owner, status, balance. Accounts are sorted by account
/// number for deterministic output.
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "owner", "status", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = accounts.to_vec();
    sorted.sort_by_key(|account| account.id);

    for account in sorted {
        writer
            .write_record(&[
                account.number,
                account.owner_id.to_string(),
                account.status.to_string(),
                account.balance.to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}
