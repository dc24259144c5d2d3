//! Transaction-related types
//!
//! This module defines the ledger record written for every processing attempt,
//! its kind and outcome, and the correlation id linking a debit to its
//! reversal.

use super::account::{Account, AccountId};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Numeric ledger record identifier, assigned on append
pub type TransactionId = u64;

/// Kind of balance-affecting operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Spend from the account balance
    Debit,
    /// Cancel an earlier debit, identified by its correlation id
    Reversal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Debit => "debit",
            TransactionKind::Reversal => "reversal",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionOutcome {
    Success,
    Failure,
}

impl TransactionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOutcome::Success => "success",
            TransactionOutcome::Failure => "failure",
        }
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier shared by a debit and its later reversal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh, unique id (32 lowercase hex characters)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Ledger entry waiting to be appended
///
/// The ledger assigns the numeric id; everything else is fixed by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub kind: TransactionKind,
    pub outcome: TransactionOutcome,
    pub account_id: AccountId,
    pub account_number: String,
    pub amount: u64,
    pub balance_after: u64,
    pub correlation_id: CorrelationId,
    pub transacted_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Build an entry for `account`, snapshotting its current balance
    pub fn for_account(
        account: &Account,
        kind: TransactionKind,
        outcome: TransactionOutcome,
        amount: u64,
        correlation_id: CorrelationId,
        transacted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            outcome,
            account_id: account.id,
            account_number: account.number.clone(),
            amount,
            balance_after: account.balance,
            correlation_id,
            transacted_at,
        }
    }

    /// Attach the id assigned by the ledger
    pub fn into_record(self, id: TransactionId) -> TransactionRecord {
        TransactionRecord {
            id,
            kind: self.kind,
            outcome: self.outcome,
            account_id: self.account_id,
            account_number: self.account_number,
            amount: self.amount,
            balance_after: self.balance_after,
            correlation_id: self.correlation_id,
            transacted_at: self.transacted_at,
        }
    }
}

/// Append-only audit record of one processing attempt
///
/// Records reference the account by identity only; they never own or mutate
/// the account itself. `balance_after` is the balance observed when the
/// record was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub outcome: TransactionOutcome,
    pub account_id: AccountId,
    pub account_number: String,
    pub amount: u64,
    pub balance_after: u64,
    pub correlation_id: CorrelationId,
    pub transacted_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn is_success(&self) -> bool {
        self.outcome == TransactionOutcome::Success
    }

    /// A successful debit, the only record a restoring reversal may credit back
    pub fn is_reversible_debit(&self) -> bool {
        self.kind == TransactionKind::Debit && self.is_success()
    }
}
