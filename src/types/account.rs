//! Account-related types
//!
//! This module defines the account owner, the account itself and its
//! lifecycle status.

use chrono::{DateTime, Utc};
use std::fmt;

/// Numeric account identifier
pub type AccountId = u64;

/// Numeric identifier of the user owning one or more accounts
pub type OwnerId = u64;

/// Number given to the very first account
///
/// Later accounts take the previous number plus one.
pub const FIRST_ACCOUNT_NUMBER: u64 = 1_000_000_000;

/// Maximum number of accounts a single owner may hold
pub const MAX_ACCOUNTS_PER_OWNER: usize = 10;

/// Lifecycle status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    /// The account accepts debits and reversals
    Active,
    /// The account was closed; terminal state
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user who owns accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountOwner {
    pub id: OwnerId,
    pub name: String,
}

impl AccountOwner {
    pub fn new(id: OwnerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Monetary account state
///
/// The balance is expressed in the smallest currency unit and can never be
/// negative. It is only mutated by the transaction processor while the
/// account's lock is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub owner_id: OwnerId,

    /// Unique, monotonically assigned account number
    pub number: String,

    pub status: AccountStatus,

    /// Current balance in the smallest currency unit
    pub balance: u64,

    pub registered_at: DateTime<Utc>,

    /// Set once the account is closed
    pub closed_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn is_owned_by(&self, owner_id: OwnerId) -> bool {
        self.owner_id == owner_id
    }

    /// Mark the account closed at `at`
    ///
    /// Callers are responsible for checking that the balance is zero first.
    pub fn close(&mut self, at: DateTime<Utc>) {
        self.status = AccountStatus::Closed;
        self.closed_at = Some(at);
    }
}

/// Account number string for the n-th account (1-based)
pub fn account_number_for(sequence: u64) -> String {
    (FIRST_ACCOUNT_NUMBER + sequence.saturating_sub(1)).to_string()
}
