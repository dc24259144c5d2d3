//! Replay request types
//!
//! Requests are what the replay driver feeds through the transaction service.
//! They are already validated for shape (type, required fields) but not for
//! any business rule.

use super::account::OwnerId;

/// A single request read from the requests file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Spend `amount` from `account` on behalf of `owner`
    ///
    /// `label`, when present, is bound to the generated correlation id so
    /// later rows can reference the debit.
    Debit {
        owner: OwnerId,
        account: String,
        amount: u64,
        label: Option<String>,
    },

    /// Reverse the debit identified by `reference`
    ///
    /// `reference` is a label of an earlier debit or a raw correlation id.
    Reverse {
        account: String,
        amount: u64,
        reference: String,
    },

    /// Look up the record identified by `reference`
    Query { reference: String },
}

impl Request {
    /// Account number used for partitioning, if the request targets one
    pub fn account(&self) -> Option<&str> {
        match self {
            Request::Debit { account, .. } | Request::Reverse { account, .. } => Some(account),
            Request::Query { .. } => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Request::Debit { .. } => "debit",
            Request::Reverse { .. } => "reverse",
            Request::Query { .. } => "query",
        }
    }
}

/// One row of the accounts file: an owner and the opening balance of one
/// of their accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSeed {
    pub owner: OwnerId,
    pub name: String,
    pub balance: u64,
}
