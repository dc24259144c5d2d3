//! Error types for the transaction core
//!
//! Errors are split the same way callers need to react to them:
//!
//! - **Business errors** ([`BusinessError`]): a lookup failed or a policy rule
//!   rejected the request. Expected outcomes; the caller writes an audit
//!   record for them.
//! - **Concurrency errors** ([`ProcessingError::AccountBusy`]): the account's
//!   lock could not be obtained in time. The caller may retry.
//! - **Infrastructure errors** ([`StoreError`], [`LockServiceError`]): a
//!   collaborator is unreachable. Fatal for the request, never confused with
//!   contention.

use super::account::OwnerId;
use super::transaction::CorrelationId;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Broad family of a business error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Something the request referenced does not exist
    Lookup,
    /// The request exists but a business rule rejects it
    Policy,
}

/// Machine-readable code of a business error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OwnerNotFound,
    AccountNotFound,
    TransactionNotFound,
    OwnershipMismatch,
    AccountClosed,
    InsufficientBalance,
    AmountTooSmall,
    AmountTooLarge,
    TransactionAccountMismatch,
    AmountMismatch,
    TransactionTooOld,
    AlreadyReversed,
    NotReversible,
    TooManyAccounts,
    AccountHasBalance,
}

impl ErrorKind {
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorKind::OwnerNotFound
            | ErrorKind::AccountNotFound
            | ErrorKind::TransactionNotFound => ErrorCategory::Lookup,
            _ => ErrorCategory::Policy,
        }
    }

    /// Short human-readable description of the code
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::OwnerNotFound => "owner does not exist",
            ErrorKind::AccountNotFound => "account does not exist",
            ErrorKind::TransactionNotFound => "no transaction with this id",
            ErrorKind::OwnershipMismatch => "account belongs to another owner",
            ErrorKind::AccountClosed => "account is closed",
            ErrorKind::InsufficientBalance => "balance is lower than the amount",
            ErrorKind::AmountTooSmall => "amount is below the minimum",
            ErrorKind::AmountTooLarge => "amount is above the maximum",
            ErrorKind::TransactionAccountMismatch => "transaction belongs to another account",
            ErrorKind::AmountMismatch => "amount differs from the original transaction",
            ErrorKind::TransactionTooOld => "transaction is too old to reverse",
            ErrorKind::AlreadyReversed => "transaction was already reversed",
            ErrorKind::NotReversible => "only a successful debit can be credited back",
            ErrorKind::TooManyAccounts => "owner holds the maximum number of accounts",
            ErrorKind::AccountHasBalance => "account still holds a balance",
        }
    }
}

/// Business rule or lookup failure
///
/// Returned before any mutation happens: an operation failing with a
/// `BusinessError` has left both the account and the ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusinessError {
    #[error("owner {owner} not found")]
    OwnerNotFound { owner: OwnerId },

    #[error("account {account} not found")]
    AccountNotFound { account: String },

    #[error("transaction {transaction} not found")]
    TransactionNotFound { transaction: CorrelationId },

    /// The requesting owner is not the account's owner
    #[error("account {account} is owned by {expected}, not by {owner}")]
    OwnershipMismatch {
        account: String,
        owner: OwnerId,
        expected: OwnerId,
    },

    #[error("account {account} is closed")]
    AccountClosed { account: String },

    #[error("insufficient balance on account {account}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        account: String,
        balance: u64,
        requested: u64,
    },

    #[error("amount {amount} is below the minimum of {min}")]
    AmountTooSmall { amount: u64, min: u64 },

    #[error("amount {amount} is above the maximum of {max}")]
    AmountTooLarge { amount: u64, max: u64 },

    /// The transaction being reversed was made on another account
    #[error("transaction {transaction} does not belong to account {account}")]
    TransactionAccountMismatch {
        transaction: CorrelationId,
        account: String,
    },

    #[error("reversal of {transaction} requested {requested}, original amount was {expected}")]
    AmountMismatch {
        transaction: CorrelationId,
        expected: u64,
        requested: u64,
    },

    #[error("transaction {transaction} made at {transacted_at} is too old to reverse")]
    TransactionTooOld {
        transaction: CorrelationId,
        transacted_at: DateTime<Utc>,
    },

    /// Only raised when reversals restore the balance
    #[error("transaction {transaction} was already reversed")]
    AlreadyReversed { transaction: CorrelationId },

    /// Only raised when reversals restore the balance
    #[error("transaction {transaction} is not a successful debit and cannot be credited back")]
    NotReversible { transaction: CorrelationId },

    #[error("owner {owner} already holds {max} accounts")]
    TooManyAccounts { owner: OwnerId, max: usize },

    #[error("account {account} still holds a balance of {balance}")]
    AccountHasBalance { account: String, balance: u64 },
}

impl BusinessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BusinessError::OwnerNotFound { .. } => ErrorKind::OwnerNotFound,
            BusinessError::AccountNotFound { .. } => ErrorKind::AccountNotFound,
            BusinessError::TransactionNotFound { .. } => ErrorKind::TransactionNotFound,
            BusinessError::OwnershipMismatch { .. } => ErrorKind::OwnershipMismatch,
            BusinessError::AccountClosed { .. } => ErrorKind::AccountClosed,
            BusinessError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            BusinessError::AmountTooSmall { .. } => ErrorKind::AmountTooSmall,
            BusinessError::AmountTooLarge { .. } => ErrorKind::AmountTooLarge,
            BusinessError::TransactionAccountMismatch { .. } => {
                ErrorKind::TransactionAccountMismatch
            }
            BusinessError::AmountMismatch { .. } => ErrorKind::AmountMismatch,
            BusinessError::TransactionTooOld { .. } => ErrorKind::TransactionTooOld,
            BusinessError::AlreadyReversed { .. } => ErrorKind::AlreadyReversed,
            BusinessError::NotReversible { .. } => ErrorKind::NotReversible,
            BusinessError::TooManyAccounts { .. } => ErrorKind::TooManyAccounts,
            BusinessError::AccountHasBalance { .. } => ErrorKind::AccountHasBalance,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind().category()
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: &str) -> Self {
        BusinessError::AccountNotFound {
            account: account.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(transaction: &CorrelationId) -> Self {
        BusinessError::TransactionNotFound {
            transaction: transaction.clone(),
        }
    }

    /// Create an AccountClosed error
    pub fn account_closed(account: &str) -> Self {
        BusinessError::AccountClosed {
            account: account.to_string(),
        }
    }
}

/// A repository could not complete a read or write
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    /// The stored data violates an invariant (e.g. balance overflow)
    #[error("storage integrity violation: {message}")]
    Integrity { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        StoreError::Integrity {
            message: message.into(),
        }
    }
}

/// The shared lock service could not be reached
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lock service unreachable: {message}")]
pub struct LockServiceError {
    pub message: String,
}

impl LockServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure to acquire a named lock
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Another holder kept the lock for the whole wait timeout
    #[error("timed out after {waited:?} waiting for lock {key}")]
    Timeout { key: String, waited: Duration },

    /// The lock service failed; nothing is known about the lock's state
    #[error("lock {key} unavailable: {message}")]
    Unavailable { key: String, message: String },
}

/// Top-level error of a guarded operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Business(#[from] BusinessError),

    /// The account is locked by a concurrent request
    #[error("account {account} is busy with another transaction")]
    AccountBusy { account: String },

    /// The lock service failed while locking `account`
    #[error("lock for account {account} unavailable: {message}")]
    LockUnavailable { account: String, message: String },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ProcessingError {
    /// The business error, if that is what this is
    pub fn business(&self) -> Option<&BusinessError> {
        match self {
            ProcessingError::Business(e) => Some(e),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.business().map(BusinessError::kind)
    }

    /// Only contention is worth retrying; the core never retries by itself
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessingError::AccountBusy { .. })
    }

    /// Translate a lock failure for `account` into a processing error
    ///
    /// Both variants name the account, not the lock key.
    pub fn from_lock(account: &str, error: LockError) -> Self {
        let account = account.to_string();
        match error {
            LockError::Timeout { .. } => ProcessingError::AccountBusy { account },
            LockError::Unavailable { message, .. } => {
                ProcessingError::LockUnavailable { account, message }
            }
        }
    }
}
