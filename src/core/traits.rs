//! Collaborator traits for account storage, the ledger and the shared lock
//!
//! The transaction core never talks to a concrete storage engine or lock
//! service. It is handed implementations of these traits at construction,
//! which lets tests swap in doubles and lets several independent lock
//! namespaces coexist in one process.
//!
//! All traits are synchronous and `Send + Sync`: a single instance is shared
//! by every worker through an `Arc`.

use crate::types::{
    Account, AccountOwner, CorrelationId, LedgerEntry, LockServiceError, OwnerId, StoreError,
    TransactionRecord,
};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Read/write access to accounts and their owners
pub trait AccountStore: Send + Sync {
    /// Look up an owner by id
    fn find_owner(&self, owner_id: OwnerId) -> Result<Option<AccountOwner>, StoreError>;

    /// Look up an account by its number
    fn find_by_number(&self, number: &str) -> Result<Option<Account>, StoreError>;

    /// Persist the state of an existing account
    fn save(&self, account: &Account) -> Result<(), StoreError>;

    /// Create a new ACTIVE account for `owner_id`
    ///
    /// The store assigns the numeric id and the account number. Numbers are
    /// unique and increase monotonically from
    /// [`FIRST_ACCOUNT_NUMBER`](crate::types::FIRST_ACCOUNT_NUMBER).
    fn create_account(
        &self,
        owner_id: OwnerId,
        initial_balance: u64,
        registered_at: DateTime<Utc>,
    ) -> Result<Account, StoreError>;

    /// Number of accounts (any status) held by `owner_id`
    fn count_by_owner(&self, owner_id: OwnerId) -> Result<usize, StoreError>;

    /// All accounts held by `owner_id`, ordered by account number
    fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Account>, StoreError>;
}

/// Append-only store of transaction records
pub trait LedgerStore: Send + Sync {
    /// The earliest record carrying `correlation_id`, i.e. the one that
    /// opened the chain
    fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Option<TransactionRecord>, StoreError>;

    /// Every record carrying `correlation_id`, in append order
    fn history(&self, correlation_id: &CorrelationId)
        -> Result<Vec<TransactionRecord>, StoreError>;

    /// Append an entry, returning it with its assigned id
    fn append(&self, entry: LedgerEntry) -> Result<TransactionRecord, StoreError>;
}

/// Cross-process, TTL-based mutual exclusion service
///
/// `token` identifies the holder. A lease is only released by the token that
/// took it, so a holder whose lease expired cannot release the lock out from
/// under the next holder.
pub trait SharedLock: Send + Sync {
    /// Try to take `key` for `token`, waiting up to `wait`
    ///
    /// Returns `Ok(true)` once the lease is held; it then expires on its own
    /// after `hold`. Returns `Ok(false)` if the key stayed taken for the
    /// whole wait. Returns `Err` only when the service itself failed.
    fn try_acquire(
        &self,
        key: &str,
        token: &str,
        wait: Duration,
        hold: Duration,
    ) -> Result<bool, LockServiceError>;

    /// Release `key` if `token` holds it
    ///
    /// Returns `Ok(true)` if a live lease owned by `token` was removed and
    /// `Ok(false)` if there was nothing to release.
    fn release(&self, key: &str, token: &str) -> Result<bool, LockServiceError>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
