//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account and owner types
//! - `transaction`: Ledger records, correlation ids
//! - `request`: Replay requests and account seeds
//! - `error`: Error types for the transaction core

pub mod account;
pub mod error;
pub mod request;
pub mod transaction;

pub use account::{
    Account, AccountId, AccountOwner, AccountStatus, OwnerId, FIRST_ACCOUNT_NUMBER,
    MAX_ACCOUNTS_PER_OWNER,
};
pub use error::{
    BusinessError, ErrorCategory, ErrorKind, LockError, LockServiceError, ProcessingError,
    StoreError,
};
pub use request::{AccountSeed, Request};
pub use transaction::{
    CorrelationId, LedgerEntry, TransactionId, TransactionKind, TransactionOutcome,
    TransactionRecord,
};
