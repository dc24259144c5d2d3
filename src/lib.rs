//! Balance Guard Library
//! # Overview
//!
//! This library provides the concurrency-safe core of an account ledger:
//! debits and reversals against a single account number run one at a time
//! under a time-bounded distributed lock, and every attempt, accepted or
//! rejected, leaves an append-only ledger record.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, TransactionRecord, errors)
//! - [`core`] - Business logic components:
//!   - [`core::lock`] - Scoped locks over an injected shared lock service
//!   - [`core::gate`] - Runs an operation while holding its account's lock
//!   - [`core::processor`] - Debit and reversal rules
//!   - [`core::recorder`] - FAILURE records for rejected requests
//!   - [`core::service`] - The guarded operation boundary
//!   - [`core::accounts`] - Account lifecycle
//!   - [`core::memory`] - In-memory collaborators
//! - [`io`] - CSV inputs and reports
//! - [`strategy`] - Replay pipelines (sync and partitioned async)
//! - [`cli`] - CLI arguments parsing
//!
//! # Operations
//!
//! - **Debit**: spend from an account; checks ownership, status, balance and
//!   amount bounds (100 to 100 000)
//! - **Reverse**: cancel a debit of the last year by its correlation id and
//!   exact amount
//! - **Query**: look up a transaction by correlation id
//!
//! # Example
//!
//! ```
//! use balance_guard::core::memory::{MemoryAccountStore, MemoryLedger, MemoryLockService};
//! use balance_guard::core::{
//!     AccountStore, FailureRecorder, LockConfig, LockCoordinator, RequestGate,
//!     TransactionProcessor, TransactionService,
//! };
//! use balance_guard::types::AccountOwner;
//! use chrono::Utc;
//! use std::sync::Arc;
//!
//! let accounts = Arc::new(MemoryAccountStore::new());
//! let ledger = Arc::new(MemoryLedger::new());
//! accounts.insert_owner(AccountOwner::new(1, "kim"));
//! let account = accounts.create_account(1, 100_000, Utc::now()).unwrap();
//!
//! let gate = RequestGate::new(LockCoordinator::new(
//!     Arc::new(MemoryLockService::new()),
//!     LockConfig::default(),
//! ));
//! let service = TransactionService::new(
//!     gate,
//!     TransactionProcessor::new(accounts.clone(), ledger.clone()),
//!     FailureRecorder::new(accounts.clone(), ledger.clone()),
//! );
//!
//! let record = service.debit(1, &account.number, 99_999).unwrap();
//! assert_eq!(record.balance_after, 1);
//! ```

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{AccountService, TransactionService};
pub use io::{write_accounts_csv, write_ledger_csv};
pub use types::{
    Account, BusinessError, CorrelationId, ErrorKind, ProcessingError, TransactionRecord,
};
