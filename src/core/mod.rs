//! Core business logic module
//!
//! This module contains the transaction core:
//! - `traits` - Collaborator interfaces (account store, ledger, shared lock, clock)
//! - `lock` - Scoped, time-bounded locks over a shared lock service
//! - `gate` - Lock-guarded execution of account operations
//! - `processor` - Debit and reversal rules
//! - `recorder` - Audit records for rejected requests
//! - `service` - The operation boundary combining the three above
//! - `accounts` - Account lifecycle
//! - `memory` - In-memory collaborator implementations

pub mod accounts;
pub mod clock;
pub mod gate;
pub mod lock;
pub mod memory;
pub mod processor;
pub mod recorder;
pub mod service;
pub mod traits;

pub use accounts::AccountService;
pub use clock::{FixedClock, SystemClock};
pub use gate::RequestGate;
pub use lock::{LockConfig, LockCoordinator, LockGuard};
pub use processor::{ReversalMode, TransactionPolicy, TransactionProcessor};
pub use recorder::FailureRecorder;
pub use service::TransactionService;
pub use traits::{AccountStore, Clock, LedgerStore, SharedLock};
