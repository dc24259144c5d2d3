//! In-memory implementations of the collaborator traits
//!
//! These back the replay driver and the test suites. They use `DashMap` for
//! fine-grained, per-entry locking:
//!
//! - **MemoryAccountStore**: owners and accounts
//! - **MemoryLedger**: append-only transaction records
//! - **MemoryLockService**: TTL leases standing in for a shared lock server

pub mod account_store;
pub mod ledger;
pub mod lock_service;

pub use account_store::MemoryAccountStore;
pub use ledger::MemoryLedger;
pub use lock_service::MemoryLockService;
