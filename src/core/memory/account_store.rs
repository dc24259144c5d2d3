//! Thread-safe in-memory account store
//!
//! This module provides the `MemoryAccountStore` struct, an [`AccountStore`]
//! backed by `DashMap`. It is the backend of the replay driver and of the
//! test suites.
//!
//! # Thread Safety
//!
//! All operations are thread-safe. Note that the store only guarantees
//! per-call atomicity: a read followed by a `save` is *not* atomic on its
//! own. Serializing read-validate-write sequences on one account is the job
//! of the request gate's lock.

use crate::core::traits::AccountStore;
use crate::types::account::account_number_for;
use crate::types::{Account, AccountOwner, AccountStatus, OwnerId, StoreError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory owners and accounts
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    owners: DashMap<OwnerId, AccountOwner>,

    /// Accounts by account number
    accounts: DashMap<String, Account>,

    /// Last assigned account sequence number; ids and numbers derive from it
    sequence: AtomicU64,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or rename) an owner
    pub fn insert_owner(&self, owner: AccountOwner) {
        self.owners.insert(owner.id, owner);
    }

    /// Snapshot of every account, ordered by account number
    pub fn all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }
}

impl AccountStore for MemoryAccountStore {
    fn find_owner(&self, owner_id: OwnerId) -> Result<Option<AccountOwner>, StoreError> {
        Ok(self.owners.get(&owner_id).map(|owner| owner.value().clone()))
    }

    fn find_by_number(&self, number: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(number).map(|account| account.value().clone()))
    }

    fn save(&self, account: &Account) -> Result<(), StoreError> {
        match self.accounts.get_mut(&account.number) {
            Some(mut stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(StoreError::integrity(format!(
                "cannot save unknown account {}",
                account.number
            ))),
        }
    }

    fn create_account(
        &self,
        owner_id: OwnerId,
        initial_balance: u64,
        registered_at: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let account = Account {
            id: sequence,
            owner_id,
            number: account_number_for(sequence),
            status: AccountStatus::Active,
            balance: initial_balance,
            registered_at,
            closed_at: None,
        };

        self.accounts.insert(account.number.clone(), account.clone());
        Ok(account)
    }

    fn count_by_owner(&self, owner_id: OwnerId) -> Result<usize, StoreError> {
        Ok(self
            .accounts
            .iter()
            .filter(|entry| entry.value().owner_id == owner_id)
            .count())
    }

    fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| entry.value().owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }
}
