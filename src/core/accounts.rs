//! Account lifecycle: opening, closing and listing accounts
//!
//! Creation is guarded on the owner (`owner:<id>`) so two concurrent
//! creations cannot both pass the per-owner limit. Closing is guarded on the
//! account number, the same lock debits and reversals take.

use super::clock::SystemClock;
use super::gate::RequestGate;
use super::traits::{AccountStore, Clock};
use crate::types::{
    Account, AccountOwner, BusinessError, OwnerId, ProcessingError, MAX_ACCOUNTS_PER_OWNER,
};
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AccountService {
    gate: RequestGate,
    accounts: Arc<dyn AccountStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(gate: RequestGate, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            gate,
            accounts,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Open a new ACTIVE account for `owner_id`
    ///
    /// # Errors
    ///
    /// `OwnerNotFound` for an unknown owner, `TooManyAccounts` once the
    /// owner holds the maximum number of accounts.
    pub fn create_account(
        &self,
        owner_id: OwnerId,
        initial_balance: u64,
    ) -> Result<Account, ProcessingError> {
        self.gate.guarded_key(&owner_lock_name(owner_id), || {
            let owner = self.find_owner(owner_id)?;

            if self.accounts.count_by_owner(owner.id)? >= MAX_ACCOUNTS_PER_OWNER {
                return Err(BusinessError::TooManyAccounts {
                    owner: owner.id,
                    max: MAX_ACCOUNTS_PER_OWNER,
                }
                .into());
            }

            let account = self
                .accounts
                .create_account(owner.id, initial_balance, self.clock.now())?;
            info!(account = %account.number, owner = owner.id, "account opened");
            Ok(account)
        })
    }

    /// Close an empty account of `owner_id`
    ///
    /// Checks run in order: owner, account, ownership, status, balance.
    pub fn close_account(
        &self,
        owner_id: OwnerId,
        account_number: &str,
    ) -> Result<Account, ProcessingError> {
        self.gate.guarded(account_number, || {
            let owner = self.find_owner(owner_id)?;
            let mut account = self
                .accounts
                .find_by_number(account_number)?
                .ok_or_else(|| BusinessError::account_not_found(account_number))?;

            if !account.is_owned_by(owner.id) {
                return Err(BusinessError::OwnershipMismatch {
                    account: account.number,
                    owner: owner.id,
                    expected: account.owner_id,
                }
                .into());
            }
            if !account.is_active() {
                return Err(BusinessError::account_closed(&account.number).into());
            }
            if account.balance > 0 {
                return Err(BusinessError::AccountHasBalance {
                    account: account.number,
                    balance: account.balance,
                }
                .into());
            }

            account.close(self.clock.now());
            self.accounts.save(&account)?;
            info!(account = %account.number, owner = owner.id, "account closed");
            Ok(account)
        })
    }

    /// Every account of `owner_id`, closed ones included
    pub fn list_accounts(&self, owner_id: OwnerId) -> Result<Vec<Account>, ProcessingError> {
        let owner = self.find_owner(owner_id)?;
        Ok(self.accounts.list_by_owner(owner.id)?)
    }

    fn find_owner(&self, owner_id: OwnerId) -> Result<AccountOwner, ProcessingError> {
        self.accounts
            .find_owner(owner_id)?
            .ok_or_else(|| BusinessError::OwnerNotFound { owner: owner_id }.into())
    }
}

fn owner_lock_name(owner_id: OwnerId) -> String {
    format!("owner:{}", owner_id)
}
