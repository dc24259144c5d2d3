//! Transaction processing: the debit and reversal rule chains
//!
//! `TransactionProcessor` validates a request against the account and the
//! ledger, applies the balance mutation and appends the ledger record. It
//! does not lock anything itself: every call must run while the caller holds
//! the account's lock (see [`RequestGate`](super::RequestGate)), which is what
//! makes the read-validate-write-append sequence atomic.
//!
//! # Rule order
//!
//! Debit checks run in a fixed order so the reported error is deterministic:
//! owner, account, ownership, status, sufficiency, minimum amount, maximum
//! amount.
//!
//! Reversal checks: original transaction, account, transaction-account
//! match, amount match, recency.
//!
//! # Reversal balance semantics
//!
//! With [`ReversalMode::SnapshotOnly`] (the default) a reversal does not
//! credit the account: it records the balance as it stands, and any record
//! in the ledger can be targeted. With [`ReversalMode::RestoreBalance`] the
//! reversed amount is credited back before the snapshot, only a successful
//! debit can be targeted, and a chain can only be reversed once.

use super::traits::{AccountStore, Clock, LedgerStore};
use super::clock::SystemClock;
use crate::types::{
    Account, BusinessError, CorrelationId, LedgerEntry, OwnerId, ProcessingError, StoreError,
    TransactionKind, TransactionOutcome, TransactionRecord,
};
use chrono::{DateTime, Months, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// Smallest amount a single debit may move
pub const MIN_AMOUNT: u64 = 100;

/// Largest amount a single debit may move
pub const MAX_AMOUNT: u64 = 100_000;

/// How a successful reversal treats the account balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReversalMode {
    /// Record the current balance without crediting the reversed amount
    #[default]
    SnapshotOnly,
    /// Credit the reversed amount back, then record the new balance
    RestoreBalance,
}

/// Business limits applied by the processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPolicy {
    pub min_amount: u64,
    pub max_amount: u64,

    /// Reversals are refused for transactions older than this
    pub reversal_window_months: u32,

    pub reversal_mode: ReversalMode,
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self {
            min_amount: MIN_AMOUNT,
            max_amount: MAX_AMOUNT,
            reversal_window_months: 12,
            reversal_mode: ReversalMode::default(),
        }
    }
}

impl TransactionPolicy {
    /// Oldest transaction time still reversible at `now`
    pub fn reversal_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_months(Months::new(self.reversal_window_months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Applies debits and reversals to accounts and the ledger
#[derive(Clone)]
pub struct TransactionProcessor {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    policy: TransactionPolicy,
}

impl fmt::Debug for TransactionProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionProcessor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl TransactionProcessor {
    pub fn new(accounts: Arc<dyn AccountStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            accounts,
            ledger,
            clock: Arc::new(SystemClock),
            policy: TransactionPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: TransactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &TransactionPolicy {
        &self.policy
    }

    /// Spend `amount` from `account_number` on behalf of `owner_id`
    ///
    /// Must be called while holding the account's lock.
    pub fn debit(
        &self,
        owner_id: OwnerId,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        let result = self.apply_debit(owner_id, account_number, amount);
        Self::log_result("debit", account_number, amount, &result);
        result
    }

    /// Reverse the debit identified by `correlation_id`
    ///
    /// Must be called while holding the account's lock.
    pub fn reverse(
        &self,
        correlation_id: &CorrelationId,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        let result = self.apply_reversal(correlation_id, account_number, amount);
        Self::log_result("reversal", account_number, amount, &result);
        result
    }

    /// Look up the record that opened the chain of `correlation_id`
    pub fn query(&self, correlation_id: &CorrelationId) -> Result<TransactionRecord, ProcessingError> {
        self.ledger
            .find_by_correlation_id(correlation_id)?
            .ok_or_else(|| BusinessError::transaction_not_found(correlation_id).into())
    }

    /// Every record of the chain of `correlation_id`, oldest first
    pub fn history(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<TransactionRecord>, ProcessingError> {
        let records = self.ledger.history(correlation_id)?;
        if records.is_empty() {
            return Err(BusinessError::transaction_not_found(correlation_id).into());
        }
        Ok(records)
    }
}

/// Private API
impl TransactionProcessor {
    fn log_result(
        operation: &str,
        account: &str,
        amount: u64,
        result: &Result<TransactionRecord, ProcessingError>,
    ) {
        match result {
            Ok(record) => {
                info!(
                    account,
                    amount,
                    transaction = %record.correlation_id,
                    balance = record.balance_after,
                    "{operation} applied"
                );
            }
            Err(ProcessingError::Business(e)) => {
                info!(account, amount, reason = %e, "{operation} rejected");
            }
            Err(e) => {
                error!(account, amount, reason = %e, "{operation} failed");
            }
        }
    }

    fn load_account(&self, account_number: &str) -> Result<Account, ProcessingError> {
        self.accounts
            .find_by_number(account_number)?
            .ok_or_else(|| BusinessError::account_not_found(account_number).into())
    }

    /// Apply a debit:
    /// - Resolve owner and account
    /// - Check ownership, status, sufficiency, then amount bounds
    /// - Decrement the balance and append a successful DEBIT record
    fn apply_debit(
        &self,
        owner_id: OwnerId,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        let owner = self
            .accounts
            .find_owner(owner_id)?
            .ok_or(BusinessError::OwnerNotFound { owner: owner_id })?;
        let account = self.load_account(account_number)?;

        self.validate_debit(owner.id, &account, amount)?;

        let mut updated = account.clone();
        updated.balance = account.balance - amount;

        let entry = LedgerEntry::for_account(
            &updated,
            TransactionKind::Debit,
            TransactionOutcome::Success,
            amount,
            CorrelationId::generate(),
            self.clock.now(),
        );
        self.commit(&account, &updated, entry)
    }

    fn validate_debit(
        &self,
        owner_id: OwnerId,
        account: &Account,
        amount: u64,
    ) -> Result<(), BusinessError> {
        if !account.is_owned_by(owner_id) {
            return Err(BusinessError::OwnershipMismatch {
                account: account.number.clone(),
                owner: owner_id,
                expected: account.owner_id,
            });
        }

        if !account.is_active() {
            return Err(BusinessError::account_closed(&account.number));
        }

        if account.balance < amount {
            return Err(BusinessError::InsufficientBalance {
                account: account.number.clone(),
                balance: account.balance,
                requested: amount,
            });
        }

        if amount < self.policy.min_amount {
            return Err(BusinessError::AmountTooSmall {
                amount,
                min: self.policy.min_amount,
            });
        }

        if amount > self.policy.max_amount {
            return Err(BusinessError::AmountTooLarge {
                amount,
                max: self.policy.max_amount,
            });
        }

        Ok(())
    }

    /// Apply a reversal:
    /// - Resolve the original record and the account
    /// - Check account identity, amount and recency
    /// - Append a successful REVERSAL record sharing the original's
    ///   correlation id (crediting the balance first in restore mode)
    fn apply_reversal(
        &self,
        correlation_id: &CorrelationId,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        let original = self
            .ledger
            .find_by_correlation_id(correlation_id)?
            .ok_or_else(|| BusinessError::transaction_not_found(correlation_id))?;
        let account = self.load_account(account_number)?;

        let now = self.clock.now();
        self.validate_reversal(&original, &account, amount, now)?;

        match self.policy.reversal_mode {
            ReversalMode::SnapshotOnly => {
                let entry = LedgerEntry::for_account(
                    &account,
                    TransactionKind::Reversal,
                    TransactionOutcome::Success,
                    amount,
                    original.correlation_id,
                    now,
                );
                Ok(self.ledger.append(entry)?)
            }
            ReversalMode::RestoreBalance => {
                self.validate_restorable(&original, &account)?;

                let mut updated = account.clone();
                updated.balance = account.balance.checked_add(amount).ok_or_else(|| {
                    StoreError::integrity(format!(
                        "balance overflow restoring {} on account {}",
                        amount, account.number
                    ))
                })?;

                let entry = LedgerEntry::for_account(
                    &updated,
                    TransactionKind::Reversal,
                    TransactionOutcome::Success,
                    amount,
                    original.correlation_id,
                    now,
                );
                self.commit(&account, &updated, entry)
            }
        }
    }

    fn validate_reversal(
        &self,
        original: &TransactionRecord,
        account: &Account,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<(), BusinessError> {
        if original.account_id != account.id {
            return Err(BusinessError::TransactionAccountMismatch {
                transaction: original.correlation_id.clone(),
                account: account.number.clone(),
            });
        }

        if original.amount != amount {
            return Err(BusinessError::AmountMismatch {
                transaction: original.correlation_id.clone(),
                expected: original.amount,
                requested: amount,
            });
        }

        if original.transacted_at < self.policy.reversal_cutoff(now) {
            return Err(BusinessError::TransactionTooOld {
                transaction: original.correlation_id.clone(),
                transacted_at: original.transacted_at,
            });
        }

        Ok(())
    }

    /// Extra checks when a reversal moves money back into the account
    fn validate_restorable(
        &self,
        original: &TransactionRecord,
        account: &Account,
    ) -> Result<(), ProcessingError> {
        // Crediting back anything but a successful debit would create money.
        if !original.is_reversible_debit() {
            return Err(BusinessError::NotReversible {
                transaction: original.correlation_id.clone(),
            }
            .into());
        }

        if !account.is_active() {
            return Err(BusinessError::account_closed(&account.number).into());
        }

        let already_reversed = self
            .ledger
            .history(&original.correlation_id)?
            .iter()
            .any(|record| record.kind == TransactionKind::Reversal && record.is_success());
        if already_reversed {
            return Err(BusinessError::AlreadyReversed {
                transaction: original.correlation_id.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Persist `updated` and append `entry` as one unit
    ///
    /// If the append fails, the previous account state is written back
    /// before the storage error is returned.
    fn commit(
        &self,
        previous: &Account,
        updated: &Account,
        entry: LedgerEntry,
    ) -> Result<TransactionRecord, ProcessingError> {
        self.accounts.save(updated)?;

        match self.ledger.append(entry) {
            Ok(record) => Ok(record),
            Err(e) => {
                if let Err(rollback) = self.accounts.save(previous) {
                    error!(
                        account = %previous.number,
                        reason = %rollback,
                        "failed to roll back balance after ledger append failure"
                    );
                }
                Err(e.into())
            }
        }
    }
}
