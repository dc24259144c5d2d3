//! Audit records for rejected requests
//!
//! `FailureRecorder` appends a FAILURE record carrying the account's current,
//! unmodified balance. The record gets a fresh correlation id: it is never
//! linked to the chain of the transaction the request referenced.
//!
//! The recorder takes no lock. [`TransactionService`](super::TransactionService)
//! calls it while still holding the account's lock; direct callers get no
//! such guarantee, and the recorded balance may be stale by the time it is
//! written.

use super::clock::SystemClock;
use super::traits::{AccountStore, Clock, LedgerStore};
use crate::types::{
    BusinessError, CorrelationId, LedgerEntry, ProcessingError, TransactionKind,
    TransactionOutcome, TransactionRecord,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct FailureRecorder {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for FailureRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureRecorder").finish_non_exhaustive()
    }
}

impl FailureRecorder {
    pub fn new(accounts: Arc<dyn AccountStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            accounts,
            ledger,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn record_failed_debit(
        &self,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        self.record(TransactionKind::Debit, account_number, amount)
    }

    pub fn record_failed_reversal(
        &self,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        self.record(TransactionKind::Reversal, account_number, amount)
    }

    fn record(
        &self,
        kind: TransactionKind,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        let account = self
            .accounts
            .find_by_number(account_number)?
            .ok_or_else(|| BusinessError::account_not_found(account_number))?;

        let entry = LedgerEntry::for_account(
            &account,
            kind,
            TransactionOutcome::Failure,
            amount,
            CorrelationId::generate(),
            self.clock.now(),
        );
        let record = self.ledger.append(entry)?;

        debug!(
            account = account_number,
            amount,
            transaction = %record.correlation_id,
            "recorded failed {kind}"
        );
        Ok(record)
    }
}
