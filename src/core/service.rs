//! Transaction service: the operation boundary of the core
//!
//! `TransactionService` is what callers use. Debits and reversals run inside
//! [`RequestGate::guarded`] on the account's lock; when the processor rejects
//! a request, the failure is recorded before the lock is released, so the
//! audit record's balance snapshot cannot race with another writer.
//!
//! Requests that never got past the lock (`AccountBusy`, `LockUnavailable`)
//! leave no audit record.

use super::gate::RequestGate;
use super::processor::TransactionProcessor;
use super::recorder::FailureRecorder;
use crate::types::{CorrelationId, ErrorKind, OwnerId, ProcessingError, TransactionRecord};
use tracing::{debug, error, Level};

#[derive(Debug, Clone)]
pub struct TransactionService {
    gate: RequestGate,
    processor: TransactionProcessor,
    recorder: FailureRecorder,
}

impl TransactionService {
    pub fn new(gate: RequestGate, processor: TransactionProcessor, recorder: FailureRecorder) -> Self {
        Self {
            gate,
            processor,
            recorder,
        }
    }

    pub fn processor(&self) -> &TransactionProcessor {
        &self.processor
    }

    pub fn recorder(&self) -> &FailureRecorder {
        &self.recorder
    }

    /// Spend `amount` from `account_number` on behalf of `owner_id`
    ///
    /// # Returns
    ///
    /// The successful DEBIT record. A rejected debit returns the business
    /// error after a FAILURE record has been appended.
    pub fn debit(
        &self,
        owner_id: OwnerId,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        self.gate.guarded(account_number, || {
            self.processor
                .debit(owner_id, account_number, amount)
                .inspect_err(|e| {
                    if e.business().is_some() {
                        self.audit(self.recorder.record_failed_debit(account_number, amount));
                    }
                })
        })
    }

    /// Reverse the debit identified by `correlation_id`
    ///
    /// # Returns
    ///
    /// The successful REVERSAL record, which shares the debit's correlation
    /// id. A rejected reversal returns the business error after a FAILURE
    /// record has been appended.
    pub fn reverse(
        &self,
        correlation_id: &CorrelationId,
        account_number: &str,
        amount: u64,
    ) -> Result<TransactionRecord, ProcessingError> {
        self.gate.guarded(account_number, || {
            self.processor
                .reverse(correlation_id, account_number, amount)
                .inspect_err(|e| {
                    if e.business().is_some() {
                        self.audit(self.recorder.record_failed_reversal(account_number, amount));
                    }
                })
        })
    }

    /// Look up a transaction by correlation id; no lock is taken
    pub fn query(&self, correlation_id: &CorrelationId) -> Result<TransactionRecord, ProcessingError> {
        self.processor.query(correlation_id)
    }

    /// Every record sharing `correlation_id`, oldest first; no lock is taken
    pub fn history(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<TransactionRecord>, ProcessingError> {
        self.processor.history(correlation_id)
    }

    /// A failing audit write must not replace the error being audited
    fn audit(&self, result: Result<TransactionRecord, ProcessingError>) {
        if let Err(e) = result {
            if audit_failure_level(&e) == Level::DEBUG {
                debug!(reason = %e, "rejected request not recorded");
            } else {
                error!(reason = %e, "failed to record rejected request");
            }
        }
    }
}

/// An unknown account number has nothing to record against; only a store or
/// lock failure is an error.
fn audit_failure_level(error: &ProcessingError) -> Level {
    match error.kind() {
        Some(ErrorKind::AccountNotFound) => Level::DEBUG,
        _ => Level::ERROR,
    }
}
