//! Thread-safe in-memory ledger
//!
//! `MemoryLedger` is an append-only [`LedgerStore`]. Records are keyed by
//! their assigned id, and a secondary index maps each correlation id to the
//! ids of the records in its chain.

use crate::core::traits::LedgerStore;
use crate::types::{CorrelationId, LedgerEntry, StoreError, TransactionId, TransactionRecord};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Append-only in-memory transaction log
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: DashMap<TransactionId, TransactionRecord>,

    /// Record ids per correlation id
    chains: DashMap<CorrelationId, Vec<TransactionId>>,

    next_id: AtomicU64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, ordered by id
    pub fn records(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<TransactionRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn chain_ids(&self, correlation_id: &CorrelationId) -> Vec<TransactionId> {
        let mut ids = self
            .chains
            .get(correlation_id)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }
}

impl LedgerStore for MemoryLedger {
    fn find_by_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self
            .chain_ids(correlation_id)
            .first()
            .and_then(|id| self.records.get(id))
            .map(|record| record.value().clone()))
    }

    fn history(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self
            .chain_ids(correlation_id)
            .iter()
            .filter_map(|id| self.records.get(id).map(|record| record.value().clone()))
            .collect())
    }

    fn append(&self, entry: LedgerEntry) -> Result<TransactionRecord, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = entry.into_record(id);

        // Record first, so every id reachable through a chain resolves.
        self.records.insert(id, record.clone());
        self.chains
            .entry(record.correlation_id.clone())
            .or_default()
            .push(id);

        Ok(record)
    }
}
