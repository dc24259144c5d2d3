//! Shared replay state: the in-memory backend, the services and the labels
//!
//! A `ReplayContext` is built once per run and shared by every worker. It
//! owns the in-memory collaborators, wires them into an
//! [`AccountService`] and a [`TransactionService`], and keeps the map from
//! request labels to the correlation ids generated by labelled debits.

use crate::cli::ReportKind;
use crate::core::memory::{MemoryAccountStore, MemoryLedger, MemoryLockService};
use crate::core::{
    AccountService, AccountStore, Clock, FailureRecorder, LockCoordinator, RequestGate,
    SystemClock, TransactionProcessor, TransactionService,
};
use crate::io::{write_accounts_csv, write_ledger_csv, SeedReader};
use crate::strategy::ReplayConfig;
use crate::types::{
    Account, AccountOwner, AccountSeed, CorrelationId, ProcessingError, Request, TransactionRecord,
};
use dashmap::DashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ReplayContext {
    accounts: Arc<MemoryAccountStore>,
    ledger: Arc<MemoryLedger>,
    account_service: AccountService,
    transactions: TransactionService,

    /// Correlation ids of labelled debits, by label
    labels: DashMap<String, CorrelationId>,

    report: ReportKind,
}

impl ReplayContext {
    pub fn new(config: &ReplayConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &ReplayConfig, clock: Arc<dyn Clock>) -> Self {
        let accounts = Arc::new(MemoryAccountStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let gate = RequestGate::new(LockCoordinator::new(
            Arc::new(MemoryLockService::new()),
            config.lock.clone(),
        ));

        let processor = TransactionProcessor::new(accounts.clone(), ledger.clone())
            .with_clock(clock.clone())
            .with_policy(config.policy.clone());
        let recorder =
            FailureRecorder::new(accounts.clone(), ledger.clone()).with_clock(clock.clone());

        Self {
            account_service: AccountService::new(gate.clone(), accounts.clone()).with_clock(clock),
            transactions: TransactionService::new(gate, processor, recorder),
            accounts,
            ledger,
            labels: DashMap::new(),
            report: config.report,
        }
    }

    pub fn transactions(&self) -> &TransactionService {
        &self.transactions
    }

    pub fn account_service(&self) -> &AccountService {
        &self.account_service
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.all_accounts()
    }

    pub fn ledger(&self) -> Vec<TransactionRecord> {
        self.ledger.records()
    }

    /// Open one account per row of the accounts file
    ///
    /// Rows that fail to parse or to open an account are logged and skipped.
    ///
    /// # Returns
    ///
    /// The number of accounts opened, or an error if the file cannot be read.
    pub fn seed_from_file(&self, path: &Path) -> Result<usize, String> {
        let mut opened = 0;
        for result in SeedReader::open(path)? {
            match result.and_then(|seed| self.seed(seed).map_err(|e| e.to_string())) {
                Ok(_) => opened += 1,
                Err(e) => warn!(reason = %e, "skipping account row"),
            }
        }
        Ok(opened)
    }

    /// Register the seed's owner if new, then open the account
    pub fn seed(&self, seed: AccountSeed) -> Result<Account, ProcessingError> {
        if self.accounts.find_owner(seed.owner)?.is_none() {
            self.accounts
                .insert_owner(AccountOwner::new(seed.owner, seed.name));
        }
        self.account_service.create_account(seed.owner, seed.balance)
    }

    /// Run one request through the transaction service
    pub fn apply(&self, request: &Request) -> Result<TransactionRecord, ProcessingError> {
        match request {
            Request::Debit {
                owner,
                account,
                amount,
                label,
            } => {
                let record = self.transactions.debit(*owner, account, *amount)?;
                if let Some(label) = label {
                    self.bind_label(label, &record.correlation_id);
                }
                Ok(record)
            }
            Request::Reverse {
                account,
                amount,
                reference,
            } => self
                .transactions
                .reverse(&self.resolve(reference), account, *amount),
            Request::Query { reference } => {
                let record = self.transactions.query(&self.resolve(reference))?;
                info!(
                    transaction = %record.correlation_id,
                    kind = %record.kind,
                    outcome = %record.outcome,
                    account = %record.account_number,
                    amount = record.amount,
                    "query"
                );
                Ok(record)
            }
        }
    }

    /// Apply a request, logging a rejection instead of returning it
    pub fn apply_logged(&self, request: &Request) {
        if let Err(e) = self.apply(request) {
            warn!(request = request.type_name(), reason = %e, "request rejected");
        }
    }

    /// Correlation id for a request reference: a known label, or the raw id
    pub fn resolve(&self, reference: &str) -> CorrelationId {
        self.labels
            .get(reference)
            .map(|id| id.value().clone())
            .unwrap_or_else(|| CorrelationId::from(reference))
    }

    /// Write the configured report
    pub fn write_report(&self, output: &mut dyn Write) -> Result<(), String> {
        match self.report {
            ReportKind::Ledger => write_ledger_csv(&self.ledger(), output),
            ReportKind::Accounts => write_accounts_csv(&self.accounts(), output),
        }
    }

    fn bind_label(&self, label: &str, correlation_id: &CorrelationId) {
        if let Some(previous) = self
            .labels
            .insert(label.to_string(), correlation_id.clone())
        {
            warn!(label, previous = %previous, "label rebound to a new transaction");
        }
    }
}
