//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines:
//! seeding accounts, applying the request file through the transaction
//! service and writing the report. Different execution models (single
//! thread in file order, partitioned on a worker pool) can be selected at
//! runtime.

use crate::cli::{ReportKind, StrategyType};
use crate::core::{LockConfig, TransactionPolicy};
use std::io::Write;
use std::path::Path;
use tracing::warn;

pub mod r#async;
pub mod context;
pub mod sync;

pub use self::r#async::AsyncReplayStrategy;
pub use context::ReplayContext;
pub use sync::SyncReplayStrategy;

/// Replay strategy trait
pub trait ReplayStrategy: Send + Sync {
    /// Replay `requests_path` against the accounts of `accounts_path`
    ///
    /// # Arguments
    ///
    /// * `accounts_path` - CSV file of accounts to open before replaying
    /// * `requests_path` - CSV file of requests to replay
    /// * `output` - Writer receiving the report
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the replay completed, even if some requests were rejected
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error)
    ///
    /// Malformed rows and rejected requests are logged and skipped.
    fn replay(
        &self,
        accounts_path: &Path,
        requests_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), String>;
}

/// Everything a replay run can be tuned with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Partitions processed at the same time (async strategy only)
    pub max_concurrent: usize,
    pub lock: LockConfig,
    pub policy: TransactionPolicy,
    pub report: ReportKind,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_concurrent: num_cpus::get(),
            lock: LockConfig::default(),
            policy: TransactionPolicy::default(),
            report: ReportKind::Ledger,
        }
    }
}

impl ReplayConfig {
    /// Replace a zero `max_concurrent` with the default, with a warning
    pub fn validated(mut self) -> Self {
        if self.max_concurrent == 0 {
            let default = num_cpus::get();
            warn!(
                "Invalid max_concurrent ({}), using default ({})",
                self.max_concurrent, default
            );
            self.max_concurrent = default;
        }
        self
    }
}

/// Create a replay strategy based on the specified strategy type
pub fn create_strategy(strategy_type: StrategyType, config: ReplayConfig) -> Box<dyn ReplayStrategy> {
    let config = config.validated();
    match strategy_type {
        StrategyType::Sync => Box::new(SyncReplayStrategy::new(config)),
        StrategyType::Async => Box::new(AsyncReplayStrategy::new(config)),
    }
}
