//! Partitioned, multi-threaded replay strategy
//!
//! # Architecture
//!
//! ```text
//! AsyncReplayStrategy
//!     ├── ReplayConfig (max_concurrent, lock, policy, report)
//!     ├── RequestReader (requests file, read up front)
//!     ├── partition_by_account (one ordered queue per account)
//!     └── ReplayContext (shared by every worker)
//! ```
//!
//! Each account partition runs on the tokio blocking pool, since the
//! transaction core blocks while waiting for locks. A semaphore of
//! `max_concurrent` permits bounds how many partitions run at once.
//!
//! # Ordering
//!
//! - Requests of one account keep their file order
//! - Partitions of different accounts run in parallel, in no fixed order
//! - Queries touch no account; they run after every partition has finished
//!
//! A reverse referencing a label is resolved when it runs, so the label must
//! come from a debit on the same account (or be a raw correlation id).

use crate::io::RequestReader;
use crate::strategy::{ReplayConfig, ReplayContext, ReplayStrategy};
use crate::types::Request;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct AsyncReplayStrategy {
    config: ReplayConfig,
}

/// Requests split by target account, plus the account-less queries
#[derive(Debug, Default, PartialEq)]
pub struct Partitions {
    /// Per-account queues, in order of first appearance
    pub accounts: Vec<Vec<Request>>,
    pub queries: Vec<Request>,
}

impl AsyncReplayStrategy {
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }
}

/// Partition requests by account, preserving per-account order
pub fn partition_by_account(requests: Vec<Request>) -> Partitions {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut partitions = Partitions::default();

    for request in requests {
        let Some(account) = request.account().map(str::to_string) else {
            partitions.queries.push(request);
            continue;
        };

        let slot = *index.entry(account).or_insert_with(|| {
            partitions.accounts.push(Vec::new());
            partitions.accounts.len() - 1
        });
        partitions.accounts[slot].push(request);
    }

    partitions
}

impl ReplayStrategy for AsyncReplayStrategy {
    fn replay(
        &self,
        accounts_path: &Path,
        requests_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), String> {
        let context = Arc::new(ReplayContext::new(&self.config));
        context.seed_from_file(accounts_path)?;

        let requests: Vec<Request> = RequestReader::open(requests_path)?
            .filter_map(|result| {
                result
                    .inspect_err(|e| warn!(reason = %e, "skipping request row"))
                    .ok()
            })
            .collect();
        let Partitions {
            accounts: account_partitions,
            queries,
        } = partition_by_account(requests);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let permits = Arc::new(Semaphore::new(self.config.max_concurrent));
            let mut tasks = Vec::with_capacity(account_partitions.len());

            for partition in account_partitions {
                let permit = Arc::clone(&permits)
                    .acquire_owned()
                    .await
                    .map_err(|e| format!("Worker pool closed: {}", e))?;
                let context = Arc::clone(&context);

                tasks.push(tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    for request in &partition {
                        context.apply_logged(request);
                    }
                }));
            }

            for task in tasks {
                if let Err(e) = task.await {
                    error!(reason = %e, "replay worker panicked");
                }
            }

            Ok::<(), String>(())
        })?;

        for query in &queries {
            context.apply_logged(query);
        }

        context.write_report(output)
    }
}
