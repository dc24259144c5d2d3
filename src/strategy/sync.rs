//! Synchronous replay strategy
//!
//! Applies requests one at a time, in file order, on the calling thread.
//! Reading is streamed: requests are not collected up front.

use crate::io::RequestReader;
use crate::strategy::{ReplayConfig, ReplayContext, ReplayStrategy};
use std::io::Write;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SyncReplayStrategy {
    config: ReplayConfig,
}

impl SyncReplayStrategy {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }
}

impl ReplayStrategy for SyncReplayStrategy {
    fn replay(
        &self,
        accounts_path: &Path,
        requests_path: &Path,
        output: &mut dyn Write,
    ) -> Result<(), String> {
        let context = ReplayContext::new(&self.config);
        context.seed_from_file(accounts_path)?;

        for result in RequestReader::open(requests_path)? {
            match result {
                Ok(request) => context.apply_logged(&request),
                Err(e) => warn!(reason = %e, "skipping request row"),
            }
        }

        context.write_report(output)
    }
}
