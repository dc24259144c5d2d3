//! Balance guard CLI
//!
//! Replays a file of debit, reversal and query requests against accounts
//! opened from a seed file, and prints a CSV report.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- accounts.csv requests.csv > ledger.csv
//! cargo run -- --strategy sync accounts.csv requests.csv > ledger.csv
//! cargo run -- --report accounts --restore-on-reversal accounts.csv requests.csv
//! RUST_LOG=balance_guard=info cargo run -- accounts.csv requests.csv
//! ```
//!
//! Logs go to stderr; stdout carries only the report.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use balance_guard::cli;
use balance_guard::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();
    let strategy = strategy::create_strategy(args.strategy, args.to_replay_config());

    let mut output = std::io::stdout();
    if let Err(e) = strategy.replay(&args.accounts_file, &args.requests_file, &mut output) {
        error!("{}", e);
        process::exit(1);
    }
}
