use crate::core::{LockConfig, ReversalMode, TransactionPolicy};
use crate::strategy::ReplayConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay debit and reversal requests against lock-guarded accounts
#[derive(Parser, Debug)]
#[command(name = "balance-guard")]
#[command(about = "Replay debit and reversal requests against lock-guarded accounts", long_about = None)]
pub struct CliArgs {
    /// Accounts CSV file (owner, name, balance)
    #[arg(value_name = "ACCOUNTS", help = "Path to the accounts CSV file")]
    pub accounts_file: PathBuf,

    /// Requests CSV file (type, owner, account, amount, ref)
    #[arg(value_name = "REQUESTS", help = "Path to the requests CSV file")]
    pub requests_file: PathBuf,

    /// Execution strategy for the replay
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for file order on one thread or 'async' for per-account partitions"
    )]
    pub strategy: StrategyType,

    /// Maximum number of partitions processed at once (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of account partitions processing concurrently (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    /// How long a request waits for an account lock
    #[arg(
        long = "lock-wait-ms",
        value_name = "MILLIS",
        help = "Milliseconds to wait for an account lock (default: 1000)"
    )]
    pub lock_wait_ms: Option<u64>,

    /// How long an account lock is honored without release
    #[arg(
        long = "lock-hold-ms",
        value_name = "MILLIS",
        help = "Milliseconds before an unreleased account lock expires (default: 15000)"
    )]
    pub lock_hold_ms: Option<u64>,

    /// Credit reversed amounts back to the account
    #[arg(
        long = "restore-on-reversal",
        help = "Credit the reversed amount back to the account instead of only recording the balance"
    )]
    pub restore_on_reversal: bool,

    /// Report written to stdout
    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "ledger",
        help = "Report to print: 'ledger' for every record or 'accounts' for final balances"
    )]
    pub report: ReportKind,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Available reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Ledger,
    Accounts,
}

impl CliArgs {
    /// Create a ReplayConfig from CLI arguments
    ///
    /// Options that were not given keep their default values.
    pub fn to_replay_config(&self) -> ReplayConfig {
        let default = ReplayConfig::default();

        let lock = LockConfig::new(
            self.lock_wait_ms
                .map(Duration::from_millis)
                .unwrap_or(default.lock.wait_timeout),
            self.lock_hold_ms
                .map(Duration::from_millis)
                .unwrap_or(default.lock.hold_timeout),
        );

        let reversal_mode = if self.restore_on_reversal {
            ReversalMode::RestoreBalance
        } else {
            ReversalMode::SnapshotOnly
        };

        ReplayConfig {
            max_concurrent: self.max_concurrent.unwrap_or(default.max_concurrent),
            lock,
            policy: TransactionPolicy {
                reversal_mode,
                ..default.policy
            },
            report: self.report,
        }
        .validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "a.csv", "r.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "a.csv", "r.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "a.csv", "r.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::default_report(&["program", "a.csv", "r.csv"], ReportKind::Ledger)]
    #[case::accounts_report(&["program", "--report", "accounts", "a.csv", "r.csv"], ReportKind::Accounts)]
    fn test_report_parsing(#[case] args: &[&str], #[case] expected: ReportKind) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.report, expected);
        assert_eq!(parsed.to_replay_config().report, expected);
    }

    #[test]
    fn test_defaults_map_to_default_config() {
        let parsed = CliArgs::try_parse_from(["program", "a.csv", "r.csv"]).unwrap();

        assert_eq!(parsed.to_replay_config(), ReplayConfig::default());
    }

    #[rstest]
    #[case::wait(&["program", "--lock-wait-ms", "250", "a.csv", "r.csv"], 250, 15_000)]
    #[case::hold(&["program", "--lock-hold-ms", "2000", "a.csv", "r.csv"], 1_000, 2_000)]
    #[case::both(
        &["program", "--lock-wait-ms", "10", "--lock-hold-ms", "20", "a.csv", "r.csv"],
        10,
        20
    )]
    fn test_lock_options(#[case] args: &[&str], #[case] wait_ms: u64, #[case] hold_ms: u64) {
        let config = CliArgs::try_parse_from(args).unwrap().to_replay_config();

        assert_eq!(config.lock.wait_timeout, Duration::from_millis(wait_ms));
        assert_eq!(config.lock.hold_timeout, Duration::from_millis(hold_ms));
        assert_eq!(config.lock.key_prefix, "lock:");
    }

    #[rstest]
    #[case::snapshot(&["program", "a.csv", "r.csv"], ReversalMode::SnapshotOnly)]
    #[case::restore(&["program", "--restore-on-reversal", "a.csv", "r.csv"], ReversalMode::RestoreBalance)]
    fn test_reversal_mode(#[case] args: &[&str], #[case] expected: ReversalMode) {
        let config = CliArgs::try_parse_from(args).unwrap().to_replay_config();
        assert_eq!(config.policy.reversal_mode, expected);
    }

    #[rstest]
    #[case::custom(&["program", "--max-concurrent", "8", "a.csv", "r.csv"], 8)]
    #[case::zero_falls_back(&["program", "--max-concurrent", "0", "a.csv", "r.csv"], num_cpus::get())]
    fn test_max_concurrent(#[case] args: &[&str], #[case] expected: usize) {
        let config = CliArgs::try_parse_from(args).unwrap().to_replay_config();
        assert_eq!(config.max_concurrent, expected);
    }

    #[rstest]
    #[case::missing_inputs(&["program"])]
    #[case::missing_requests(&["program", "a.csv"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "a.csv", "r.csv"])]
    #[case::invalid_report(&["program", "--report", "balances", "a.csv", "r.csv"])]
    #[case::invalid_wait(&["program", "--lock-wait-ms", "soon", "a.csv", "r.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
