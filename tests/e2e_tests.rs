//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV
//! fixtures. Each fixture directory under tests/fixtures/ holds:
//! - `accounts.csv` - accounts opened before the replay
//! - `requests.csv` - requests replayed against them
//! - `expected.csv` - the expected accounts report
//!
//! Fixtures cover:
//! - Happy path debits
//! - Insufficient balance and amount bounds
//! - Ownership and lookup failures
//! - Reversals (by label, with wrong amounts, unknown references)
//! - Malformed rows
//!
//! Each test is run with both the synchronous and the async strategy.

#[cfg(test)]
mod tests {
    use balance_guard::cli::{ReportKind, StrategyType};
    use balance_guard::core::ReversalMode;
    use balance_guard::strategy::{create_strategy, ReplayConfig};
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    fn config(report: ReportKind, reversal_mode: ReversalMode) -> ReplayConfig {
        let mut config = ReplayConfig {
            report,
            ..ReplayConfig::default()
        };
        config.policy.reversal_mode = reversal_mode;
        config
    }

    fn replay(
        accounts_path: &Path,
        requests_path: &Path,
        strategy_type: StrategyType,
        config: ReplayConfig,
    ) -> String {
        let strategy = create_strategy(strategy_type, config);
        let mut output = Vec::new();

        strategy
            .replay(accounts_path, requests_path, &mut output)
            .unwrap_or_else(|e| panic!("Failed to replay requests: {}", e));

        String::from_utf8(output).expect("report is not UTF-8")
    }

    /// Replay a fixture and compare the accounts report with `expected_file`
    fn run_test_fixture(
        fixture_name: &str,
        expected_file: &str,
        strategy_type: StrategyType,
        reversal_mode: ReversalMode,
    ) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let accounts_path = format!("{}/accounts.csv", fixture_dir);
        let requests_path = format!("{}/requests.csv", fixture_dir);
        let expected_path = format!("{}/{}", fixture_dir, expected_file);

        for path in [&accounts_path, &requests_path, &expected_path] {
            assert!(Path::new(path).exists(), "Fixture file not found: {}", path);
        }

        let actual_output = replay(
            Path::new(&accounts_path),
            Path::new(&requests_path),
            strategy_type,
            config(ReportKind::Accounts, reversal_mode),
        );

        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    #[rstest]
    #[case("happy_path")]
    #[case("insufficient_balance")]
    #[case("amount_bounds")]
    #[case("ownership")]
    #[case("reversal")]
    #[case("multiple_accounts")]
    #[case("malformed_data")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, "expected.csv", strategy, ReversalMode::SnapshotOnly);
    }

    #[rstest]
    fn test_reversal_restores_balance(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(
            "reversal",
            "expected_restore.csv",
            strategy,
            ReversalMode::RestoreBalance,
        );
    }

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    /// Ledger rows without the id-dependent columns (correlation id, time)
    fn ledger_rows(report: &str) -> Vec<String> {
        report
            .lines()
            .skip(1)
            .map(|line| {
                let columns: Vec<&str> = line.split(',').collect();
                columns[..6].join(",")
            })
            .collect()
    }

    #[rstest]
    fn test_ledger_report_for_overdraw_scenario(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let accounts = create_temp_csv("owner,name,balance\n1,kim,100000\n");
        let requests = create_temp_csv(
            "type,owner,account,amount,ref\n\
             debit,1,1000000000,99999,big\n\
             debit,1,1000000000,2,\n\
             reverse,,1000000000,99999,big\n",
        );

        let report = replay(
            accounts.path(),
            requests.path(),
            strategy,
            config(ReportKind::Ledger, ReversalMode::SnapshotOnly),
        );

        assert!(report.starts_with(
            "id,kind,outcome,account,amount,balance_after,transaction_id,transacted_at\n"
        ));
        assert_eq!(
            ledger_rows(&report),
            vec![
                "1,debit,success,1000000000,99999,1",
                "2,debit,failure,1000000000,2,1",
                "3,reversal,success,1000000000,99999,1",
            ]
        );

        // The reversal shares the debit's correlation id; the failure does not.
        let ids: Vec<&str> = report
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(6).unwrap())
            .collect();
        assert_eq!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(ids[0].len(), 32);
    }

    #[rstest]
    fn test_query_does_not_touch_the_ledger(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let accounts = create_temp_csv("owner,name,balance\n1,kim,1000\n");
        let requests = create_temp_csv(
            "type,owner,account,amount,ref\n\
             debit,1,1000000000,100,first\n\
             query,,,,first\n\
             query,,,,missing\n",
        );

        let report = replay(
            accounts.path(),
            requests.path(),
            strategy,
            config(ReportKind::Ledger, ReversalMode::SnapshotOnly),
        );

        assert_eq!(ledger_rows(&report), vec!["1,debit,success,1000000000,100,900"]);
    }

    #[test]
    fn test_strategies_agree_on_many_accounts() {
        let mut accounts = String::from("owner,name,balance\n");
        let mut requests = String::from("type,owner,account,amount,ref\n");
        for owner in 1..=20u64 {
            accounts.push_str(&format!("{},owner{},5000\n", owner, owner));
        }
        for round in 0..10u64 {
            for owner in 1..=20u64 {
                let number = 999_999_999 + owner;
                let amount = 100 + (round * 37 + owner * 11) % 900;
                requests.push_str(&format!("debit,{},{},{},\n", owner, number, amount));
            }
        }
        let accounts = create_temp_csv(&accounts);
        let requests = create_temp_csv(&requests);

        let reports: Vec<String> = [StrategyType::Sync, StrategyType::Async]
            .into_iter()
            .map(|strategy| {
                replay(
                    accounts.path(),
                    requests.path(),
                    strategy,
                    config(ReportKind::Accounts, ReversalMode::SnapshotOnly),
                )
            })
            .collect();

        assert_eq!(reports[0], reports[1]);
        assert_eq!(reports[0].lines().count(), 21);
    }
}
