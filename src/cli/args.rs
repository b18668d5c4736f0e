use crate::core::{LockConfig, LockMode};
use crate::strategy::{BatchConfig, ReplayOptions};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay point charge/use commands against a per-account locked ledger
#[derive(Parser, Debug)]
#[command(name = "point-ledger")]
#[command(about = "Replay point charge/use commands and print final balances", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing command records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Replay strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for sequential or 'async' for batched parallel replay"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Let commands for the same account race within a batch (async mode only)
    #[arg(long = "unordered")]
    pub unordered: bool,

    /// Key lock manager implementation
    #[arg(
        long = "lock-mode",
        value_name = "MODE",
        default_value = "per-key",
        help = "Lock manager: 'per-key' or 'striped'"
    )]
    pub lock_mode: LockModeArg,

    /// Number of stripes (striped lock mode only)
    #[arg(
        long = "stripes",
        value_name = "COUNT",
        help = "Number of lock stripes (default: 64)"
    )]
    pub stripes: Option<usize>,

    /// Print each account's history after the balances
    #[arg(long = "history")]
    pub history: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Lock manager selection on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LockModeArg {
    PerKey,
    Striped,
}

impl From<LockModeArg> for LockMode {
    fn from(arg: LockModeArg) -> Self {
        match arg {
            LockModeArg::PerKey => LockMode::PerKey,
            LockModeArg::Striped => LockMode::Striped,
        }
    }
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values use the defaults. Zero values are rejected by
    /// `BatchConfig::new` with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_concurrent_batches
                .unwrap_or(default.max_concurrent_batches),
            !self.unordered,
        )
    }

    pub fn to_lock_config(&self) -> LockConfig {
        let default = LockConfig::default();
        LockConfig::new(
            self.lock_mode.into(),
            self.stripes.unwrap_or(default.stripes),
        )
    }

    pub fn to_replay_options(&self) -> ReplayOptions {
        ReplayOptions {
            lock: self.to_lock_config(),
            include_history: self.history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // Strategy parsing tests
    #[rstest]
    #[case::default_strategy(&["program", "input.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 1000, num_cpus::get(), true)]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get(), true)]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], 1000, 8, true)]
    #[case::unordered(&["program", "--unordered", "input.csv"], 1000, num_cpus::get(), false)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 1000, num_cpus::get(), true)]
    #[case::zero_max_concurrent(&["program", "--max-concurrent", "0", "input.csv"], 1000, num_cpus::get(), true)]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
        #[case] expected_preserve_order: bool,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
        assert_eq!(config.preserve_order, expected_preserve_order);
    }

    #[rstest]
    #[case::default(&["program", "input.csv"], LockMode::PerKey, 64)]
    #[case::striped(&["program", "--lock-mode", "striped", "input.csv"], LockMode::Striped, 64)]
    #[case::striped_custom(&["program", "--lock-mode", "striped", "--stripes", "8", "input.csv"], LockMode::Striped, 8)]
    #[case::zero_stripes(&["program", "--lock-mode", "striped", "--stripes", "0", "input.csv"], LockMode::Striped, 64)]
    fn test_lock_config_conversion(
        #[case] args: &[&str],
        #[case] expected_mode: LockMode,
        #[case] expected_stripes: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_lock_config();

        assert_eq!(config.mode, expected_mode);
        assert_eq!(config.stripes, expected_stripes);
    }

    #[test]
    fn test_replay_options() {
        let parsed =
            CliArgs::try_parse_from(["program", "--history", "--log-level", "debug", "input.csv"])
                .unwrap();

        let options = parsed.to_replay_options();

        assert!(options.include_history);
        assert_eq!(options.lock, LockConfig::default());
        assert_eq!(parsed.log_level, "debug");
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "input.csv"])]
    #[case::invalid_lock_mode(&["program", "--lock-mode", "global", "input.csv"])]
    #[case::negative_stripes(&["program", "--stripes", "-1", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
