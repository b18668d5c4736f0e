//! Rust Point Ledger CLI
//!
//! Replays point charge/use commands from a CSV file and prints final balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > balances.csv
//! cargo run -- --strategy sync commands.csv > balances.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv
//! cargo run -- --unordered --lock-mode striped --stripes 16 commands.csv
//! cargo run -- --history --log-level debug commands.csv
//! ```
//!
//! Logs go to stderr, filtered by `RUST_LOG` or `--log-level`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use rust_point_ledger::cli;
use rust_point_ledger::logging;
use rust_point_ledger::strategy;
use std::process;

fn main() {
    let args = cli::parse_args();

    if let Err(e) = logging::init(&args.log_level) {
        eprintln!("Warning: {}", e);
    }

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config, args.to_replay_options())
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        tracing::error!(error = %e, "Replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
