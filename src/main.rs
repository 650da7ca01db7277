//! Deposit Dashboard CLI
//!
//! Command-line interface over the dashboard core: entity queries,
//! distribution summaries, KPIs, interest projections and deposit/withdrawal
//! simulations.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- query clients.csv --entity clients --filter "amount>=60000" --sort amount:desc
//! cargo run -- query users.json --entity users --search ana --format json
//! cargo run -- summarize kyc.csv --entity kyc --by status
//! cargo run -- kpi exports/ --as-of 2024-06-30
//! cargo run -- project --principal "€50.000" --rate "9,00%" --months 12
//! cargo run -- simulate --method bank --grant contract --grant kyc --grant profile --grant docs \
//!     --trigger "submit transfer" --trigger "simulate reconciliation"
//! ```
//!
//! Results go to stdout. Logs go to stderr; set `RUST_LOG` to change the
//! level (default `warn,deposit_dashboard=info`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, invalid filter, failed fetch, etc.)

use deposit_dashboard::{app, cli};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,deposit_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    let mut output = std::io::stdout();
    if let Err(e) = app::run(args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
