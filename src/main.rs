//! Hydrograph statistics command line tool
//!
//! Reads one or more discharge hydrographs, computes peak, trough, mean and
//! rolling-window extrema for each, and prints a JSON array of results.
//!
//! Usage:
//!   hydrograph_stats data/hsm1.csv --duration 3H --pretty-print
//!   hydrograph_stats gauge.txt --usgs-rdb --out s3://bucket/results.json
//!   hydrograph_stats --payload s3://bucket/payload.yml
//!
//! Environment:
//!   RUST_LOG                 - log filter (default: info)
//!   S3_BUCKET, S3_ENDPOINT   - default bucket and endpoint for S3 locators
//!   AZURE_STORAGE_ACCOUNT, AZURE_STORAGE_SAS_TOKEN - Azure Blob access
//!   KV_DATABASE_URL          - PostgreSQL database holding kv_store
//!   STATUS_DATABASE_URL      - PostgreSQL database holding run_status
//!
//! Exit codes: 0 success, 1 fatal error, 2 some hydrographs failed.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use hydrograph_stats::cli::{self, Cli, EXIT_FATAL};
use hydrograph_stats::logging::init_logging;
use hydrograph_stats::storage::StorageSettings;

fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();
    init_logging();

    let args = Cli::parse();
    let settings = StorageSettings::from_env();

    let result = cli::run(&args, settings);
    match &result {
        Ok(report) => {
            let mut stdout = std::io::stdout().lock();
            let printed = stdout
                .write_all(&report.document)
                .and_then(|_| stdout.write_all(b"\n"))
                .and_then(|_| stdout.flush());
            if let Err(e) = printed {
                tracing::error!("failed to print results: {}", e);
                return ExitCode::from(EXIT_FATAL);
            }
            if report.is_partial() {
                tracing::warn!("{} of {} hydrographs failed", report.failures(), report.outcomes.len());
            }
        }
        Err(e) => tracing::error!("{}", e),
    }

    ExitCode::from(cli::exit_code(&result))
}
