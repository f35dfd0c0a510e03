/// Command line interface.
///
/// Flags mirror the configuration file keys one for one; they only take
/// effect when no configuration file is in play (see `config::resolve_config`).

use std::sync::Arc;

use clap::Parser;
use tracing::warn;

use crate::analysis::window::DEFAULT_WINDOW;
use crate::config::{HydrographStatsConfig, resolve_config};
use crate::error::AppError;
use crate::payload::EventPayload;
use crate::runner::{Orchestrator, RunReport, RunRequest};
use crate::status::{RunState, status_store};
use crate::storage::{DefaultStorage, Storage, StorageSettings};

/// Every hydrograph was analyzed.
pub const EXIT_OK: u8 = 0;
/// The run could not be carried out at all.
pub const EXIT_FATAL: u8 = 1;
/// Results were produced but at least one hydrograph failed.
pub const EXIT_PARTIAL: u8 = 2;

#[derive(Debug, Clone, Parser)]
#[command(name = "hydrograph_stats", version, about = "Peak, trough, mean and rolling-window statistics for discharge hydrographs")]
pub struct Cli {
    /// Paths or URLs of hydrographs to analyze.
    pub hydrographs: Vec<String>,

    /// Event payload (YAML) naming inputs, outputs and the configuration file.
    #[arg(long, alias = "wat-payload")]
    pub payload: Option<String>,

    /// Configuration file (YAML, or TOML with a .toml extension).
    #[arg(long)]
    pub config: Option<String>,

    /// Rolling window duration, e.g. 3H, 90min, "1 day".
    #[arg(long, default_value = DEFAULT_WINDOW)]
    pub duration: String,

    /// Column separator for delimited hydrographs ("\t" for tab).
    #[arg(long, default_value = ",")]
    pub sep: String,

    /// Datetime column index.
    #[arg(long, default_value_t = 0)]
    pub col_idx_dt: usize,

    /// Flow column index.
    #[arg(long, default_value_t = 1)]
    pub col_idx_q: usize,

    /// Hydrographs are USGS RDB reports. Overrides column and separator options.
    #[arg(long)]
    pub usgs_rdb: bool,

    /// Pretty print JSON results.
    #[arg(long)]
    pub pretty_print: bool,

    /// Output location for the results document.
    #[arg(long)]
    pub out: Option<String>,

    /// Flow value that marks a missing reading; matching rows are dropped.
    #[arg(long, allow_negative_numbers = true)]
    pub fill_value: Option<f64>,

    /// Number of hydrographs analyzed concurrently.
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Stop at the first failing hydrograph instead of reporting it.
    #[arg(long)]
    pub fail_fast: bool,
}

impl From<&Cli> for HydrographStatsConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            hydrographs: cli.hydrographs.clone(),
            duration: cli.duration.clone(),
            sep: cli.sep.clone(),
            col_idx_dt: cli.col_idx_dt,
            col_idx_q: cli.col_idx_q,
            usgs_rdb: cli.usgs_rdb,
            pretty_print: cli.pretty_print,
            out: cli.out.clone(),
            fill_value: cli.fill_value,
            workers: cli.workers,
            fail_fast: cli.fail_fast,
            storage_options: None,
            out_fsspec_kwargs: None,
        }
    }
}

/// Resolves payload and configuration for `cli`, then runs the analysis.
pub fn run(cli: &Cli, settings: StorageSettings) -> Result<RunReport, AppError> {
    let status = status_store(settings.status_database_url.as_deref());
    let storage: Arc<dyn Storage> = Arc::new(DefaultStorage::new(settings)?);

    let payload = match cli.payload.as_deref() {
        Some(locator) => Some(EventPayload::load(storage.as_ref(), locator)?),
        None => None,
    };

    let prepared = resolve_config(storage.as_ref(), cli.config.as_deref(), payload.as_ref(), cli.into())
        .and_then(|config| Ok((RunRequest::from_config(&config, payload.as_ref())?, config)));

    let (request, config) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            // The scheduler is waiting on this key even though nothing ran
            if let Some(key) = payload.as_ref().map(EventPayload::status_key) {
                if let Err(mark_err) = status.mark(&key, RunState::Failed) {
                    warn!(key = %key, error = %mark_err, "failed to update run status");
                }
            }
            return Err(e);
        }
    };

    Orchestrator::new(storage)
        .with_status(status)
        .with_workers(config.workers)
        .with_fail_fast(config.fail_fast)
        .execute(&request)
}

/// Exit code for a finished run.
pub fn exit_code(result: &Result<RunReport, AppError>) -> u8 {
    match result {
        Ok(report) if report.is_partial() => EXIT_PARTIAL,
        Ok(_) => EXIT_OK,
        Err(_) => EXIT_FATAL,
    }
}
