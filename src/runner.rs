/// Multi-hydrograph analysis runs.
///
/// A run takes a list of sources, pushes each one through
/// fetch → normalize → analyze, and collects one outcome per source in input
/// order. A failing source becomes a failure record unless the run is
/// fail-fast, in which case the first failure ends the run.
///
/// Sources are independent, so with more than one worker they are spread
/// over a thread pool and the outcomes are put back in input order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use threadpool::ThreadPool;
use tracing::{info, info_span, warn};

use crate::analysis::{RollingWindow, analyze};
use crate::config::HydrographStatsConfig;
use crate::error::AppError;
use crate::ingest::{FormatKind, FormatOptions, NormalizerRegistry};
use crate::model::{SeriesFailure, SeriesOutcome, StatisticsResult};
use crate::payload::EventPayload;
use crate::sink;
use crate::status::{NullStatusStore, RunState, StatusStore};
use crate::storage::Storage;

// ---------------------------------------------------------------------------
// Run description
// ---------------------------------------------------------------------------

/// One hydrograph to analyze.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSource {
    pub locator: String,
    pub format: FormatKind,
    pub options: FormatOptions,
}

/// Everything a run needs, resolved from configuration and payload.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub sources: Vec<SeriesSource>,
    pub window: RollingWindow,
    pub pretty_print: bool,
    /// Destination for the results document, if any.
    pub out: Option<String>,
    /// Key to report run status under; payload runs only.
    pub status_key: Option<String>,
}

impl RunRequest {
    /// Builds a request from a validated configuration.
    ///
    /// With a payload, sources and destination come from the payload and
    /// the configuration only supplies options. A payload input with a
    /// format tag uses that format; otherwise the configured default applies.
    pub fn from_config(config: &HydrographStatsConfig, payload: Option<&EventPayload>) -> Result<Self, AppError> {
        let options = config.format_options()?;
        let window = config.window()?;
        let default_format = config.default_format();

        let source = |locator: String, format: FormatKind| SeriesSource {
            locator,
            format,
            options: options.clone(),
        };

        let (sources, out, status_key) = match payload {
            Some(payload) => {
                let sources = payload
                    .linked_sources()?
                    .into_iter()
                    .map(|linked| {
                        let format = match linked.format.as_deref() {
                            Some(tag) => tag.parse().unwrap_or_else(|e| {
                                warn!(input = %linked.name, error = %e, "using default format");
                                default_format
                            }),
                            None => default_format,
                        };
                        source(linked.locator, format)
                    })
                    .collect::<Vec<_>>();
                (sources, Some(payload.output_locator()), Some(payload.status_key()))
            }
            None => {
                let sources = config
                    .hydrographs
                    .iter()
                    .map(|locator| source(locator.clone(), default_format))
                    .collect::<Vec<_>>();
                (sources, config.out.clone(), None)
            }
        };

        if sources.is_empty() {
            return Err(AppError::NoHydrographs);
        }

        Ok(Self {
            sources,
            window,
            pretty_print: config.pretty_print,
            out,
            status_key,
        })
    }
}

/// Outcomes of a finished run plus the serialized results document.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcomes: Vec<SeriesOutcome>,
    /// JSON array, without trailing newline.
    pub document: Vec<u8>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn is_partial(&self) -> bool {
        self.failures() > 0
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    storage: Arc<dyn Storage>,
    registry: Arc<NormalizerRegistry>,
    status: Arc<dyn StatusStore>,
    workers: usize,
    fail_fast: bool,
}

impl Orchestrator {
    /// Sequential, partial-results orchestrator with the default formats and
    /// no status reporting.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            registry: Arc::new(NormalizerRegistry::default()),
            status: Arc::new(NullStatusStore),
            workers: 1,
            fail_fast: false,
        }
    }

    pub fn with_status(mut self, status: Arc<dyn StatusStore>) -> Self {
        self.status = status;
        self
    }

    pub fn with_registry(mut self, registry: NormalizerRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Runs a request end to end: status, analysis, serialization, output.
    ///
    /// Partial failures are part of the report; only fail-fast aborts,
    /// serialization and output errors end the run with `Err`.
    pub fn execute(&self, request: &RunRequest) -> Result<RunReport, AppError> {
        let key = request.status_key.as_deref();
        self.mark(key, RunState::InProgress);

        let report = self.run(&request.sources, &request.window).and_then(|outcomes| {
            let document = sink::serialize(&outcomes, request.pretty_print)?;
            if let Some(out) = &request.out {
                sink::write_document(self.storage.as_ref(), out, &document)?;
            }
            Ok(RunReport { outcomes, document })
        });

        match &report {
            Ok(report) if !report.is_partial() => self.mark(key, RunState::Done),
            _ => self.mark(key, RunState::Failed),
        }
        report
    }

    /// Analyzes every source, returning outcomes in input order.
    pub fn run(&self, sources: &[SeriesSource], window: &RollingWindow) -> Result<Vec<SeriesOutcome>, AppError> {
        info!(hydrographs = sources.len(), window = %window, workers = self.workers, "starting analysis");

        let outcomes = if self.workers > 1 && sources.len() > 1 {
            self.run_parallel(sources, window)?
        } else {
            self.run_sequential(sources, window)?
        };

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        info!(analyzed = outcomes.len() - failed, failed, "analysis finished");
        Ok(outcomes)
    }

    fn run_sequential(&self, sources: &[SeriesSource], window: &RollingWindow) -> Result<Vec<SeriesOutcome>, AppError> {
        let mut outcomes = Vec::with_capacity(sources.len());
        for source in sources {
            let result = analyze_source(self.storage.as_ref(), &self.registry, source, window);
            outcomes.push(self.outcome(source, result)?);
        }
        Ok(outcomes)
    }

    fn run_parallel(&self, sources: &[SeriesSource], window: &RollingWindow) -> Result<Vec<SeriesOutcome>, AppError> {
        let pool = ThreadPool::new(self.workers.min(sources.len()));
        let (tx, rx) = mpsc::channel();
        let abort = Arc::new(AtomicBool::new(false));

        for (idx, source) in sources.iter().enumerate() {
            let tx = tx.clone();
            let storage = Arc::clone(&self.storage);
            let registry = Arc::clone(&self.registry);
            let abort = Arc::clone(&abort);
            let source = source.clone();
            let window = window.clone();

            pool.execute(move || {
                if abort.load(Ordering::Relaxed) {
                    return;
                }
                let result = analyze_source(storage.as_ref(), &registry, &source, &window);
                // The receiver is gone only after a fail-fast abort
                let _ = tx.send((idx, result));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<SeriesOutcome>> = vec![None; sources.len()];
        for (idx, result) in rx.iter() {
            match self.outcome(&sources[idx], result) {
                Ok(outcome) => slots[idx] = Some(outcome),
                Err(e) => {
                    abort.store(true, Ordering::Relaxed);
                    return Err(e);
                }
            }
        }

        // An empty slot means its job died (panicked) before reporting
        slots
            .into_iter()
            .zip(sources)
            .map(|(slot, source)| {
                slot.ok_or_else(|| AppError::Series {
                    hydrograph: source.locator.clone(),
                    message: "analysis worker stopped without reporting a result".to_string(),
                })
            })
            .collect()
    }

    /// Turns a per-source result into an outcome, or into the run's error
    /// when failing fast.
    fn outcome(
        &self,
        source: &SeriesSource,
        result: Result<StatisticsResult, AppError>,
    ) -> Result<SeriesOutcome, AppError> {
        match result {
            Ok(stats) => Ok(SeriesOutcome::Analyzed(stats)),
            Err(e) if self.fail_fast => Err(AppError::Series {
                hydrograph: source.locator.clone(),
                message: e.to_string(),
            }),
            Err(e) => Ok(SeriesOutcome::Failed(SeriesFailure {
                hydrograph: source.locator.clone(),
                error: e.to_string(),
            })),
        }
    }

    fn mark(&self, key: Option<&str>, state: RunState) {
        let Some(key) = key else { return };
        if let Err(e) = self.status.mark(key, state) {
            warn!(key, state = %state, error = %e, "failed to update run status");
        }
    }
}

/// Fetches, normalizes and analyzes one source.
pub fn analyze_source(
    storage: &dyn Storage,
    registry: &NormalizerRegistry,
    source: &SeriesSource,
    window: &RollingWindow,
) -> Result<StatisticsResult, AppError> {
    let span = info_span!("hydrograph", locator = %source.locator, format = %source.format);
    let _enter = span.enter();

    let outcome = storage
        .fetch(&source.locator)
        .map_err(AppError::from)
        .and_then(|raw| Ok(registry.parse(&raw, source.format, &source.options, &source.locator)?))
        .and_then(|series| Ok(analyze(&series, window)?));

    match &outcome {
        Ok(stats) => info!(max = stats.max, min = stats.min, avg = stats.avg, "hydrograph analyzed"),
        Err(e) => warn!(error = %e, "hydrograph failed"),
    }
    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
