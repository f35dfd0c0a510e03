/// hydrograph_stats: peak, trough, mean and rolling-window statistics for
/// discharge hydrographs.
///
/// # Module structure
///
/// ```text
/// hydrograph_stats
/// ├── model       shared data types (Timestamp, Series, StatisticsResult, SeriesOutcome)
/// ├── error       error taxonomy (FormatError, SourceError, ConfigError, AppError, ...)
/// ├── config      run configuration loader (YAML / TOML) and precedence rules
/// ├── payload     event payload: linked inputs, outputs, status key
/// ├── storage     locator parsing and fetch/write
/// │   ├── http    HTTP(S), S3 and Azure Blob over reqwest
/// │   └── kv      key-value entries in Redis or PostgreSQL
/// ├── status      run status side channel (null / PostgreSQL)
/// ├── ingest      format normalization: raw bytes → Series
/// │   ├── delimited  generic header + delimiter files
/// │   ├── usgs_rdb   USGS NWIS RDB reports
/// │   ├── dss        HEC-DSS placeholder
/// │   ├── timezone   USGS tz_cd codes and localization
/// │   └── fixtures (test only) representative file contents
/// ├── analysis
/// │   ├── window     rolling-window durations
/// │   └── hydrograph statistics engine
/// ├── runner      multi-hydrograph orchestration (thread pool, status, output)
/// ├── sink        JSON results document
/// ├── cli         command line flags, run wiring, exit codes
/// └── logging     tracing subscriber setup
/// ```

/// Public modules
pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod payload;
pub mod runner;
pub mod sink;
pub mod status;
pub mod storage;
