/// Error types for every layer of the service.
///
/// Each layer owns one enum so callers can match on what actually went
/// wrong; `AppError` collects them for the binary.

use thiserror::Error;

/// Raw bytes did not have the structure the declared format requires.
#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("input is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("no header line found")]
    MissingHeader,
    #[error("no format descriptor line found after the RDB header")]
    MissingFormatLine,
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("no column name ends with parameter code {0}")]
    MissingFlowColumn(String),
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    FieldCount { line: usize, expected: usize, found: usize },
    #[error("line {line}: unparseable timestamp '{value}'")]
    InvalidTimestamp { line: usize, value: String },
    #[error("line {line}: unparseable flow value '{value}'")]
    InvalidFlow { line: usize, value: String },
    #[error("no observations in input")]
    NoObservations,
    #[error("format '{0}' is recognized but not supported")]
    Unsupported(String),
    #[error("unknown format '{0}'")]
    UnknownFormat(String),
}

/// The statistics engine refused its input.
#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("cannot analyze an empty series")]
    EmptySeries,
}

/// A rolling-window duration string could not be understood.
#[derive(Debug, Error, PartialEq)]
#[error("invalid window duration '{input}': {reason}")]
pub struct WindowError {
    pub input: String,
    pub reason: String,
}

/// A locator could not be resolved, read or written.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported locator scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("malformed locator '{0}'")]
    MalformedLocator(String),
    #[error("I/O error on {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP error {status} for {locator}")]
    Http { locator: String, status: u16 },
    #[error("request to {locator} failed: {source}")]
    Request {
        locator: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Azure storage account is not configured (set AZURE_STORAGE_ACCOUNT)")]
    AzureNotConfigured,
    #[error("key-value store is not configured (set KV_DATABASE_URL or use a redis://...#key or postgres://...#key locator)")]
    KeyValueNotConfigured,
    #[error("key '{0}' not found in key-value store")]
    KeyNotFound(String),
    #[error("key-value store error: {0}")]
    Database(#[from] postgres::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] SourceError),
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("configuration is not valid UTF-8")]
    Encoding,
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// The event payload document is missing something the run needs.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to read payload: {0}")]
    Source(#[from] SourceError),
    #[error("invalid payload YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("payload is not valid UTF-8")]
    Encoding,
    #[error("linked input '{0}' must have exactly one of `source` or `resource_info`")]
    AmbiguousInput(String),
    #[error("payload lists no model configuration paths")]
    NoConfiguration,
}

/// Everything that can end a run, as seen from `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("hydrograph {hydrograph}: {message}")]
    Series { hydrograph: String, message: String },
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no hydrographs to analyze")]
    NoHydrographs,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
