/// Locator resolution and byte I/O across storage backends.
///
/// Submodules:
/// - `http`: HTTP(S), S3 (path-style URLs) and Azure Blob over blocking reqwest
/// - `kv`:   key-value entries in Redis or a PostgreSQL table
///
/// A locator is the string a user or payload writes to name a file:
///
/// ```text
/// data/flows.csv                      local path (or S3 key when S3_BUCKET is set)
/// file:///srv/data/flows.csv          local path
/// https://host/flows.csv              HTTP(S)
/// s3://bucket/path/flows.csv          S3 object
/// az://container/path/flows.csv       Azure Blob (abfs:// also accepted)
/// redis://host:6379/0#flows.csv       key-value entry (Redis)
/// postgres://user@host/db#flows.csv   key-value entry (PostgreSQL table)
/// kv://flows.csv                      key-value entry on KV_DATABASE_URL
/// ```

pub mod http;
pub mod kv;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::SourceError;

/// Timeout for every HTTP request made by the storage adapter.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_S3_ENDPOINT: &str = "https://s3.amazonaws.com";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Storage-related process settings, read once at startup and passed
/// explicitly to everything that touches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Bucket that bare relative locators resolve into.
    pub s3_bucket: Option<String>,
    pub s3_endpoint: String,
    pub azure_account: Option<String>,
    /// Shared access signature appended to Azure Blob URLs.
    pub azure_sas_token: Option<String>,
    /// Connection string for `kv://` locators.
    pub kv_database_url: Option<String>,
    /// Connection string for the run-status table.
    pub status_database_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            s3_bucket: None,
            s3_endpoint: DEFAULT_S3_ENDPOINT.to_string(),
            azure_account: None,
            azure_sas_token: None,
            kv_database_url: None,
            status_database_url: None,
        }
    }
}

impl StorageSettings {
    /// Reads settings from the process environment. Call after `dotenv`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from any variable lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            s3_bucket: var("S3_BUCKET"),
            s3_endpoint: var("S3_ENDPOINT")
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_S3_ENDPOINT.to_string()),
            azure_account: var("AZURE_STORAGE_ACCOUNT"),
            azure_sas_token: var("AZURE_STORAGE_SAS_TOKEN"),
            kv_database_url: var("KV_DATABASE_URL"),
            status_database_url: var("STATUS_DATABASE_URL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Locators
// ---------------------------------------------------------------------------

/// A parsed locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Local(PathBuf),
    Http(String),
    S3 { bucket: String, key: String },
    Azure { container: String, blob: String },
    /// `database` is the store's connection URL (`redis://` or
    /// `postgres://`), or `None` for `kv://` locators, which use
    /// `KV_DATABASE_URL`.
    KeyValue { database: Option<String>, key: String },
}

impl Locator {
    /// Parses a locator string without consulting any settings.
    pub fn parse(input: &str) -> Result<Self, SourceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SourceError::MalformedLocator(input.to_string()));
        }

        let Some((scheme, rest)) = trimmed.split_once("://") else {
            return Ok(Locator::Local(PathBuf::from(trimmed)));
        };

        match scheme.to_ascii_lowercase().as_str() {
            "file" => Ok(Locator::Local(PathBuf::from(rest))),
            "http" | "https" => Ok(Locator::Http(trimmed.to_string())),
            "s3" => {
                let (bucket, key) = split_container(rest, input)?;
                Ok(Locator::S3 { bucket, key })
            }
            "az" | "abfs" | "abfss" => {
                let (container, blob) = split_container(rest, input)?;
                Ok(Locator::Azure { container, blob })
            }
            "redis" | "rediss" | "postgres" | "postgresql" => {
                let (database, key) = trimmed
                    .rsplit_once('#')
                    .filter(|(_, key)| !key.is_empty())
                    .ok_or_else(|| SourceError::MalformedLocator(input.to_string()))?;
                Ok(Locator::KeyValue {
                    database: Some(database.to_string()),
                    key: key.to_string(),
                })
            }
            "kv" if !rest.is_empty() => Ok(Locator::KeyValue { database: None, key: rest.to_string() }),
            "kv" => Err(SourceError::MalformedLocator(input.to_string())),
            other => Err(SourceError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Parses `input`, sending bare relative paths to the default bucket
    /// when one is configured.
    pub fn resolve(input: &str, settings: &StorageSettings) -> Result<Self, SourceError> {
        let locator = Self::parse(input)?;
        match (&locator, &settings.s3_bucket) {
            (Locator::Local(path), Some(bucket)) if path.is_relative() && !input.contains("://") => {
                let key = path.to_string_lossy().trim_start_matches("./").to_string();
                debug!(locator = input, bucket = %bucket, "qualifying relative locator with default bucket");
                Ok(Locator::S3 { bucket: bucket.clone(), key })
            }
            _ => Ok(locator),
        }
    }
}

/// Splits `container/path/to/object` at the first slash.
fn split_container(rest: &str, input: &str) -> Result<(String, String), SourceError> {
    match rest.split_once('/') {
        Some((container, object)) if !container.is_empty() && !object.is_empty() => {
            Ok((container.to_string(), object.to_string()))
        }
        _ => Err(SourceError::MalformedLocator(input.to_string())),
    }
}

/// Joins a directory-like locator and a relative name with one slash.
pub fn join_locator(root: &str, name: &str) -> String {
    if root.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", root.trim_end_matches('/'), name.trim_start_matches('/'))
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Reads and writes whole objects by locator.
pub trait Storage: Send + Sync {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, SourceError>;
    fn write(&self, locator: &str, bytes: &[u8]) -> Result<(), SourceError>;
}

/// Storage over every backend a locator can name.
pub struct DefaultStorage {
    settings: StorageSettings,
    http: http::HttpBackend,
}

impl DefaultStorage {
    pub fn new(settings: StorageSettings) -> Result<Self, SourceError> {
        let http = http::HttpBackend::new(&settings)?;
        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &StorageSettings {
        &self.settings
    }

    fn kv_database<'a>(&'a self, database: &'a Option<String>) -> Result<&'a str, SourceError> {
        database
            .as_deref()
            .or(self.settings.kv_database_url.as_deref())
            .ok_or(SourceError::KeyValueNotConfigured)
    }
}

impl Storage for DefaultStorage {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, SourceError> {
        match Locator::resolve(locator, &self.settings)? {
            Locator::Local(path) => read_local(&path, locator),
            Locator::Http(url) => self.http.get(&url, locator),
            Locator::S3 { bucket, key } => self.http.get(&self.http.s3_url(&bucket, &key), locator),
            Locator::Azure { container, blob } => {
                let url = self.http.azure_url(&container, &blob)?;
                self.http.get(&url, locator)
            }
            Locator::KeyValue { database, key } => kv::fetch(self.kv_database(&database)?, &key),
        }
    }

    fn write(&self, locator: &str, bytes: &[u8]) -> Result<(), SourceError> {
        match Locator::resolve(locator, &self.settings)? {
            Locator::Local(path) => write_local(&path, bytes, locator),
            Locator::Http(url) => self.http.put(&url, bytes, locator, false),
            Locator::S3 { bucket, key } => self.http.put(&self.http.s3_url(&bucket, &key), bytes, locator, false),
            Locator::Azure { container, blob } => {
                let url = self.http.azure_url(&container, &blob)?;
                self.http.put(&url, bytes, locator, true)
            }
            Locator::KeyValue { database, key } => kv::write(self.kv_database(&database)?, &key, bytes),
        }
    }
}

fn read_local(path: &Path, locator: &str) -> Result<Vec<u8>, SourceError> {
    fs::read(path).map_err(|source| SourceError::Io { locator: locator.to_string(), source })
}

fn write_local(path: &Path, bytes: &[u8], locator: &str) -> Result<(), SourceError> {
    let io_err = |source| SourceError::Io { locator: locator.to_string(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
