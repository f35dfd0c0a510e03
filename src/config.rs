/// Run configuration loader: parses YAML or TOML configuration files
///
/// Keeps analysis options (window, column layout, output) out of the
/// command line so one file can drive many runs. Every key is optional;
/// unknown keys are rejected so a misspelled option fails loudly instead
/// of silently falling back to its default. The older `storage_options`
/// and `out_fsspec_kwargs` keys are still read, then ignored with a warning.
///
/// Example (`config.yml`):
///
/// ```yaml
/// hydrographs:
///   - data/hsm1.csv
/// duration: 3H
/// sep: ","
/// col_idx_dt: 0
/// col_idx_q: 1
/// pretty_print: true
/// out: results.json
/// ```

use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::RollingWindow;
use crate::analysis::window::DEFAULT_WINDOW;
use crate::error::{AppError, ConfigError};
use crate::ingest::{FormatKind, FormatOptions};
use crate::payload::EventPayload;
use crate::storage::Storage;

/// Options for one run of the analyzer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HydrographStatsConfig {
    /// Hydrograph locators, analyzed in order.
    pub hydrographs: Vec<String>,
    /// Rolling window, e.g. `"3H"` or `"90min"`.
    pub duration: String,
    /// Column separator for delimited files (one character; `\t` for tab).
    pub sep: String,
    pub col_idx_dt: usize,
    pub col_idx_q: usize,
    /// Read every hydrograph as a USGS RDB report.
    pub usgs_rdb: bool,
    pub pretty_print: bool,
    /// Where to write the results document, in addition to stdout.
    pub out: Option<String>,
    /// Flow value that marks a missing reading.
    pub fill_value: Option<f64>,
    /// Hydrographs analyzed concurrently.
    pub workers: usize,
    /// Abort on the first failing hydrograph instead of reporting it.
    pub fail_fast: bool,
    /// Legacy storage client options. Storage is configured through the
    /// environment instead, so this is ignored.
    pub storage_options: Option<serde_yaml::Value>,
    /// Legacy output client options, ignored like `storage_options`.
    pub out_fsspec_kwargs: Option<serde_yaml::Value>,
}

impl Default for HydrographStatsConfig {
    fn default() -> Self {
        Self {
            hydrographs: Vec::new(),
            duration: DEFAULT_WINDOW.to_string(),
            sep: ",".to_string(),
            col_idx_dt: 0,
            col_idx_q: 1,
            usgs_rdb: false,
            pretty_print: false,
            out: None,
            fill_value: None,
            workers: 1,
            fail_fast: false,
            storage_options: None,
            out_fsspec_kwargs: None,
        }
    }
}

impl HydrographStatsConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults"
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str::<Self>(yaml)?.without_legacy_keys())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<Self>(text)?.without_legacy_keys())
    }

    /// Drops the legacy storage keys, warning about each one present.
    fn without_legacy_keys(mut self) -> Self {
        if self.storage_options.take().is_some() {
            warn!("ignoring storage_options; storage is configured through the environment");
        }
        if self.out_fsspec_kwargs.take().is_some() {
            warn!("ignoring out_fsspec_kwargs; storage is configured through the environment");
        }
        self
    }

    /// Fetches a configuration file. `.toml` files are read as TOML,
    /// everything else as YAML.
    pub fn load(storage: &dyn Storage, locator: &str) -> Result<Self, ConfigError> {
        let raw = storage.fetch(locator)?;
        let text = std::str::from_utf8(&raw).map_err(|_| ConfigError::Encoding)?;

        let config = if locator.to_ascii_lowercase().ends_with(".toml") {
            Self::from_toml_str(text)?
        } else {
            Self::from_yaml_str(text)?
        };
        info!(locator, "loaded configuration");
        Ok(config)
    }

    /// Checks every option that can be wrong independently of the data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window()?;
        self.separator()?;
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.col_idx_dt == self.col_idx_q && !self.usgs_rdb {
            return Err(ConfigError::Invalid(format!(
                "col_idx_dt and col_idx_q both point at column {}",
                self.col_idx_q
            )));
        }
        Ok(())
    }

    pub fn window(&self) -> Result<RollingWindow, ConfigError> {
        Ok(RollingWindow::parse(&self.duration)?)
    }

    /// The separator as a single character; the two-character escape `\t`
    /// stands for a tab.
    pub fn separator(&self) -> Result<char, ConfigError> {
        if self.sep == "\\t" {
            return Ok('\t');
        }
        let mut chars = self.sep.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConfigError::Invalid(format!("sep must be a single character, got '{}'", self.sep))),
        }
    }

    pub fn format_options(&self) -> Result<FormatOptions, ConfigError> {
        Ok(FormatOptions {
            sep: self.separator()?,
            col_idx_dt: self.col_idx_dt,
            col_idx_q: self.col_idx_q,
            fill_value: self.fill_value,
        })
    }

    /// Format for hydrographs that do not declare one.
    pub fn default_format(&self) -> FormatKind {
        if self.usgs_rdb { FormatKind::UsgsRdb } else { FormatKind::Delimited }
    }
}

/// Picks the configuration for a run.
///
/// Precedence: an explicit `--config` file, then the payload's first
/// configuration path, then the individual command line flags. File-based
/// configurations replace the flags wholesale.
pub fn resolve_config(
    storage: &dyn Storage,
    explicit: Option<&str>,
    payload: Option<&EventPayload>,
    flags: HydrographStatsConfig,
) -> Result<HydrographStatsConfig, AppError> {
    let config = match (explicit, payload) {
        (Some(locator), _) => HydrographStatsConfig::load(storage, locator)?,
        (None, Some(payload)) => HydrographStatsConfig::load(storage, payload.config_locator()?)?,
        (None, None) => flags,
    };
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
