/// Format normalization: raw hydrograph bytes → canonical `Series`.
///
/// Submodules:
/// - `delimited`: generic header + delimiter files (CSV and friends)
/// - `usgs_rdb`:  USGS NWIS RDB reports with per-row `tz_cd` codes
/// - `dss`:       HEC-DSS binary files (recognized, not yet decoded)
/// - `timezone`:  zone code table and timestamp localization
/// - `fixtures` (test only): representative file contents
///
/// Each format is one `Normalizer` registered under its `FormatKind`, so
/// adding a format never touches the statistics engine.

pub mod delimited;
pub mod dss;
pub mod timezone;
pub mod usgs_rdb;

#[cfg(test)]
pub(crate) mod fixtures;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::FormatError;
use crate::model::Series;

// ---------------------------------------------------------------------------
// Format selection
// ---------------------------------------------------------------------------

/// The file formats a hydrograph can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Header row plus delimiter-separated columns.
    Delimited,
    /// USGS NWIS RDB (tab-separated, `#` preamble, two header rows).
    UsgsRdb,
    /// HEC-DSS binary interchange.
    Dss,
}

impl FormatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKind::Delimited => "delimited",
            FormatKind::UsgsRdb => "usgs-rdb",
            FormatKind::Dss => "dss",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the `format` tag of a payload linked input.
impl FromStr for FormatKind {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "delimited" | "txt" | "tsv" => Ok(FormatKind::Delimited),
            "rdb" | "usgs-rdb" | "usgs_rdb" | "usgs" => Ok(FormatKind::UsgsRdb),
            "dss" => Ok(FormatKind::Dss),
            other => Err(FormatError::UnknownFormat(other.to_string())),
        }
    }
}

/// Options that shape how a format is read.
///
/// `sep` and the column indices only apply to the delimited format; RDB
/// files always use tabs and discover their columns by name.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub sep: char,
    pub col_idx_dt: usize,
    pub col_idx_q: usize,
    /// Fill value meaning "no data". `None` passes every value through, so
    /// a fill value present in the file shows up as a real extreme.
    pub fill_value: Option<f64>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            sep: ',',
            col_idx_dt: 0,
            col_idx_q: 1,
            fill_value: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer registry
// ---------------------------------------------------------------------------

/// One file format's reader.
pub trait Normalizer: Send + Sync {
    /// Reads every data row of `raw`. The result may be unordered and may
    /// contain fill values; `parse` finishes the job.
    fn read(&self, raw: &[u8], options: &FormatOptions, source_id: &str) -> Result<Series, FormatError>;
}

/// Normalizers keyed by the format they read.
pub struct NormalizerRegistry {
    normalizers: HashMap<FormatKind, Box<dyn Normalizer>>,
}

impl NormalizerRegistry {
    /// An empty registry, for callers that want to pick their own formats.
    pub fn empty() -> Self {
        Self { normalizers: HashMap::new() }
    }

    pub fn register(&mut self, kind: FormatKind, normalizer: Box<dyn Normalizer>) {
        self.normalizers.insert(kind, normalizer);
    }

    pub fn supports(&self, kind: FormatKind) -> bool {
        self.normalizers.contains_key(&kind)
    }

    /// Reads `raw` as `kind` and hands back a series ready for analysis:
    /// non-empty, fill values masked per `options`, chronologically ordered.
    pub fn parse(
        &self,
        raw: &[u8],
        kind: FormatKind,
        options: &FormatOptions,
        source_id: &str,
    ) -> Result<Series, FormatError> {
        let normalizer = self
            .normalizers
            .get(&kind)
            .ok_or_else(|| FormatError::Unsupported(kind.to_string()))?;

        let series = normalizer.read(raw, options, source_id)?;
        finish_series(series, options.fill_value)
    }
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(FormatKind::Delimited, Box::new(delimited::DelimitedNormalizer));
        registry.register(FormatKind::UsgsRdb, Box::new(usgs_rdb::UsgsRdbNormalizer));
        registry.register(FormatKind::Dss, Box::new(dss::DssNormalizer));
        registry
    }
}

/// Parses with the default registry.
pub fn parse(raw: &[u8], kind: FormatKind, options: &FormatOptions, source_id: &str) -> Result<Series, FormatError> {
    NormalizerRegistry::default().parse(raw, kind, options, source_id)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Masks fill values, rejects empty input and restores chronological order.
fn finish_series(mut series: Series, fill_value: Option<f64>) -> Result<Series, FormatError> {
    if let Some(fill) = fill_value {
        let before = series.len();
        series.observations.retain(|o| !is_fill_value(o.flow, fill));
        let masked = before - series.len();
        if masked > 0 {
            debug!(source = %series.source_id, masked, "masked fill values");
        }
    }

    if series.is_empty() {
        return Err(FormatError::NoObservations);
    }

    if !series.is_chronological() {
        warn!(source = %series.source_id, "observations out of order, sorting by timestamp");
        series.sort_chronologically();
    }

    Ok(series)
}

fn is_fill_value(value: f64, fill: f64) -> bool {
    value == fill || (value - fill).abs() <= fill.abs() * 1e-6
}

/// Decodes raw bytes as UTF-8, dropping a leading byte order mark.
pub(crate) fn decode_text(raw: &[u8]) -> Result<&str, FormatError> {
    let text = std::str::from_utf8(raw).map_err(|e| FormatError::Encoding(e.to_string()))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Parses a flow field; blank, non-numeric and non-finite fields are errors.
pub(crate) fn parse_flow(field: &str, line: usize) -> Result<f64, FormatError> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FormatError::InvalidFlow { line, value: field.to_string() })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
