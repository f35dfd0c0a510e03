/// Observation, Series, StatisticsResult
/// core data structures shared by the ingest, analysis and sink layers
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O: only types and the small amount of logic needed to
/// order and render timestamps.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Parameter codes
// ---------------------------------------------------------------------------

/// USGS parameter code for discharge (streamflow), in cubic feet per second.
pub const PARAM_DISCHARGE: &str = "00060";

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// A point in time as it appeared in the source.
///
/// Delimited files carry no zone information unless the column itself is
/// written with an offset, so most of their timestamps are `Naive`. USGS RDB
/// rows carry a `tz_cd` code and become `Zoned` once localized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl Timestamp {
    /// The absolute instant used for ordering and window arithmetic.
    ///
    /// Naive timestamps are read as UTC wall-clock so a series that mixes
    /// naive and zoned rows still has a total order.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            Timestamp::Naive(naive) => naive.and_utc(),
            Timestamp::Zoned(zoned) => zoned.with_timezone(&Utc),
        }
    }

    pub fn is_zoned(&self) -> bool {
        matches!(self, Timestamp::Zoned(_))
    }

    /// ISO 8601 rendering, e.g. `2020-01-01T03:00:00` or
    /// `2021-07-01T12:15:00-07:00`. A non-zero fraction is written as six
    /// digits of microseconds (`.500000`).
    pub fn to_iso8601(&self) -> String {
        match self {
            Timestamp::Naive(naive) if naive.nanosecond() == 0 => naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Timestamp::Naive(naive) => naive.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            Timestamp::Zoned(zoned) if zoned.nanosecond() == 0 => zoned.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            Timestamp::Zoned(zoned) => zoned.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

// ---------------------------------------------------------------------------
// Series types
// ---------------------------------------------------------------------------

/// A single discharge measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp: Timestamp,
    pub flow: f64,
}

impl Observation {
    pub fn new(timestamp: Timestamp, flow: f64) -> Self {
        Self { timestamp, flow }
    }
}

/// A hydrograph: chronologically ordered observations plus where they came
/// from and what quantity they measure.
///
/// The ingest layer only hands out series with at least one observation;
/// the statistics engine still rejects empty ones on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub observations: Vec<Observation>,
    /// Header of the flow column, e.g. `"flow"` or `"69928_00060"`.
    pub flow_label: String,
    /// Locator the raw bytes were fetched from.
    pub source_id: String,
}

impl Series {
    pub fn new(observations: Vec<Observation>, flow_label: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            observations,
            flow_label: flow_label.into(),
            source_id: source_id.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// True when instants never decrease from one observation to the next.
    pub fn is_chronological(&self) -> bool {
        self.observations
            .windows(2)
            .all(|pair| pair[0].timestamp.instant() <= pair[1].timestamp.instant())
    }

    /// Stable sort by instant; duplicate timestamps keep their source order.
    pub fn sort_chronologically(&mut self) {
        self.observations.sort_by_key(|o| o.timestamp.instant());
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Summary statistics for one hydrograph.
///
/// Field names follow the JSON record consumed downstream, so the
/// rolling-window fields serialize as `duration_*`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsResult {
    pub max: f64,
    #[serde(rename = "max_datetime")]
    pub max_at: Timestamp,
    pub min: f64,
    #[serde(rename = "min_datetime")]
    pub min_at: Timestamp,
    pub avg: f64,
    #[serde(rename = "duration")]
    pub window_duration: String,
    #[serde(rename = "duration_max")]
    pub window_max: f64,
    #[serde(rename = "duration_max_datetime")]
    pub window_max_at: Timestamp,
    #[serde(rename = "duration_min")]
    pub window_min: f64,
    #[serde(rename = "duration_min_datetime")]
    pub window_min_at: Timestamp,
    #[serde(rename = "hydrograph")]
    pub source_id: String,
}

/// A hydrograph that could not be fetched, parsed or analyzed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFailure {
    pub hydrograph: String,
    pub error: String,
}

/// Per-source outcome of a batch run, kept in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesOutcome {
    Analyzed(StatisticsResult),
    Failed(SeriesFailure),
}

impl SeriesOutcome {
    pub fn hydrograph(&self) -> &str {
        match self {
            SeriesOutcome::Analyzed(result) => &result.source_id,
            SeriesOutcome::Failed(failure) => &failure.hydrograph,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SeriesOutcome::Failed(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
