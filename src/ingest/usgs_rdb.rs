/// USGS NWIS RDB hydrograph parser
///
/// Parses instantaneous discharge values from the NWIS RDB export.
/// Format: Tab-delimited RDB (Research Data BYte-stream)
/// Source: https://waterservices.usgs.gov/nwis/iv/?sites={site}&parameterCd=00060&format=rdb
///
/// Unlike the delimited format, every data row names its own time zone in
/// the `tz_cd` column, so a single file can hold rows in standard and
/// daylight time (or, when files are stitched together, different zones).

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::timezone::localize;
use super::{FormatOptions, Normalizer, decode_text, parse_flow};
use crate::error::FormatError;
use crate::model::{Observation, PARAM_DISCHARGE, Series};

pub const RDB_SEP: char = '\t';
pub const COL_DATETIME: &str = "datetime";
pub const COL_TZ: &str = "tz_cd";

/// Layouts seen in the NWIS `datetime` column (IV and DV services).
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct UsgsRdbNormalizer;

impl Normalizer for UsgsRdbNormalizer {
    fn read(&self, raw: &[u8], _options: &FormatOptions, source_id: &str) -> Result<Series, FormatError> {
        parse_rdb(decode_text(raw)?, source_id)
    }
}

/// Parse USGS RDB format
///
/// RDB format structure:
/// - Lines starting with '#' are comments (metadata header)
/// - First non-comment line: tab-delimited column names
/// - Second non-comment line: tab-delimited format descriptors (e.g., "5s", "20d")
/// - Remaining lines: tab-delimited data rows
///
/// Key fields:
/// - datetime: local wall-clock time (YYYY-MM-DD HH:MM)
/// - tz_cd: zone code for that row (EST, CDT, ...)
/// - <ts_id>_00060: discharge (cfs); the first column ending in 00060 is used
///
/// # Errors
/// - `FormatError::MissingFlowColumn` when no header ends with 00060
/// - `FormatError::MissingColumn` when there is no `datetime` column
/// - row-level timestamp/flow errors fail the whole parse
pub fn parse_rdb(rdb_text: &str, source_id: &str) -> Result<Series, FormatError> {
    // Skip comment lines (start with #)
    let mut data_lines = rdb_text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim_start().starts_with('#') && !line.trim().is_empty());

    // First non-comment line: column headers
    let (_, header_line) = data_lines.next().ok_or(FormatError::MissingHeader)?;
    let headers: Vec<&str> = header_line.split(RDB_SEP).map(str::trim).collect();

    // Build column index map; the first occurrence of a name wins
    let mut col_map: HashMap<&str, usize> = HashMap::new();
    for (idx, &header) in headers.iter().enumerate() {
        col_map.entry(header).or_insert(idx);
    }

    let flow_idx = find_flow_column(&headers)
        .ok_or_else(|| FormatError::MissingFlowColumn(PARAM_DISCHARGE.to_string()))?;
    let dt_idx = *col_map
        .get(COL_DATETIME)
        .ok_or_else(|| FormatError::MissingColumn(COL_DATETIME.to_string()))?;
    let tz_idx = col_map.get(COL_TZ).copied();

    // Second non-comment line: format descriptors (skip)
    data_lines.next().ok_or(FormatError::MissingFormatLine)?;

    let needed = dt_idx.max(flow_idx) + 1;
    let mut observations = Vec::new();

    for (line_no, line) in data_lines {
        let fields: Vec<&str> = line.split(RDB_SEP).collect();
        if fields.len() < needed {
            return Err(FormatError::FieldCount { line: line_no, expected: needed, found: fields.len() });
        }

        let raw_dt = fields[dt_idx].trim();
        let naive = parse_rdb_datetime(raw_dt)
            .ok_or_else(|| FormatError::InvalidTimestamp { line: line_no, value: raw_dt.to_string() })?;

        // Optional zone code; rows without one stay naive
        let zone_code = tz_idx.and_then(|idx| fields.get(idx)).map(|s| s.trim());
        let timestamp = localize(naive, zone_code);

        let flow = parse_flow(fields[flow_idx], line_no)?;
        observations.push(Observation::new(timestamp, flow));
    }

    Ok(Series::new(observations, headers[flow_idx], source_id))
}

/// Index of the first header ending with the discharge parameter code.
pub fn find_flow_column(headers: &[&str]) -> Option<usize> {
    headers.iter().position(|h| h.ends_with(PARAM_DISCHARGE))
}

fn parse_rdb_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            // Daily values carry a bare date
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
