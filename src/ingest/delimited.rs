/// Generic delimited hydrographs (CSV, TSV, semicolon files, ...).
///
/// The first non-blank line is the header. The datetime and flow columns
/// are picked by zero-based index and the flow column's header becomes the
/// series' flow label. Timestamps carry no per-row zone: they are taken as
/// written, naive unless the text itself includes a UTC offset.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use super::{FormatOptions, Normalizer, decode_text, parse_flow};
use crate::error::FormatError;
use crate::model::{Observation, Series, Timestamp};

pub struct DelimitedNormalizer;

impl Normalizer for DelimitedNormalizer {
    fn read(&self, raw: &[u8], options: &FormatOptions, source_id: &str) -> Result<Series, FormatError> {
        parse_delimited(decode_text(raw)?, options, source_id)
    }
}

/// Parses delimited text into a series. Any malformed row fails the whole
/// parse; nothing is skipped except blank lines.
pub fn parse_delimited(text: &str, options: &FormatOptions, source_id: &str) -> Result<Series, FormatError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or(FormatError::MissingHeader)?;
    let headers = split_fields(header_line, options.sep);

    let flow_label = headers
        .get(options.col_idx_q)
        .ok_or_else(|| FormatError::MissingColumn(format!("flow column index {}", options.col_idx_q)))?
        .clone();
    if headers.get(options.col_idx_dt).is_none() {
        return Err(FormatError::MissingColumn(format!("datetime column index {}", options.col_idx_dt)));
    }
    let needed = options.col_idx_dt.max(options.col_idx_q) + 1;

    let mut pattern: Option<TimestampPattern> = None;
    let mut observations = Vec::new();

    for (line_no, line) in lines {
        let fields = split_fields(line, options.sep);
        if fields.len() < needed {
            return Err(FormatError::FieldCount { line: line_no, expected: needed, found: fields.len() });
        }

        let raw_dt = fields[options.col_idx_dt].as_str();

        // Infer the pattern from the first row, then reuse it; rows that
        // don't fit it get the full search.
        let timestamp = match pattern.and_then(|p| p.parse(raw_dt)) {
            Some(ts) => ts,
            None => {
                let inferred = TimestampPattern::infer(raw_dt)
                    .ok_or_else(|| FormatError::InvalidTimestamp { line: line_no, value: raw_dt.to_string() })?;
                if pattern.is_none() {
                    pattern = Some(inferred);
                }
                inferred
                    .parse(raw_dt)
                    .ok_or_else(|| FormatError::InvalidTimestamp { line: line_no, value: raw_dt.to_string() })?
            }
        };

        let flow = parse_flow(&fields[options.col_idx_q], line_no)?;
        observations.push(Observation::new(timestamp, flow));
    }

    Ok(Series::new(observations, flow_label, source_id))
}

/// Splits one line on `sep`, trimming fields and honoring double quotes so
/// a quoted field may contain the separator.
pub(crate) fn split_fields(line: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

// ---------------------------------------------------------------------------
// Timestamp inference
// ---------------------------------------------------------------------------

/// Wall-clock layouts, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Layouts with an explicit UTC offset, besides RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// HEC-DSS exports write times as `01Jan2020 2400`, where hour 24 is
/// midnight of the following day.
const HEC_FORMAT: &str = "%d%b%Y %H%M";

/// A timestamp layout recognized in a datetime column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPattern {
    Rfc3339,
    Offset(&'static str),
    Naive(&'static str),
    DateOnly(&'static str),
    Hec,
}

impl TimestampPattern {
    /// Finds the first layout that reads `value`.
    pub fn infer(value: &str) -> Option<Self> {
        let mut candidates = std::iter::once(TimestampPattern::Rfc3339)
            .chain(OFFSET_FORMATS.iter().copied().map(TimestampPattern::Offset))
            .chain(NAIVE_FORMATS.iter().copied().map(TimestampPattern::Naive))
            .chain(std::iter::once(TimestampPattern::Hec))
            .chain(DATE_FORMATS.iter().copied().map(TimestampPattern::DateOnly));

        candidates.find(|p| p.parse(value).is_some())
    }

    pub fn parse(&self, value: &str) -> Option<Timestamp> {
        let value = value.trim();
        match self {
            TimestampPattern::Rfc3339 => DateTime::parse_from_rfc3339(value).ok().map(Timestamp::Zoned),
            TimestampPattern::Offset(fmt) => DateTime::parse_from_str(value, fmt).ok().map(Timestamp::Zoned),
            TimestampPattern::Naive(fmt) => NaiveDateTime::parse_from_str(value, fmt).ok().map(Timestamp::Naive),
            TimestampPattern::DateOnly(fmt) => NaiveDate::parse_from_str(value, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(Timestamp::Naive),
            TimestampPattern::Hec => parse_hec(value).map(Timestamp::Naive),
        }
    }
}

fn parse_hec(value: &str) -> Option<NaiveDateTime> {
    match value.strip_suffix("2400") {
        Some(day) => {
            let midnight = NaiveDateTime::parse_from_str(&format!("{}0000", day), HEC_FORMAT).ok()?;
            midnight.checked_add_signed(Duration::days(1))
        }
        None => NaiveDateTime::parse_from_str(value, HEC_FORMAT).ok(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
