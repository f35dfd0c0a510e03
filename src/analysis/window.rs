/// Rolling-window durations.
///
/// Durations are written the way hydrologists pass them to pandas
/// (`"3H"`, `"90min"`, `"1D"`) or spelled out (`"3 hours"`). The text is
/// kept verbatim because it is echoed back in every result record.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::error::WindowError;

/// Default window when neither configuration nor CLI names one.
pub const DEFAULT_WINDOW: &str = "3H";

/// A positive trailing window. The window ending at `t` covers `(t - d, t]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingWindow {
    label: String,
    duration: Duration,
}

impl RollingWindow {
    /// Parses a duration such as `3H`, `90min`, `30S`, `1D`, `500ms`,
    /// `3 hours` or `2 hrs`. A missing number means one unit (`H` is an
    /// hour); a missing unit is an error.
    pub fn parse(input: &str) -> Result<Self, WindowError> {
        let invalid = |reason: &str| WindowError {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let text = input.trim();
        if text.is_empty() {
            return Err(invalid("empty duration"));
        }

        let split = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(text.len());
        let (number, unit) = text.split_at(split);
        let unit = unit.trim();

        let count: f64 = if number.is_empty() {
            1.0
        } else {
            number.parse().map_err(|_| invalid("not a number"))?
        };
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }

        let unit_ms = unit_millis(unit).ok_or_else(|| invalid(&format!("unknown unit '{unit}'")))?;
        let millis = (count * unit_ms as f64).round();
        if millis <= 0.0 {
            return Err(invalid("duration must be positive"));
        }
        if millis > i64::MAX as f64 {
            return Err(invalid("duration out of range"));
        }

        let duration = Duration::try_milliseconds(millis as i64).ok_or_else(|| invalid("duration out of range"))?;

        Ok(Self { label: input.to_string(), duration })
    }

    /// The duration string exactly as given.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self {
            label: DEFAULT_WINDOW.to_string(),
            duration: Duration::hours(3),
        }
    }
}

impl FromStr for RollingWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RollingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Unit aliases: pandas offset aliases plus spelled-out English units.
fn unit_millis(unit: &str) -> Option<i64> {
    // "ms" and "min" must be matched before the single-letter aliases
    let ms = match unit.to_ascii_lowercase().as_str() {
        "ms" | "l" | "milli" | "millis" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => MILLIS_PER_SECOND,
        "t" | "min" | "mins" | "minute" | "minutes" => MILLIS_PER_MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => MILLIS_PER_HOUR,
        "d" | "day" | "days" => MILLIS_PER_DAY,
        _ => return None,
    };
    Some(ms)
}
