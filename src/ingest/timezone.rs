/// USGS time zone codes (`tz_cd`) and timestamp localization.
///
/// Every RDB data row carries its own zone code, so a series that spans a
/// daylight saving transition switches from e.g. `CST` to `CDT` mid-file.
/// The code already says whether daylight time is in effect, so the offset
/// is taken from the code itself rather than re-derived from the IANA rules.
/// That keeps the repeated hour at the autumn transition unambiguous.

use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use tracing::debug;

use crate::model::Timestamp;

/// One entry of the zone code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsZone {
    pub code: &'static str,
    /// IANA identifier of the zone the code belongs to.
    pub iana: &'static str,
    /// Offset east of UTC, in seconds (negative for all US zones).
    pub utc_offset_secs: i32,
}

impl UsZone {
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_secs)
    }
}

const HOUR: i32 = 3600;

/// Zone codes used by NWIS for the continental US, Alaska, Hawaii and the
/// Caribbean territories. Each code appears exactly once.
pub static US_ZONES: &[UsZone] = &[
    UsZone { code: "EST", iana: "America/New_York", utc_offset_secs: -5 * HOUR },
    UsZone { code: "EDT", iana: "America/New_York", utc_offset_secs: -4 * HOUR },
    UsZone { code: "CST", iana: "America/Chicago", utc_offset_secs: -6 * HOUR },
    UsZone { code: "CDT", iana: "America/Chicago", utc_offset_secs: -5 * HOUR },
    UsZone { code: "MST", iana: "America/Denver", utc_offset_secs: -7 * HOUR },
    UsZone { code: "MDT", iana: "America/Denver", utc_offset_secs: -6 * HOUR },
    UsZone { code: "PST", iana: "America/Los_Angeles", utc_offset_secs: -8 * HOUR },
    UsZone { code: "PDT", iana: "America/Los_Angeles", utc_offset_secs: -7 * HOUR },
    UsZone { code: "AKST", iana: "America/Anchorage", utc_offset_secs: -9 * HOUR },
    UsZone { code: "AKDT", iana: "America/Anchorage", utc_offset_secs: -8 * HOUR },
    UsZone { code: "HST", iana: "America/Honolulu", utc_offset_secs: -10 * HOUR },
    UsZone { code: "HDT", iana: "America/Honolulu", utc_offset_secs: -9 * HOUR },
    UsZone { code: "AST", iana: "America/Puerto_Rico", utc_offset_secs: -4 * HOUR },
    UsZone { code: "ADT", iana: "America/Puerto_Rico", utc_offset_secs: -3 * HOUR },
    UsZone { code: "UTC", iana: "Etc/UTC", utc_offset_secs: 0 },
    UsZone { code: "GMT", iana: "Etc/UTC", utc_offset_secs: 0 },
];

/// Looks up a zone code, ignoring case and surrounding whitespace.
pub fn find_zone(code: &str) -> Option<&'static UsZone> {
    let code = code.trim();
    US_ZONES.iter().find(|z| z.code.eq_ignore_ascii_case(code))
}

/// Attaches the offset named by `zone_code` to a wall-clock timestamp.
///
/// The offset comes from the code alone, not from the zone's calendar:
/// an `EST` row in July renders as `-05:00`, not the `-04:00` a full IANA
/// zone lookup would give. USGS codes already say whether daylight time
/// applies. Unknown or absent codes leave the timestamp naive instead of
/// failing.
pub fn localize(naive: NaiveDateTime, zone_code: Option<&str>) -> Timestamp {
    let zone = match zone_code.filter(|c| !c.trim().is_empty()) {
        Some(code) => match find_zone(code) {
            Some(zone) => zone,
            None => {
                debug!(code, "unrecognized time zone code, leaving timestamp naive");
                return Timestamp::Naive(naive);
            }
        },
        None => return Timestamp::Naive(naive),
    };

    // A fixed offset maps every wall-clock time to exactly one instant.
    match zone.offset().map(|offset| offset.from_local_datetime(&naive).single()) {
        Some(Some(zoned)) => Timestamp::Zoned(zoned),
        _ => Timestamp::Naive(naive),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
