/// Test fixtures: representative hydrograph files in each supported format.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the parsers. The RDB fixtures reflect the layout of
/// the USGS NWIS instantaneous-values service with `format=rdb`:
///
///   # comment preamble (agency disclaimer, parameter descriptions)
///   agency_cd  site_no  datetime  tz_cd  <ts_id>_00060  <ts_id>_00060_cd
///   5s         15s      20d       6s     14n            10s
///   USGS       ...      ...       EST    ...            P
///
/// Note: RDB columns are tab-separated and the second header row holds
/// field width/type descriptors, not data.

/// Three readings three hours apart; the textbook delimited example.
#[cfg(test)]
pub(crate) fn fixture_three_row_csv() -> &'static str {
    "datetime,flow\n\
     2020-01-01T00:00:00,100\n\
     2020-01-01T03:00:00,200\n\
     2020-01-01T06:00:00,50\n"
}

/// HEC-HMS style export: semicolon separated, an ordinal column first and
/// the flow column labelled with its unit.
#[cfg(test)]
pub(crate) fn fixture_semicolon_csv() -> &'static str {
    "ordinate;date;Q (cms)\n\
     1;2019-04-02 00:00:00;3.1\n\
     2;2019-04-02 01:00:00;6.25\n\
     3;2019-04-02 02:00:00;9.4477\n"
}

/// A DSS-derived export where missing values were written as the f32
/// minimum fill value.
#[cfg(test)]
pub(crate) fn fixture_fill_value_csv() -> &'static str {
    "datetime,flow\n\
     2020-01-01T00:00:00,12.0\n\
     2020-01-01T01:00:00,-3.4028234663852886e+38\n\
     2020-01-01T02:00:00,14.0\n"
}

/// Rows written newest first.
#[cfg(test)]
pub(crate) fn fixture_unordered_csv() -> &'static str {
    "datetime,flow\n\
     2020-01-01T02:00:00,30\n\
     2020-01-01T01:00:00,20\n\
     2020-01-01T00:00:00,10\n"
}

/// Illinois River at Valley City, spanning the spring-forward transition:
/// the zone code switches from CST to CDT between rows.
#[cfg(test)]
pub(crate) fn fixture_valley_city_rdb() -> &'static str {
    "# ---------------------------------- WARNING ----------------------------------------\n\
     # Some of the data that you have obtained from this U.S. Geological Survey database\n\
     # may not have received Director's approval.\n\
     #\n\
     # Data for the following 1 site(s) are contained in this file\n\
     #    USGS 05586100 ILLINOIS RIVER AT VALLEY CITY, IL\n\
     #\n\
     #    TS_ID       Parameter Description\n\
     #    69928       00060     Discharge, cubic feet per second\n\
     #\n\
     agency_cd\tsite_no\tdatetime\ttz_cd\t69928_00060\t69928_00060_cd\n\
     5s\t15s\t20d\t6s\t14n\t10s\n\
     USGS\t05586100\t2021-03-14 00:00\tCST\t47100\tP\n\
     USGS\t05586100\t2021-03-14 01:00\tCST\t47300\tP\n\
     USGS\t05586100\t2021-03-14 03:00\tCDT\t47200\tP\n\
     USGS\t05586100\t2021-03-14 04:00\tCDT\t46900\tP\n"
}

/// Two rows from gauges in different zones, stitched into one file.
#[cfg(test)]
pub(crate) fn fixture_mixed_zone_rdb() -> &'static str {
    "# mixed zone sample\n\
     agency_cd\tsite_no\tdatetime\ttz_cd\t12345_00060\t12345_00060_cd\n\
     5s\t15s\t20d\t6s\t14n\t10s\n\
     USGS\t11447650\t2021-07-01 12:00\tPDT\t18000\tP\n\
     USGS\t01646500\t2021-07-01 12:00\tEST\t9500\tA\n"
}

/// Gage height only: no column ends with the discharge parameter code.
#[cfg(test)]
pub(crate) fn fixture_stage_only_rdb() -> &'static str {
    "# stage only\n\
     agency_cd\tsite_no\tdatetime\ttz_cd\t69929_00065\t69929_00065_cd\n\
     5s\t15s\t20d\t6s\t14n\t10s\n\
     USGS\t05586100\t2021-03-14 00:00\tCST\t14.20\tP\n"
}

/// Two discharge time series from the same site (e.g. primary and backup
/// sensors). The first one by column position is the flow column.
#[cfg(test)]
pub(crate) fn fixture_two_discharge_columns_rdb() -> &'static str {
    "agency_cd\tsite_no\tdatetime\ttz_cd\t111_00060\t111_00060_cd\t222_00060\n\
     5s\t15s\t20d\t6s\t14n\t10s\t14n\n\
     USGS\t05586100\t2021-03-14 00:00\tCST\t100\tP\t999\n"
}
