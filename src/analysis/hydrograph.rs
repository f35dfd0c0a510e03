/// Hydrograph statistics engine.
///
/// Computes the peak, trough and mean of a discharge series together with
/// the peak and trough of its trailing time-window mean. Pure computation:
/// no I/O, no logging beyond trace-level detail.
///
/// # Rolling mean
///
/// The window ending at observation `i` holds every observation `j` with
/// `t[i] - d < t[j] <= t[i]`. Windows are found with a two-pointer sweep
/// over the (chronologically ordered) instants, and the window sum is kept
/// as a compensated running sum so long series do not drift.

use chrono::{DateTime, Utc};
use tracing::trace;

use super::window::RollingWindow;
use crate::error::StatsError;
use crate::model::{Series, StatisticsResult};

/// Analyzes one hydrograph.
///
/// # Errors
/// `StatsError::EmptySeries` if `series` holds no observations.
pub fn analyze(series: &Series, window: &RollingWindow) -> Result<StatisticsResult, StatsError> {
    if series.is_empty() {
        return Err(StatsError::EmptySeries);
    }

    let flows: Vec<f64> = series.observations.iter().map(|o| o.flow).collect();
    let (max_idx, min_idx) = extrema(&flows).ok_or(StatsError::EmptySeries)?;

    let mut total = NeumaierSum::default();
    for &flow in &flows {
        total.add(flow);
    }
    let avg = total.value() / flows.len() as f64;

    let instants: Vec<DateTime<Utc>> = series.observations.iter().map(|o| o.timestamp.instant()).collect();
    let means = rolling_means(&instants, &flows, window);
    let (wmax_idx, wmin_idx) = extrema(&means).ok_or(StatsError::EmptySeries)?;

    trace!(
        source = %series.source_id,
        observations = flows.len(),
        max_idx,
        min_idx,
        "analyzed hydrograph"
    );

    let obs = &series.observations;
    Ok(StatisticsResult {
        max: flows[max_idx],
        max_at: obs[max_idx].timestamp,
        min: flows[min_idx],
        min_at: obs[min_idx].timestamp,
        avg,
        window_duration: window.label().to_string(),
        window_max: means[wmax_idx],
        window_max_at: obs[wmax_idx].timestamp,
        window_min: means[wmin_idx],
        window_min_at: obs[wmin_idx].timestamp,
        source_id: series.source_id.clone(),
    })
}

/// Trailing time-window means, one per observation.
///
/// `instants` must be non-decreasing and the same length as `flows`.
pub fn rolling_means(instants: &[DateTime<Utc>], flows: &[f64], window: &RollingWindow) -> Vec<f64> {
    let span = window.duration();
    let mut means = Vec::with_capacity(flows.len());
    let mut sum = NeumaierSum::default();
    let mut left = 0;

    for (right, (&t, &flow)) in instants.iter().zip(flows).enumerate() {
        sum.add(flow);

        // Evict observations at or before t - d. The window is never empty:
        // t[right] > t[right] - d for any positive d.
        // A span reaching past the representable range evicts nothing.
        if let Some(cutoff) = t.checked_sub_signed(span) {
            while left < right && instants[left] <= cutoff {
                sum.add(-flows[left]);
                left += 1;
            }
        }

        let count = right - left + 1;
        if count == 1 {
            // Exact, and clears any residue left by evictions.
            sum = NeumaierSum::default();
            sum.add(flow);
            means.push(flow);
        } else {
            means.push(sum.value() / count as f64);
        }
    }

    means
}

/// Indices of the first maximum and first minimum of `values`.
fn extrema(values: &[f64]) -> Option<(usize, usize)> {
    let first = *values.first()?;
    let (mut max_idx, mut min_idx) = (0, 0);
    let (mut max, mut min) = (first, first);

    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > max {
            max = value;
            max_idx = idx;
        }
        if value < min {
            min = value;
            min_idx = idx;
        }
    }

    Some((max_idx, min_idx))
}

/// Kahan-Babuska (Neumaier) compensated summation.
#[derive(Debug, Default, Clone, Copy)]
struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Observation, Timestamp};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    /// Builds a series from (hours after midnight, flow) pairs.
    fn series_at_hours(points: &[(i64, f64)]) -> Series {
        let observations = points
            .iter()
            .map(|&(h, q)| Observation::new(Timestamp::Naive(base() + Duration::hours(h)), q))
            .collect();
        Series::new(observations, "flow", "test.csv")
    }

    fn window(s: &str) -> RollingWindow {
        RollingWindow::parse(s).unwrap()
    }

    #[test]
    fn test_three_row_example() {
        let series = series_at_hours(&[(0, 100.0), (3, 200.0), (6, 50.0)]);
        let result = analyze(&series, &window("3H")).unwrap();

        assert_eq!(result.max, 200.0);
        assert_eq!(result.max_at.to_iso8601(), "2020-01-01T03:00:00");
        assert_eq!(result.min, 50.0);
        assert_eq!(result.min_at.to_iso8601(), "2020-01-01T06:00:00");
        assert!((result.avg - 116.666_666_666_666_67).abs() < 1e-9);

        // Readings are exactly 3 hours apart, so each window holds one value.
        assert_eq!(result.window_max, 200.0);
        assert_eq!(result.window_max_at, result.max_at);
        assert_eq!(result.window_min, 50.0);
        assert_eq!(result.window_duration, "3H");
        assert_eq!(result.source_id, "test.csv");
    }

    #[test]
    fn test_window_longer_than_the_calendar_keeps_everything() {
        // t - d falls before the earliest representable instant.
        let series = series_at_hours(&[(0, 100.0), (1, 200.0)]);
        let result = analyze(&series, &window("100000000D")).unwrap();

        assert_eq!(result.window_max, 150.0);
        assert_eq!(result.window_max_at.to_iso8601(), "2020-01-01T01:00:00");
        assert_eq!(result.window_min, 100.0);
        assert_eq!(result.window_duration, "100000000D");
    }

    #[test]
    fn test_window_mean_over_overlapping_readings() {
        // Hourly readings, 2-hour window: (t-2h, t] holds two readings.
        let series = series_at_hours(&[(0, 10.0), (1, 20.0), (2, 30.0), (3, 40.0)]);
        let result = analyze(&series, &window("2H")).unwrap();

        assert_eq!(result.window_min, 10.0);
        assert_eq!(result.window_min_at.to_iso8601(), "2020-01-01T00:00:00");
        assert_eq!(result.window_max, 35.0);
        assert_eq!(result.window_max_at.to_iso8601(), "2020-01-01T03:00:00");
    }

    #[test]
    fn test_window_left_edge_is_open() {
        let series = series_at_hours(&[(0, 100.0), (3, 0.0)]);
        let instants: Vec<_> = series.observations.iter().map(|o| o.timestamp.instant()).collect();
        let flows = [100.0, 0.0];

        // Exactly 3 hours back is excluded from a 3H window...
        assert_eq!(rolling_means(&instants, &flows, &window("3H")), vec![100.0, 0.0]);
        // ...but included once the window is a second longer.
        assert_eq!(rolling_means(&instants, &flows, &window("10801S")), vec![100.0, 50.0]);
    }

    #[test]
    fn test_ties_resolve_to_first_occurrence() {
        let series = series_at_hours(&[(0, 5.0), (1, 9.0), (2, 1.0), (3, 9.0), (4, 1.0)]);
        let result = analyze(&series, &window("30min")).unwrap();
        assert_eq!(result.max_at.to_iso8601(), "2020-01-01T01:00:00");
        assert_eq!(result.min_at.to_iso8601(), "2020-01-01T02:00:00");
        assert_eq!(result.window_max_at.to_iso8601(), "2020-01-01T01:00:00");
    }

    #[test]
    fn test_duplicate_timestamps_share_a_window() {
        let series = series_at_hours(&[(0, 10.0), (0, 30.0)]);
        let instants: Vec<_> = series.observations.iter().map(|o| o.timestamp.instant()).collect();
        let means = rolling_means(&instants, &[10.0, 30.0], &window("1H"));
        assert_eq!(means, vec![10.0, 20.0]);
    }

    #[test]
    fn test_single_observation() {
        let series = series_at_hours(&[(0, 42.5)]);
        let result = analyze(&series, &window("3H")).unwrap();
        assert_eq!(result.max, 42.5);
        assert_eq!(result.min, 42.5);
        assert_eq!(result.avg, 42.5);
        assert_eq!(result.window_max, 42.5);
        assert_eq!(result.window_min, 42.5);
        assert_eq!(result.max_at, result.min_at);
    }

    #[test]
    fn test_empty_series_is_rejected() {
        let series = Series::new(Vec::new(), "flow", "empty.csv");
        assert_eq!(analyze(&series, &window("3H")), Err(StatsError::EmptySeries));
    }

    #[test]
    fn test_fill_value_shows_up_as_minimum() {
        let fill = f32::MIN as f64;
        let series = series_at_hours(&[(0, 12.0), (1, fill), (2, 14.0)]);
        let result = analyze(&series, &window("3H")).unwrap();
        assert_eq!(result.min, fill);
    }

    #[test]
    fn test_compensated_sum_cancels_large_magnitudes() {
        let mut sum = NeumaierSum::default();
        for v in [1e100, 1.0, -1e100] {
            sum.add(v);
        }
        assert_eq!(sum.value(), 1.0);
    }

    fn flows_strategy() -> impl Strategy<Value = Vec<(i64, f64)>> {
        prop::collection::vec((0i64..120, -1.0e6f64..1.0e6), 1..60).prop_map(|mut points| {
            // Minute offsets, sorted so the series is chronological.
            points.sort_by_key(|&(m, _)| m);
            points
        })
    }

    fn series_at_minutes(points: &[(i64, f64)]) -> Series {
        let observations = points
            .iter()
            .map(|&(m, q)| Observation::new(Timestamp::Naive(base() + Duration::minutes(m)), q))
            .collect();
        Series::new(observations, "flow", "prop.csv")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_extrema_bound_every_value(points in flows_strategy(), minutes in 1i64..240) {
            let series = series_at_minutes(&points);
            let result = analyze(&series, &window(&format!("{minutes}min"))).unwrap();
            for obs in &series.observations {
                prop_assert!(result.max >= obs.flow);
                prop_assert!(result.min <= obs.flow);
            }
            prop_assert!(result.min <= result.avg + 1e-6 && result.avg <= result.max + 1e-6);
            prop_assert!(result.window_max <= result.max + 1e-6);
            prop_assert!(result.window_min >= result.min - 1e-6);
        }

        #[test]
        fn prop_window_longer_than_span_ends_at_global_mean(points in flows_strategy()) {
            let series = series_at_minutes(&points);
            let instants: Vec<_> = series.observations.iter().map(|o| o.timestamp.instant()).collect();
            let flows: Vec<f64> = points.iter().map(|&(_, q)| q).collect();
            let means = rolling_means(&instants, &flows, &window("1D"));
            let result = analyze(&series, &window("1D")).unwrap();
            let last = *means.last().unwrap();
            prop_assert!((last - result.avg).abs() <= 1e-6 * result.avg.abs().max(1.0));
        }

        #[test]
        fn prop_single_observation_is_exact(flow in -1.0e12f64..1.0e12) {
            let series = series_at_minutes(&[(0, flow)]);
            let result = analyze(&series, &window("3H")).unwrap();
            prop_assert_eq!(result.max, flow);
            prop_assert_eq!(result.min, flow);
            prop_assert_eq!(result.avg, flow);
            prop_assert_eq!(result.window_max, flow);
            prop_assert_eq!(result.window_min, flow);
        }
    }
}
