//! Turning raw cumulative rows into gap-filled daily series per region.
//!
//! Steps, per region:
//!
//! 1. sum rows sharing a (region, date) key,
//! 2. lay the cumulative counts on every day of the window, zero where absent,
//! 3. difference against the previous calendar day,
//! 4. mark negative differences as missing,
//! 5. fill missing days with [`interpolate_gaps`].

use std::collections::BTreeMap;

use epitrend_calendar::{NaiveDate, daily_sequence, previous_day};
use tracing::{debug, info};

use crate::error::IoError;
use crate::raw::RawRecord;
use crate::series::RegionSeries;

/// Date window of the generated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesWindow {
    epoch: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl Default for SeriesWindow {
    /// Starts at 2020-03-01 and ends at the last observed date.
    fn default() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(2020, 3, 1),
            end: None,
        }
    }
}

impl SeriesWindow {
    /// Sets the first day; `None` starts at the first observed date.
    pub fn with_epoch(mut self, epoch: Option<NaiveDate>) -> Self {
        self.epoch = epoch;
        self
    }

    /// Sets the last day; `None` ends at the last observed date.
    pub fn with_end(mut self, end: Option<NaiveDate>) -> Self {
        self.end = end;
        self
    }

    /// Configured first day.
    pub fn epoch(&self) -> Option<NaiveDate> {
        self.epoch
    }

    /// Configured last day.
    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }
}

/// Fills `None` entries of `values`.
///
/// Interior runs are interpolated linearly between their valid
/// neighbours, a leading run takes the first valid value, a trailing run
/// takes the last one. When nothing is valid the result is all zeros.
pub fn interpolate_gaps(values: &[Option<f64>]) -> Vec<f64> {
    let valid: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .collect();

    let (Some(&(first_i, first_v)), Some(&(last_i, last_v))) = (valid.first(), valid.last())
    else {
        return vec![0.0; values.len()];
    };

    let mut out = vec![0.0; values.len()];
    out[..first_i].fill(first_v);
    out[last_i..].fill(last_v);
    for pair in valid.windows(2) {
        let (i0, v0) = pair[0];
        let (i1, v1) = pair[1];
        let span = (i1 - i0) as f64;
        for (k, slot) in out[i0..i1].iter_mut().enumerate() {
            *slot = v0 + (v1 - v0) * k as f64 / span;
        }
    }
    out
}

/// Builds one [`RegionSeries`] per region, sorted by region id.
///
/// Every region spans the same window. The first delta uses the cumulative
/// count of the day before the window when the raw data holds it, zero
/// otherwise.
///
/// # Errors
///
/// | Condition | Variant |
/// |-----------|---------|
/// | `records` is empty | [`IoError::EmptyTable`] |
/// | window end before its start | [`IoError::Calendar`] |
/// | a produced series violates its invariants | [`IoError::Validation`] |
pub fn build_region_series(
    records: &[RawRecord],
    window: &SeriesWindow,
) -> Result<Vec<RegionSeries>, IoError> {
    let mut cumulative: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    let mut observed: Option<(NaiveDate, NaiveDate)> = None;
    for r in records {
        *cumulative
            .entry(r.region.as_str())
            .or_default()
            .entry(r.date)
            .or_insert(0.0) += r.cumulative_cases;
        observed = Some(match observed {
            None => (r.date, r.date),
            Some((lo, hi)) => (lo.min(r.date), hi.max(r.date)),
        });
    }
    let Some((first_seen, last_seen)) = observed else {
        return Err(IoError::EmptyTable);
    };

    let start = window.epoch().unwrap_or(first_seen);
    let end = window.end().unwrap_or(last_seen);
    let dates = daily_sequence(start, end)?;
    let before_start = previous_day(start)?;
    info!(
        regions = cumulative.len(),
        %start,
        %end,
        days = dates.len(),
        "building region series"
    );

    let mut out = Vec::with_capacity(cumulative.len());
    for (region, by_date) in &cumulative {
        let mut previous = by_date.get(&before_start).copied().unwrap_or(0.0);
        let mut negatives = 0usize;
        let deltas: Vec<Option<f64>> = dates
            .iter()
            .map(|d| {
                let current = by_date.get(d).copied().unwrap_or(0.0);
                let delta = current - previous;
                previous = current;
                if delta < 0.0 {
                    negatives += 1;
                    None
                } else {
                    Some(delta)
                }
            })
            .collect();
        if negatives > 0 {
            debug!(region = *region, negatives, "negative increments replaced");
        }
        out.push(RegionSeries::new(
            *region,
            dates.clone(),
            interpolate_gaps(&deltas),
        )?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    fn rec(d: u32, region: &str, cases: f64) -> RawRecord {
        RawRecord {
            date: day(d),
            region: region.to_string(),
            cumulative_cases: cases,
        }
    }

    #[test]
    fn interpolate_interior() {
        let out = interpolate_gaps(&[Some(1.0), None, None, Some(4.0)]);
        assert_eq!(out.len(), 4);
        assert_abs_diff_eq!(out[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[2], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[3], 4.0);
    }

    #[test]
    fn interpolate_edges() {
        assert_eq!(
            interpolate_gaps(&[None, None, Some(5.0), Some(6.0), None]),
            vec![5.0, 5.0, 5.0, 6.0, 6.0]
        );
    }

    #[test]
    fn interpolate_all_missing_and_empty() {
        assert_eq!(interpolate_gaps(&[None, None]), vec![0.0, 0.0]);
        assert!(interpolate_gaps(&[]).is_empty());
    }

    #[test]
    fn differences_cumulative_counts() {
        let records = vec![rec(1, "A", 2.0), rec(2, "A", 5.0), rec(3, "A", 9.0)];
        let window = SeriesWindow::default();
        let series = build_region_series(&records, &window).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].new_cases(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn epoch_none_starts_at_first_observation() {
        let records = vec![rec(5, "A", 1.0), rec(6, "A", 3.0)];
        let window = SeriesWindow::default().with_epoch(None);
        let series = build_region_series(&records, &window).unwrap();
        assert_eq!(series[0].start(), day(5));
        assert_eq!(series[0].new_cases(), &[1.0, 2.0]);
    }

    #[test]
    fn inverted_window() {
        let records = vec![rec(5, "A", 1.0)];
        let window = SeriesWindow::default().with_end(Some(NaiveDate::from_ymd_opt(2020, 2, 1).unwrap()));
        let err = build_region_series(&records, &window).unwrap_err();
        assert!(matches!(err, IoError::Calendar { .. }));
    }

    #[test]
    fn empty_records() {
        let err = build_region_series(&[], &SeriesWindow::default()).unwrap_err();
        assert!(matches!(err, IoError::EmptyTable));
    }
}
