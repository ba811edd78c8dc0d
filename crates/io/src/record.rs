//! Rows of the result table.

use epitrend_calendar::NaiveDate;

/// Estimated fractional day-over-day growth of one region on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRecord {
    /// Region identifier.
    pub region_id: String,
    /// Day the estimate refers to.
    pub date: NaiveDate,
    /// Posterior mean of `exp(slope) - 1`.
    pub trend: f64,
}

impl TrendRecord {
    /// Creates a record.
    pub fn new(region_id: impl Into<String>, date: NaiveDate, trend: f64) -> Self {
        Self {
            region_id: region_id.into(),
            date,
            trend,
        }
    }
}
