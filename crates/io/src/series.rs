//! Validated per-region daily series.

use epitrend_calendar::NaiveDate;

use crate::error::IoError;
use crate::validate::validate_series;

/// Daily new-case counts of one region over consecutive days.
///
/// Constructed only through [`RegionSeries::new`], which enforces:
///
/// - `region_id` is not blank,
/// - at least one day,
/// - `dates` and `new_cases` have equal length,
/// - dates are consecutive days,
/// - every count is finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSeries {
    region_id: String,
    dates: Vec<NaiveDate>,
    new_cases: Vec<f64>,
}

impl RegionSeries {
    /// Builds a series after checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every violated invariant.
    pub fn new(
        region_id: impl Into<String>,
        dates: Vec<NaiveDate>,
        new_cases: Vec<f64>,
    ) -> Result<Self, IoError> {
        let region_id = region_id.into();
        validate_series(&region_id, &dates, &new_cases).finish()?;
        Ok(Self {
            region_id,
            dates,
            new_cases,
        })
    }

    /// Region identifier.
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// Days of the series, oldest first.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// New cases per day.
    pub fn new_cases(&self) -> &[f64] {
        &self.new_cases
    }

    /// Number of days `T`.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First day.
    pub fn start(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Last day.
    pub fn end(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Model observations `ln(1 + new_cases[t])`.
    pub fn log_observations(&self) -> Vec<f64> {
        self.new_cases.iter().map(|c| c.ln_1p()).collect()
    }

    /// `true` when every count is zero.
    ///
    /// Such a series is still fitted, but its trend carries no information.
    pub fn is_degenerate(&self) -> bool {
        self.new_cases.iter().all(|&c| c == 0.0)
    }
}
