//! Accumulated validation utilities.
//!
//! Provides [`ValidationCollector`] for gathering multiple validation errors
//! into a single [`IoError::Validation`], plus the checks shared by the raw
//! table reader and [`RegionSeries`](crate::RegionSeries).

use epitrend_calendar::NaiveDate;

use crate::error::IoError;

/// Accumulates validation errors and converts them into a single
/// [`IoError::Validation`].
///
/// Create a collector, push zero or more error messages, then call
/// [`finish`](Self::finish) to obtain `Ok(())` when everything is valid or a
/// single `Err` that summarises every violation.
pub(crate) struct ValidationCollector {
    errors: Vec<String>,
}

impl ValidationCollector {
    /// Create an empty collector.
    pub(crate) fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record one validation error.
    pub(crate) fn push(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Appends every error recorded by `other`.
    pub(crate) fn extend(&mut self, other: ValidationCollector) {
        self.errors.extend(other.errors);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.errors.len()
    }

    /// Consume the collector and return `Ok(())` if no errors were recorded,
    /// or `Err(IoError::Validation { count, details })` otherwise.
    ///
    /// The `details` string joins all messages with `"; "`.
    pub(crate) fn finish(self) -> Result<(), IoError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: self.errors.len(),
                details: self.errors.join("; "),
            })
        }
    }
}

/// Checks that a case count is usable: finite and not negative.
///
/// Returns the reason when it is not.
pub(crate) fn check_count(value: f64) -> Option<String> {
    if !value.is_finite() {
        Some(format!("non-finite count {value}"))
    } else if value < 0.0 {
        Some(format!("negative count {value}"))
    } else {
        None
    }
}

/// Checks the invariants of one region's daily series.
pub(crate) fn validate_series(
    region_id: &str,
    dates: &[NaiveDate],
    values: &[f64],
) -> ValidationCollector {
    let mut c = ValidationCollector::new();

    if region_id.trim().is_empty() {
        c.push("region id is empty");
    }
    if dates.is_empty() {
        c.push(format!("region '{region_id}' has no days"));
    }
    if dates.len() != values.len() {
        c.push(format!(
            "region '{region_id}': {} dates but {} values",
            dates.len(),
            values.len()
        ));
    }
    if let Err(e) = epitrend_calendar::check_consecutive(dates) {
        c.push(format!("region '{region_id}': {e}"));
    }
    for (i, &v) in values.iter().enumerate() {
        if let Some(reason) = check_count(v) {
            c.push(format!("region '{region_id}' index {i}: {reason}"));
        }
    }

    c
}
