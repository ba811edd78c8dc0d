//! Inclusive daily date ranges and gap checks.

use chrono::NaiveDate;

use crate::error::CalendarError;

/// Number of calendar days in `[start, end]`, inclusive.
///
/// Returns 0 when `end` is before `start`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> usize {
    let span = (end - start).num_days();
    if span < 0 { 0 } else { span as usize + 1 }
}

/// Generates every calendar day from `start` to `end`, inclusive.
///
/// Month and year boundaries (including 29 February) follow the
/// proleptic Gregorian calendar.
///
/// # Errors
///
/// Returns [`CalendarError::InvertedRange`] if `end < start`.
///
/// # Example
///
/// ```ignore
/// let start = NaiveDate::from_ymd_opt(2020, 2, 27).unwrap();
/// let end = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
/// let days = daily_sequence(start, end)?;
/// // Feb 27, Feb 28, Feb 29, Mar 1
/// assert_eq!(days.len(), 4);
/// ```
pub fn daily_sequence(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, CalendarError> {
    if end < start {
        return Err(CalendarError::InvertedRange { start, end });
    }
    Ok(start.iter_days().take(days_inclusive(start, end)).collect())
}

/// Checks that every neighbouring pair in `dates` is exactly one day apart.
///
/// Empty and single-element slices are trivially consecutive.
///
/// # Errors
///
/// Returns [`CalendarError::NotConsecutive`] at the first gap, duplicate,
/// or backwards step.
pub fn check_consecutive(dates: &[NaiveDate]) -> Result<(), CalendarError> {
    for (i, pair) in dates.windows(2).enumerate() {
        if (pair[1] - pair[0]).num_days() != 1 {
            return Err(CalendarError::NotConsecutive {
                index: i + 1,
                previous: pair[0],
                current: pair[1],
            });
        }
    }
    Ok(())
}
