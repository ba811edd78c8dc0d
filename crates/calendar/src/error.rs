//! Error types for the epitrend-calendar crate.

use chrono::NaiveDate;

/// Error type for all fallible operations in the epitrend-calendar crate.
///
/// Covers unparsable date strings, inverted ranges, and broken daily
/// sequences.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    /// Returned when a string is not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid ISO date: {input:?}")]
    InvalidDate {
        /// The string that failed to parse.
        input: String,
    },

    /// Returned when a range ends before it starts.
    #[error("date range is inverted: {start} is after {end}")]
    InvertedRange {
        /// First day of the requested range.
        start: NaiveDate,
        /// Last day of the requested range.
        end: NaiveDate,
    },

    /// Returned when two neighbouring dates are not exactly one day apart.
    #[error("dates are not consecutive at index {index}: {previous} -> {current}")]
    NotConsecutive {
        /// Index of the offending date.
        index: usize,
        /// Date at `index - 1`.
        previous: NaiveDate,
        /// Date at `index`.
        current: NaiveDate,
    },

    /// Returned when stepping a date leaves the representable range.
    #[error("date out of range")]
    OutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn error_invalid_date() {
        let err = CalendarError::InvalidDate {
            input: "2020-13-01".to_string(),
        };
        assert_eq!(err.to_string(), "invalid ISO date: \"2020-13-01\"");
    }

    #[test]
    fn error_inverted_range() {
        let err = CalendarError::InvertedRange {
            start: day(2020, 3, 5),
            end: day(2020, 3, 1),
        };
        assert_eq!(
            err.to_string(),
            "date range is inverted: 2020-03-05 is after 2020-03-01"
        );
    }

    #[test]
    fn error_not_consecutive() {
        let err = CalendarError::NotConsecutive {
            index: 2,
            previous: day(2020, 3, 2),
            current: day(2020, 3, 4),
        };
        assert_eq!(
            err.to_string(),
            "dates are not consecutive at index 2: 2020-03-02 -> 2020-03-04"
        );
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<CalendarError>();
    }
}
