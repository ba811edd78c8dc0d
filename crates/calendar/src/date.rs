//! ISO date parsing and single-day steps.

use chrono::NaiveDate;

use crate::error::CalendarError;

/// Parses a `YYYY-MM-DD` string into a [`NaiveDate`].
///
/// Leading and trailing whitespace is ignored.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidDate`] if the string is not a valid
/// Gregorian calendar date in ISO format.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| CalendarError::InvalidDate {
        input: input.to_string(),
    })
}

/// Returns the day after `date`.
///
/// # Errors
///
/// Returns [`CalendarError::OutOfRange`] at the end of chrono's range.
pub fn next_day(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    date.succ_opt().ok_or(CalendarError::OutOfRange)
}

/// Returns the day before `date`.
///
/// # Errors
///
/// Returns [`CalendarError::OutOfRange`] at the start of chrono's range.
pub fn previous_day(date: NaiveDate) -> Result<NaiveDate, CalendarError> {
    date.pred_opt().ok_or(CalendarError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso() {
        let d = parse_iso_date("2020-03-01").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
    }

    #[test]
    fn parses_with_whitespace() {
        let d = parse_iso_date(" 2020-12-31\n").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_iso_date("03/01/2020"),
            Err(CalendarError::InvalidDate { .. })
        ));
        assert!(matches!(
            parse_iso_date("2021-02-29"),
            Err(CalendarError::InvalidDate { .. })
        ));
        assert!(matches!(
            parse_iso_date(""),
            Err(CalendarError::InvalidDate { .. })
        ));
    }

    #[test]
    fn leap_day_steps() {
        let d = parse_iso_date("2020-02-28").unwrap();
        let leap = next_day(d).unwrap();
        assert_eq!(leap, NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
        assert_eq!(previous_day(leap).unwrap(), d);
    }

    #[test]
    fn range_limits() {
        assert_eq!(next_day(NaiveDate::MAX), Err(CalendarError::OutOfRange));
        assert_eq!(previous_day(NaiveDate::MIN), Err(CalendarError::OutOfRange));
    }
}
