//! # epitrend-calendar
//!
//! Daily Gregorian date arithmetic on top of [`chrono::NaiveDate`].
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["\"2020-03-01\""] -->|"parse_iso_date()"| B["NaiveDate"]
//!     B -->|"daily_sequence(start, end)"| C["Vec of NaiveDate"]
//!     C -->|"check_consecutive()"| D["Ok / gap error"]
//!     B -->|"previous_day()"| B
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use epitrend_calendar::{daily_sequence, parse_iso_date};
//!
//! let start = parse_iso_date("2020-03-01")?;
//! let end = parse_iso_date("2020-03-07")?;
//! let days = daily_sequence(start, end)?;
//! assert_eq!(days.len(), 7);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `date` | ISO parsing and single-day steps |
//! | `sequence` | Inclusive daily ranges and gap checks |
//! | `error` | Error types |

mod date;
mod error;
mod sequence;

pub use chrono::NaiveDate;
pub use date::{next_day, parse_iso_date, previous_day};
pub use error::CalendarError;
pub use sequence::{check_consecutive, daily_sequence, days_inclusive};
