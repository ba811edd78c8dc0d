//! Parsing of the raw cumulative case table.
//!
//! The table is CSV with one row per (date, region) and a cumulative case
//! count. Extra columns are ignored. Every column is read as text so that
//! malformed cells are reported per row instead of failing type inference.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{Array, AsArray, RecordBatch, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use epitrend_calendar::{NaiveDate, parse_iso_date};
use tracing::debug;

use crate::error::IoError;
use crate::validate::{ValidationCollector, check_count};

/// Names of the columns holding the date, region, and cumulative count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumns {
    date: String,
    region: String,
    cases: String,
}

impl Default for RawColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            region: "state".to_string(),
            cases: "cases".to_string(),
        }
    }
}

impl RawColumns {
    /// Sets the date column name.
    pub fn with_date(mut self, name: impl Into<String>) -> Self {
        self.date = name.into();
        self
    }

    /// Sets the region column name.
    pub fn with_region(mut self, name: impl Into<String>) -> Self {
        self.region = name.into();
        self
    }

    /// Sets the cumulative count column name.
    pub fn with_cases(mut self, name: impl Into<String>) -> Self {
        self.cases = name.into();
        self
    }

    /// Date column name.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Region column name.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Cumulative count column name.
    pub fn cases(&self) -> &str {
        &self.cases
    }
}

/// One row of the raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Reporting day.
    pub date: NaiveDate,
    /// Region identifier, trimmed.
    pub region: String,
    /// Cumulative confirmed cases as of `date`.
    pub cumulative_cases: f64,
}

/// Parses CSV bytes into raw records.
///
/// Rows keep their order. Every malformed row is reported; nothing is
/// returned unless all rows are valid.
///
/// # Errors
///
/// | Condition | Variant |
/// |-----------|---------|
/// | header lacks a configured column | [`IoError::MissingColumn`] |
/// | no data rows | [`IoError::EmptyTable`] |
/// | bad date, empty region, bad count | [`IoError::Validation`] |
/// | CSV structure broken | [`IoError::Arrow`] |
pub fn read_raw_table(bytes: &[u8], columns: &RawColumns) -> Result<Vec<RawRecord>, IoError> {
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(bytes), Some(1))?;
    let schema = Arc::new(Schema::new(
        inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    for name in [columns.date(), columns.region(), columns.cases()] {
        if schema.index_of(name).is_err() {
            return Err(IoError::MissingColumn {
                name: name.to_string(),
                available: schema
                    .fields()
                    .iter()
                    .map(|f| f.name().as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    }

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .build(Cursor::new(bytes))?;

    let mut records = Vec::new();
    let mut collector = ValidationCollector::new();
    let mut row = 0usize;
    for batch in reader {
        let batch = batch?;
        parse_batch(&batch, columns, &mut row, &mut records, &mut collector)?;
    }

    if row == 0 {
        return Err(IoError::EmptyTable);
    }
    collector.finish()?;

    debug!(rows = records.len(), "parsed raw table");
    Ok(records)
}

fn text_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, IoError> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_string_opt::<i32>())
        .ok_or_else(|| IoError::Arrow {
            reason: format!("column '{name}' is not text"),
        })
}

fn parse_batch(
    batch: &RecordBatch,
    columns: &RawColumns,
    row: &mut usize,
    records: &mut Vec<RawRecord>,
    collector: &mut ValidationCollector,
) -> Result<(), IoError> {
    let dates = text_column(batch, columns.date())?;
    let regions = text_column(batch, columns.region())?;
    let cases = text_column(batch, columns.cases())?;

    for i in 0..batch.num_rows() {
        *row += 1;
        let line = *row;

        let date = if dates.is_null(i) {
            collector.push(format!("row {line}: missing date"));
            None
        } else {
            match parse_iso_date(dates.value(i)) {
                Ok(d) => Some(d),
                Err(e) => {
                    collector.push(format!("row {line}: {e}"));
                    None
                }
            }
        };

        let region = if regions.is_null(i) || regions.value(i).trim().is_empty() {
            collector.push(format!("row {line}: empty region"));
            None
        } else {
            Some(regions.value(i).trim().to_string())
        };

        let count = if cases.is_null(i) {
            collector.push(format!("row {line}: missing cases"));
            None
        } else {
            let text = cases.value(i).trim();
            match text.parse::<f64>() {
                Ok(v) => match check_count(v) {
                    None => Some(v),
                    Some(reason) => {
                        collector.push(format!("row {line}: {reason}"));
                        None
                    }
                },
                Err(_) => {
                    collector.push(format!("row {line}: non-numeric cases {text:?}"));
                    None
                }
            }
        };

        if let (Some(date), Some(region), Some(cumulative_cases)) = (date, region, count) {
            records.push(RawRecord {
                date,
                region,
                cumulative_cases,
            });
        }
    }
    Ok(())
}
