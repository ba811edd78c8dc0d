//! Result sink: trend and series tables as CSV or Parquet.
//!
//! Both tables share the layout `region_id` (text), `date` (`Date32`, ISO
//! in CSV), then one `Float64` value column.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tracing::info;

use crate::error::IoError;
use crate::record::TrendRecord;
use crate::series::RegionSeries;

/// File format of a written table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated text with a header row.
    Csv,
    /// Apache Parquet.
    Parquet,
}

impl OutputFormat {
    /// Infers the format from the file extension (`csv`, `parquet`, `pq`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Compression algorithm for Parquet output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    None,
    /// Snappy compression (fast, moderate ratio).
    #[default]
    Snappy,
    /// Zstd compression (slower, better ratio).
    Zstd,
}

impl Compression {
    fn to_parquet(self) -> Result<parquet::basic::Compression, IoError> {
        Ok(match self {
            Self::None => parquet::basic::Compression::UNCOMPRESSED,
            Self::Snappy => parquet::basic::Compression::SNAPPY,
            Self::Zstd => {
                let level = parquet::basic::ZstdLevel::try_new(3)?;
                parquet::basic::Compression::ZSTD(level)
            }
        })
    }
}

/// Configuration of the table writers.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Explicit format; inferred from the extension when `None`.
    format: Option<OutputFormat>,
    /// Parquet compression.
    compression: Compression,
    /// Maximum number of rows per Parquet row group.
    row_group_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            format: None,
            compression: Compression::default(),
            row_group_size: 1_000_000,
        }
    }
}

impl WriterConfig {
    /// Forces the output format.
    pub fn with_format(mut self, format: Option<OutputFormat>) -> Self {
        self.format = format;
        self
    }

    /// Sets the Parquet compression algorithm.
    pub fn with_compression(mut self, comp: Compression) -> Self {
        self.compression = comp;
        self
    }

    /// Sets the maximum number of rows per Parquet row group.
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Configured format, if any.
    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }

    /// Parquet compression.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Rows per Parquet row group.
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Format used for `path`: the explicit one, else by extension.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if neither is available.
    pub fn resolve_format(&self, path: &Path) -> Result<OutputFormat, IoError> {
        self.format
            .or_else(|| OutputFormat::from_path(path))
            .ok_or_else(|| IoError::Validation {
                count: 1,
                details: format!(
                    "cannot infer output format of {}; use a .csv or .parquet extension",
                    path.display()
                ),
            })
    }

    fn validate(&self) -> Result<(), IoError> {
        if self.row_group_size == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "row_group_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

fn table_schema(value_column: &str) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("region_id", DataType::Utf8, false),
        Field::new("date", DataType::Date32, false),
        Field::new(value_column, DataType::Float64, false),
    ]))
}

fn trends_batch(records: &[TrendRecord]) -> Result<RecordBatch, IoError> {
    let regions: ArrayRef = Arc::new(StringArray::from_iter_values(
        records.iter().map(|r| r.region_id.as_str()),
    ));
    let dates: ArrayRef = Arc::new(Date32Array::from_iter_values(
        records.iter().map(|r| Date32Type::from_naive_date(r.date)),
    ));
    let trends: ArrayRef = Arc::new(Float64Array::from_iter_values(
        records.iter().map(|r| r.trend),
    ));
    Ok(RecordBatch::try_new(
        table_schema("trend"),
        vec![regions, dates, trends],
    )?)
}

fn series_batch(series: &[RegionSeries]) -> Result<RecordBatch, IoError> {
    let regions: ArrayRef = Arc::new(StringArray::from_iter_values(
        series
            .iter()
            .flat_map(|s| std::iter::repeat_n(s.region_id(), s.len()))
            .collect::<Vec<_>>(),
    ));
    let dates: ArrayRef = Arc::new(Date32Array::from_iter_values(
        series
            .iter()
            .flat_map(|s| s.dates().iter().map(|&d| Date32Type::from_naive_date(d))),
    ));
    let cases: ArrayRef = Arc::new(Float64Array::from_iter_values(
        series.iter().flat_map(|s| s.new_cases().iter().copied()),
    ));
    Ok(RecordBatch::try_new(
        table_schema("new_cases"),
        vec![regions, dates, cases],
    )?)
}

fn create(path: &Path) -> Result<File, IoError> {
    File::create(path).map_err(|e| IoError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_batch(path: &Path, batch: &RecordBatch, config: &WriterConfig) -> Result<(), IoError> {
    config.validate()?;
    let format = config.resolve_format(path)?;
    let file = create(path)?;

    match format {
        OutputFormat::Csv => {
            let mut writer = arrow::csv::WriterBuilder::new()
                .with_header(true)
                .build(file);
            writer.write(batch)?;
        }
        OutputFormat::Parquet => {
            let props = WriterProperties::builder()
                .set_compression(config.compression.to_parquet()?)
                .set_max_row_group_size(config.row_group_size)
                .build();
            let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
            writer.write(batch)?;
            writer.close()?;
        }
    }

    info!(
        path = %path.display(),
        format = ?format,
        rows = batch.num_rows(),
        "table written"
    );
    Ok(())
}

/// Writes the trend table `region_id, date, trend`.
///
/// Records are written in the given order.
///
/// # Errors
///
/// | Condition | Variant |
/// |-----------|---------|
/// | invalid config or unknown format | [`IoError::Validation`] |
/// | file cannot be created | [`IoError::Io`] |
/// | CSV encoding fails | [`IoError::Arrow`] |
/// | Parquet encoding fails | [`IoError::Parquet`] |
pub fn write_trends(
    path: &Path,
    records: &[TrendRecord],
    config: &WriterConfig,
) -> Result<(), IoError> {
    write_batch(path, &trends_batch(records)?, config)
}

/// Writes the preprocessed series table `region_id, date, new_cases`.
///
/// # Errors
///
/// Same as [`write_trends`].
pub fn write_series(
    path: &Path,
    series: &[RegionSeries],
    config: &WriterConfig,
) -> Result<(), IoError> {
    write_batch(path, &series_batch(series)?, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use epitrend_calendar::NaiveDate;

    #[test]
    fn default_config_values() {
        let config = WriterConfig::default();
        assert_eq!(config.compression(), Compression::Snappy);
        assert_eq!(config.row_group_size(), 1_000_000);
        assert_eq!(config.format(), None);
    }

    #[test]
    fn builder_methods() {
        let config = WriterConfig::default()
            .with_format(Some(OutputFormat::Parquet))
            .with_compression(Compression::Zstd)
            .with_row_group_size(500);
        assert_eq!(config.format(), Some(OutputFormat::Parquet));
        assert_eq!(config.compression(), Compression::Zstd);
        assert_eq!(config.row_group_size(), 500);
    }

    #[test]
    fn validate_zero_row_group_size() {
        let err = WriterConfig::default()
            .with_row_group_size(0)
            .validate()
            .unwrap_err();
        match err {
            IoError::Validation { count, details } => {
                assert_eq!(count, 1);
                assert!(details.contains("row_group_size"));
            }
            _ => panic!("expected Validation error"),
        }
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.csv")), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_path(Path::new("out.CSV")), Some(OutputFormat::Csv));
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b/out.parquet")),
            Some(OutputFormat::Parquet)
        );
        assert_eq!(OutputFormat::from_path(Path::new("out.txt")), None);
        assert_eq!(OutputFormat::from_path(Path::new("out")), None);
    }

    #[test]
    fn explicit_format_wins() {
        let config = WriterConfig::default().with_format(Some(OutputFormat::Csv));
        assert_eq!(
            config.resolve_format(Path::new("x.parquet")).unwrap(),
            OutputFormat::Csv
        );
        assert!(WriterConfig::default().resolve_format(Path::new("x.txt")).is_err());
    }

    #[test]
    fn trends_batch_layout() {
        let day = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let batch = trends_batch(&[
            TrendRecord::new("A", day, 0.1),
            TrendRecord::new("B", day, -0.2),
        ])
        .unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).name(), "region_id");
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Date32);
        assert_eq!(batch.schema().field(2).name(), "trend");
    }

    #[test]
    fn series_batch_repeats_region() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let dates: Vec<_> = start.iter_days().take(3).collect();
        let a = RegionSeries::new("A", dates.clone(), vec![1.0, 2.0, 3.0]).unwrap();
        let b = RegionSeries::new("B", dates, vec![0.0; 3]).unwrap();
        let batch = series_batch(&[a, b]).unwrap();
        assert_eq!(batch.num_rows(), 6);
        assert_eq!(batch.schema().field(2).name(), "new_cases");
    }

    #[test]
    fn default_compression_is_snappy() {
        assert_eq!(Compression::default(), Compression::Snappy);
    }
}
