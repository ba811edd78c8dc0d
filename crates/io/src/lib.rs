//! # epitrend-io
//!
//! Read the raw cumulative case table, turn it into gap-filled daily
//! series per region, and write result tables as CSV or Parquet.
//!
//! ```text
//! fetch_source -> read_raw_table -> build_region_series -> Vec<RegionSeries>
//! Vec<TrendRecord> -> write_trends
//! ```

mod error;
mod preprocess;
mod raw;
mod record;
mod series;
mod source;
mod validate;
mod writer;

pub use error::IoError;
pub use preprocess::{SeriesWindow, build_region_series, interpolate_gaps};
pub use raw::{RawColumns, RawRecord, read_raw_table};
pub use record::TrendRecord;
pub use series::RegionSeries;
pub use source::{fetch_source, is_remote};
pub use writer::{Compression, OutputFormat, WriterConfig, write_series, write_trends};
