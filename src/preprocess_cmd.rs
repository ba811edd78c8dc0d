//! Preprocess command: raw cumulative table to gap-filled daily series.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use epitrend_io::{RegionSeries, build_region_series, fetch_source, read_raw_table, write_series};

use crate::cli::PreprocessArgs;
use crate::config::{EpitrendConfig, SourceToml};
use crate::convert;

/// Fetches, parses, and preprocesses the raw table named by `source`.
pub fn load_series(source: &SourceToml) -> Result<Vec<RegionSeries>> {
    let columns = convert::build_raw_columns(source);
    let window = convert::build_window(source)?;

    info!(source = %source.location, "reading raw table");
    let bytes = fetch_source(&source.location)
        .with_context(|| format!("failed to fetch raw table: {}", source.location))?;
    let records = read_raw_table(&bytes, &columns)
        .with_context(|| format!("failed to parse raw table: {}", source.location))?;
    let series = build_region_series(&records, &window).context("failed to build region series")?;
    info!(
        rows = records.len(),
        regions = series.len(),
        days = series.first().map_or(0, |s| s.len()),
        "region series ready"
    );
    Ok(series)
}

/// Run the preprocessing pipeline and write the series table.
pub fn run(args: PreprocessArgs) -> Result<()> {
    let _cmd = info_span!("preprocess").entered();
    let mut config = EpitrendConfig::load(&args.config)?;
    if let Some(source) = args.source {
        config.source.location = source;
    }

    let series = load_series(&config.source)?;
    let writer_cfg = convert::build_writer_config(&config.output)?;
    write_series(&args.output, &series, &writer_cfg)
        .with_context(|| format!("failed to write series: {}", args.output.display()))?;
    info!(path = %args.output.display(), "series written");
    Ok(())
}
