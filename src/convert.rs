//! Pure conversion functions: TOML config structs -> crate API config types.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use epitrend_calendar::{NaiveDate, parse_iso_date};
use epitrend_io::{Compression, OutputFormat, RawColumns, SeriesWindow, WriterConfig};
use epitrend_mcmc::SamplerConfig;
use epitrend_ssm::{FileCache, MemoryCache, ModelCache, NoCache};
use epitrend_trend::DriverConfig;

use crate::config::{DriverToml, ModelToml, OutputToml, SamplerToml, SourceToml};

/// Parses a compression algorithm name string into the corresponding enum variant.
pub fn parse_compression(s: &str) -> Result<Compression> {
    match s.to_lowercase().as_str() {
        "none" => Ok(Compression::None),
        "snappy" => Ok(Compression::Snappy),
        "zstd" => Ok(Compression::Zstd),
        other => bail!("unknown compression: {other:?}"),
    }
}

/// Parses an output format name; `None` defers to the file extension.
pub fn parse_format(s: Option<&str>) -> Result<Option<OutputFormat>> {
    match s.map(str::to_lowercase).as_deref() {
        None => Ok(None),
        Some("csv") => Ok(Some(OutputFormat::Csv)),
        Some("parquet") => Ok(Some(OutputFormat::Parquet)),
        Some(other) => bail!("unknown output format: {other:?}"),
    }
}

/// Parses the series epoch; `"first"` means the first observed date.
pub fn parse_epoch(s: &str) -> Result<Option<NaiveDate>> {
    if s.eq_ignore_ascii_case("first") {
        return Ok(None);
    }
    parse_iso_date(s)
        .map(Some)
        .with_context(|| format!("invalid [source].epoch {s:?}"))
}

/// Builds the raw table column names.
pub fn build_raw_columns(source: &SourceToml) -> RawColumns {
    RawColumns::default()
        .with_date(&source.date_column)
        .with_region(&source.region_column)
        .with_cases(&source.cases_column)
}

/// Builds the [`SeriesWindow`] from the source section.
pub fn build_window(source: &SourceToml) -> Result<SeriesWindow> {
    let end = source
        .end
        .as_deref()
        .map(|s| parse_iso_date(s).with_context(|| format!("invalid [source].end {s:?}")))
        .transpose()?;
    Ok(SeriesWindow::default()
        .with_epoch(parse_epoch(&source.epoch)?)
        .with_end(end))
}

/// Builds a validated [`SamplerConfig`].
///
/// An optional global seed is forwarded to the sampler.
pub fn build_sampler_config(sampler: &SamplerToml, seed: Option<u64>) -> Result<SamplerConfig> {
    let [obs, slope, season] = sampler.prior_scales;
    let mut cfg = SamplerConfig::new()
        .with_n_samples(sampler.n_samples)
        .with_n_warmup(sampler.n_warmup)
        .with_n_chains(sampler.n_chains)
        .with_max_depth(sampler.max_depth)
        .with_target_accept(sampler.target_accept)
        .with_initial_state_variance(sampler.initial_state_variance)
        .with_prior_scales(obs, slope, season)
        .with_sigma_bounds(sampler.sigma_floor, sampler.sigma_ceiling)
        .with_max_rhat(sampler.max_rhat)
        .with_max_divergences(sampler.max_divergences);
    if let Some(secs) = sampler.time_budget_secs {
        let budget = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid [sampler].time_budget_secs {secs}"))?;
        cfg = cfg.with_time_budget(budget);
    }
    if let Some(s) = seed {
        cfg = cfg.with_seed(s);
    }
    cfg.validate().context("invalid [sampler] section")?;
    Ok(cfg)
}

/// Builds the [`DriverConfig`].
pub fn build_driver_config(model: &ModelToml, driver: &DriverToml) -> DriverConfig {
    DriverConfig::new()
        .with_workers(driver.workers)
        .with_season_period(model.season_period)
}

/// Builds the model cache named by `[model].cache`.
pub fn build_cache(model: &ModelToml) -> Result<Arc<dyn ModelCache>> {
    match model.cache.to_lowercase().as_str() {
        "none" => Ok(Arc::new(NoCache)),
        "memory" => Ok(Arc::new(MemoryCache::new())),
        "file" => Ok(Arc::new(FileCache::new(&model.cache_dir))),
        other => bail!("unknown model cache: {other:?}"),
    }
}

/// Builds a [`WriterConfig`] from the TOML output configuration.
pub fn build_writer_config(output: &OutputToml) -> Result<WriterConfig> {
    Ok(WriterConfig::default()
        .with_format(parse_format(output.format.as_deref())?)
        .with_compression(parse_compression(&output.compression)?)
        .with_row_group_size(output.row_group_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_names() {
        assert_eq!(parse_compression("none").unwrap(), Compression::None);
        assert_eq!(parse_compression("Snappy").unwrap(), Compression::Snappy);
        assert_eq!(parse_compression("ZSTD").unwrap(), Compression::Zstd);
        assert!(parse_compression("lz4").is_err());
    }

    #[test]
    fn format_names() {
        assert_eq!(parse_format(None).unwrap(), None);
        assert_eq!(parse_format(Some("CSV")).unwrap(), Some(OutputFormat::Csv));
        assert_eq!(
            parse_format(Some("parquet")).unwrap(),
            Some(OutputFormat::Parquet)
        );
        assert!(parse_format(Some("xlsx")).is_err());
    }

    #[test]
    fn epoch_values() {
        assert_eq!(parse_epoch("first").unwrap(), None);
        assert_eq!(
            parse_epoch("2020-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 1)
        );
        assert!(parse_epoch("March 1").is_err());
    }

    #[test]
    fn window_from_defaults() {
        let window = build_window(&SourceToml::default()).unwrap();
        assert_eq!(window, SeriesWindow::default());
    }

    #[test]
    fn window_with_end() {
        let source = SourceToml {
            end: Some("2020-06-30".to_string()),
            ..SourceToml::default()
        };
        let window = build_window(&source).unwrap();
        assert_eq!(window.end(), NaiveDate::from_ymd_opt(2020, 6, 30));
    }

    #[test]
    fn raw_columns_from_source() {
        let source = SourceToml {
            region_column: "county".to_string(),
            ..SourceToml::default()
        };
        let columns = build_raw_columns(&source);
        assert_eq!(columns.region(), "county");
        assert_eq!(columns.date(), "date");
    }

    #[test]
    fn sampler_config_forwards_seed_and_budget() {
        let toml = SamplerToml {
            time_budget_secs: Some(2.5),
            ..SamplerToml::default()
        };
        let cfg = build_sampler_config(&toml, Some(9)).unwrap();
        assert_eq!(cfg.seed(), Some(9));
        assert_eq!(cfg.time_budget(), Some(Duration::from_millis(2500)));
        assert_eq!(cfg.n_chains(), 2);
    }

    #[test]
    fn sampler_config_rejects_invalid() {
        let one_chain = SamplerToml {
            n_chains: 1,
            ..SamplerToml::default()
        };
        assert!(build_sampler_config(&one_chain, None).is_err());

        let negative_budget = SamplerToml {
            time_budget_secs: Some(-1.0),
            ..SamplerToml::default()
        };
        assert!(build_sampler_config(&negative_budget, None).is_err());
    }

    #[test]
    fn cache_kinds() {
        let mut model = ModelToml::default();
        assert!(build_cache(&model).is_ok());
        model.cache = "none".to_string();
        assert!(build_cache(&model).is_ok());
        model.cache = "file".to_string();
        assert!(build_cache(&model).is_ok());
        model.cache = "redis".to_string();
        assert!(build_cache(&model).is_err());
    }

    #[test]
    fn driver_config_from_toml() {
        let cfg = build_driver_config(&ModelToml::default(), &DriverToml { workers: 4 });
        assert_eq!(cfg.workers(), 4);
        assert_eq!(cfg.season_period(), 7);
    }

    #[test]
    fn writer_config_from_toml() {
        let output = OutputToml {
            format: Some("parquet".to_string()),
            compression: "zstd".to_string(),
            ..OutputToml::default()
        };
        let cfg = build_writer_config(&output).unwrap();
        assert_eq!(cfg.format(), Some(OutputFormat::Parquet));
        assert_eq!(cfg.compression(), Compression::Zstd);
    }
}
