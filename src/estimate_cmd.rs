//! Estimate command: fit every region and write the trend table.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use epitrend_io::write_trends;
use epitrend_mcmc::SliceSampler;
use epitrend_trend::{TrendDriver, write_diagnostics};

use crate::cli::EstimateArgs;
use crate::config::EpitrendConfig;
use crate::convert;
use crate::preprocess_cmd::load_series;

/// Applies command-line overrides on top of the file configuration.
fn apply_overrides(config: &mut EpitrendConfig, args: &EstimateArgs) {
    if let Some(ref source) = args.source {
        config.source.location = source.clone();
    }
    if let Some(ref output) = args.output {
        config.output.path = output.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(workers) = args.workers {
        config.driver.workers = workers;
    }
}

/// Run the full estimation pipeline.
pub fn run(args: EstimateArgs) -> Result<()> {
    let _cmd = info_span!("estimate").entered();

    // 1. Configuration
    let mut config = EpitrendConfig::load(&args.config)?;
    apply_overrides(&mut config, &args);
    let sampler_cfg = convert::build_sampler_config(&config.sampler, config.seed)?;
    let driver_cfg = convert::build_driver_config(&config.model, &config.driver);
    let writer_cfg = convert::build_writer_config(&config.output)?;
    let cache = convert::build_cache(&config.model)?;

    // 2. Input series
    let series = load_series(&config.source)?;

    // 3. Fit
    let sampler = SliceSampler::new(sampler_cfg).context("invalid sampler configuration")?;
    let driver = TrendDriver::new(driver_cfg, cache, Arc::new(sampler))?;
    let report = driver.run(&series).context("trend estimation failed")?;

    for failure in report.failures() {
        warn!(region = %failure.region_id, reason = %failure.reason, "no trend for region");
    }

    // 4. Outputs
    if let Some(ref path) = config.output.diagnostics {
        write_diagnostics(path, &report)?;
    }
    let output = &config.output.path;
    write_trends(output, report.records(), &writer_cfg)
        .with_context(|| format!("failed to write trends: {}", output.display()))?;

    info!(
        path = %output.display(),
        rows = report.records().len(),
        regions = report.n_succeeded(),
        failed = report.failures().len(),
        "trend table written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> EstimateArgs {
        EstimateArgs {
            config: PathBuf::from("epitrend.toml"),
            source: Some("cases.csv".to_string()),
            output: None,
            seed: Some(3),
            workers: Some(8),
        }
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let mut config = EpitrendConfig::default();
        apply_overrides(&mut config, &args());
        assert_eq!(config.source.location, "cases.csv");
        assert_eq!(config.output.path, PathBuf::from("trends.csv"));
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.driver.workers, 8);
    }
}
