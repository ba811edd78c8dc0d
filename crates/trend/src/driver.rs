//! The per-region estimation loop.
//!
//! Regions are processed in ascending `region_id` order on a bounded
//! worker pool: instantiate the shared model, sample, extract. A region
//! that fails is recorded and skipped; only a broken model structure or
//! malformed input stops the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use epitrend_io::{RegionSeries, TrendRecord};
use epitrend_mcmc::{PosteriorDraws, PosteriorSampler};
use epitrend_ssm::{DEFAULT_SEASON_PERIOD, ModelCache, ModelDefinition, StateSpaceModel};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::error::DriverError;
use crate::extract::{self, RegionTrend};

/// Configuration of the per-region driver.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    workers: usize,
    season_period: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            season_period: DEFAULT_SEASON_PERIOD,
        }
    }
}

impl DriverConfig {
    /// Creates the default configuration: one worker, weekly seasonality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of regions fitted concurrently.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the seasonal period `S`.
    pub fn with_season_period(mut self, period: usize) -> Self {
        self.season_period = period;
        self
    }

    /// Regions fitted concurrently.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Seasonal period `S`.
    pub fn season_period(&self) -> usize {
        self.season_period
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConfig`] if `workers` is zero.
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.workers == 0 {
            return Err(DriverError::InvalidConfig {
                reason: "workers must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// A region that produced no trend, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionFailure {
    /// Region identifier.
    pub region_id: String,
    /// Rendered error.
    pub reason: String,
}

/// Fit statistics of a region that succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    /// Region identifier.
    pub region_id: String,
    /// Days in the series.
    pub n_days: usize,
    /// All counts were zero.
    pub degenerate: bool,
    /// Worst split R-hat over the monitored quantities.
    pub max_rhat: f64,
    /// Post-warm-up divergent transitions.
    pub divergences: usize,
    /// Post-warm-up transitions that hit the step-out limit.
    pub saturated: usize,
    /// Sampling wall-clock time.
    pub elapsed: Duration,
    /// Posterior mean growth on the last day.
    pub final_trend: f64,
    /// Posterior 5% growth quantile on the last day.
    pub final_lower: f64,
    /// Posterior 95% growth quantile on the last day.
    pub final_upper: f64,
}

impl RegionSummary {
    fn new(trend: &RegionTrend, series: &RegionSeries, draws: &PosteriorDraws) -> Self {
        let diagnostics = draws.diagnostics();
        let last = |v: &[f64]| v.last().copied().unwrap_or(f64::NAN);
        Self {
            region_id: series.region_id().to_string(),
            n_days: series.len(),
            degenerate: series.is_degenerate(),
            max_rhat: diagnostics.rhat().max(),
            divergences: diagnostics.divergences(),
            saturated: diagnostics.saturated(),
            elapsed: diagnostics.elapsed(),
            final_trend: last(trend.mean()),
            final_lower: last(trend.lower()),
            final_upper: last(trend.upper()),
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct DriverReport {
    records: Vec<TrendRecord>,
    failures: Vec<RegionFailure>,
    summaries: Vec<RegionSummary>,
    elapsed: Duration,
}

impl DriverReport {
    /// Trend rows of every successful region, sorted by `(region_id, date)`.
    pub fn records(&self) -> &[TrendRecord] {
        &self.records
    }

    /// Consumes the report and returns its rows.
    pub fn into_records(self) -> Vec<TrendRecord> {
        self.records
    }

    /// Regions that were skipped, in region order.
    pub fn failures(&self) -> &[RegionFailure] {
        &self.failures
    }

    /// Per-region fit statistics, in region order.
    pub fn summaries(&self) -> &[RegionSummary] {
        &self.summaries
    }

    /// Wall-clock time of the run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of regions with a trend.
    pub fn n_succeeded(&self) -> usize {
        self.summaries.len()
    }
}

/// Stable per-region sampler stream (FNV-1a of the region id).
///
/// A region's draws depend only on the run seed and its own id, not on
/// which other regions are in the input.
pub fn region_stream(region_id: &str) -> u64 {
    region_id
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
}

enum Outcome {
    Fitted(Box<(RegionTrend, RegionSummary)>),
    Failed(RegionFailure),
}

/// Runs model build, sampling, and extraction over all regions.
pub struct TrendDriver {
    config: DriverConfig,
    cache: Arc<dyn ModelCache>,
    sampler: Arc<dyn PosteriorSampler>,
}

impl TrendDriver {
    /// Creates a driver with an injected model cache and sampler.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConfig`] for an invalid `config`.
    pub fn new(
        config: DriverConfig,
        cache: Arc<dyn ModelCache>,
        sampler: Arc<dyn PosteriorSampler>,
    ) -> Result<Self, DriverError> {
        config.validate()?;
        Ok(Self {
            config,
            cache,
            sampler,
        })
    }

    /// The driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Fits every region and collects the result table.
    ///
    /// # Errors
    ///
    /// | Condition | Variant |
    /// |-----------|---------|
    /// | two series share a region id | [`DriverError::DuplicateRegion`] |
    /// | model fails to build or validate | [`DriverError::Structural`] |
    /// | worker pool cannot start | [`DriverError::ThreadPool`] |
    pub fn run(&self, series: &[RegionSeries]) -> Result<DriverReport, DriverError> {
        let started = Instant::now();

        let mut ordered: Vec<&RegionSeries> = series.iter().collect();
        ordered.sort_by(|a, b| a.region_id().cmp(b.region_id()));
        let mut seen = HashSet::with_capacity(ordered.len());
        for s in &ordered {
            if !seen.insert(s.region_id()) {
                return Err(DriverError::DuplicateRegion {
                    region_id: s.region_id().to_string(),
                });
            }
        }

        let definition = ModelDefinition::new(self.config.season_period);
        let compiled = self
            .cache
            .get_or_build(&definition)
            .map_err(DriverError::Structural)?;
        compiled.validate().map_err(DriverError::Structural)?;

        let jobs: Vec<(&RegionSeries, StateSpaceModel)> = ordered
            .into_iter()
            .map(|s| {
                let model = compiled
                    .instantiate(s.len())
                    .map_err(DriverError::Structural)?;
                model.validate().map_err(DriverError::Structural)?;
                Ok((s, model))
            })
            .collect::<Result<_, DriverError>>()?;

        let total = jobs.len();
        info!(
            regions = total,
            workers = self.config.workers,
            fingerprint = compiled.fingerprint(),
            "starting trend estimation"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| DriverError::ThreadPool {
                reason: e.to_string(),
            })?;
        let outcomes: Vec<Outcome> = pool.install(|| {
            jobs.par_iter()
                .enumerate()
                .map(|(index, (s, model))| self.fit_region(index, total, s, model))
                .collect()
        });

        let mut report = DriverReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Fitted(fitted) => {
                    let (trend, summary) = *fitted;
                    report.records.extend(trend.records());
                    report.summaries.push(summary);
                }
                Outcome::Failed(failure) => report.failures.push(failure),
            }
        }
        report.elapsed = started.elapsed();

        info!(
            succeeded = report.summaries.len(),
            failed = report.failures.len(),
            rows = report.records.len(),
            elapsed_s = report.elapsed.as_secs_f64(),
            "trend estimation finished"
        );
        Ok(report)
    }

    fn fit_region(
        &self,
        index: usize,
        total: usize,
        series: &RegionSeries,
        model: &StateSpaceModel,
    ) -> Outcome {
        let region = series.region_id();
        let _span = info_span!("region", region).entered();
        info!(index = index + 1, total, days = series.len(), "fitting region");

        if series.is_degenerate() {
            warn!("series is all zeros; trend will be uninformative");
        }

        let failed = |reason: String| {
            warn!(%reason, "region skipped");
            Outcome::Failed(RegionFailure {
                region_id: region.to_string(),
                reason,
            })
        };

        let y = series.log_observations();
        let draws = match self.sampler.sample(model, &y, region_stream(region)) {
            Ok(draws) => draws,
            Err(e) => return failed(e.to_string()),
        };
        let trend = match extract::summarize(series, &draws) {
            Ok(trend) => trend,
            Err(e) => return failed(e.to_string()),
        };

        let summary = RegionSummary::new(&trend, series, &draws);
        if summary.divergences > 0 {
            warn!(divergences = summary.divergences, "divergent transitions after warm-up");
        }
        debug!(saturated = summary.saturated, "step-out saturation");
        info!(
            max_rhat = summary.max_rhat,
            divergences = summary.divergences,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            final_trend = summary.final_trend,
            "region done"
        );
        Outcome::Fitted(Box::new((trend, summary)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epitrend_calendar::NaiveDate;
    use epitrend_mcmc::{RhatSummary, SamplerDiagnostics, SamplerError};
    use epitrend_ssm::{CompiledModel, MemoryCache, ModelError, NoCache};
    use ndarray::{Array2, Array3};

    /// Returns a constant slope of `ln(1.1)`; fails when the first count is 13.
    struct FixedSampler;

    impl PosteriorSampler for FixedSampler {
        fn sample(
            &self,
            model: &StateSpaceModel,
            observations: &[f64],
            _stream: u64,
        ) -> Result<PosteriorDraws, SamplerError> {
            if (observations[0] - 14f64.ln()).abs() < 1e-12 {
                return Err(SamplerError::NonConvergence {
                    max_rhat: 1.7,
                    divergences: 3,
                });
            }
            let n = 4;
            let mut states = Array3::zeros((n, model.n_steps(), model.state_dim()));
            states
                .slice_mut(ndarray::s![.., .., 1])
                .fill(1.1f64.ln());
            let diag = SamplerDiagnostics::new(
                0,
                0,
                RhatSummary {
                    sigma_obs: 1.0,
                    sigma_slope: 1.0,
                    sigma_season: 1.0,
                    mean_slope: 1.0,
                },
                vec![],
                Duration::from_millis(1),
            );
            PosteriorDraws::new(states, Array2::ones((n, 3)), vec![0, 0, 1, 1], diag)
        }
    }

    struct BrokenCache;

    impl ModelCache for BrokenCache {
        fn get_or_build(&self, definition: &ModelDefinition) -> Result<Arc<CompiledModel>, ModelError> {
            let good = definition.compile()?;
            Ok(Arc::new(CompiledModel::from_raw_parts(
                *definition,
                Array2::zeros((3, 3)),
                good.design_row().clone(),
                good.selection().clone(),
            )))
        }
    }

    fn series(region: &str, first: f64, n: usize) -> RegionSeries {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let mut cases = vec![5.0; n];
        cases[0] = first;
        RegionSeries::new(region, start.iter_days().take(n).collect(), cases).unwrap()
    }

    fn driver(workers: usize) -> TrendDriver {
        TrendDriver::new(
            DriverConfig::new().with_workers(workers),
            Arc::new(MemoryCache::new()),
            Arc::new(FixedSampler),
        )
        .unwrap()
    }

    #[test]
    fn default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.workers(), 1);
        assert_eq!(config.season_period(), 7);
        assert!(config.validate().is_ok());
        assert!(DriverConfig::new().with_workers(0).validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let result = TrendDriver::new(
            DriverConfig::new().with_workers(0),
            Arc::new(NoCache),
            Arc::new(FixedSampler),
        );
        assert!(matches!(result, Err(DriverError::InvalidConfig { .. })));
    }

    #[test]
    fn records_sorted_by_region_then_date() {
        let input = vec![series("Texas", 1.0, 5), series("Alaska", 1.0, 3)];
        let report = driver(2).run(&input).unwrap();
        assert_eq!(report.records().len(), 8);
        assert_eq!(report.records()[0].region_id, "Alaska");
        assert_eq!(report.records()[3].region_id, "Texas");
        for pair in report.records().windows(2) {
            assert!(
                (pair[0].region_id.as_str(), pair[0].date)
                    < (pair[1].region_id.as_str(), pair[1].date)
            );
        }
        approx::assert_abs_diff_eq!(report.records()[0].trend, 0.1, epsilon = 1e-12);
        assert_eq!(report.n_succeeded(), 2);
    }

    #[test]
    fn failing_region_is_skipped() {
        let input = vec![
            series("Ohio", 1.0, 4),
            series("Iowa", 13.0, 4),
            series("Utah", 2.0, 4),
        ];
        let report = driver(1).run(&input).unwrap();
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].region_id, "Iowa");
        assert!(report.failures()[0].reason.contains("did not converge"));
        assert!(report.records().iter().all(|r| r.region_id != "Iowa"));
        assert_eq!(report.records().len(), 8);
        let ids: Vec<_> = report.summaries().iter().map(|s| s.region_id.as_str()).collect();
        assert_eq!(ids, vec!["Ohio", "Utah"]);
    }

    #[test]
    fn duplicate_region_rejected() {
        let input = vec![series("Ohio", 1.0, 4), series("Ohio", 2.0, 4)];
        let err = driver(1).run(&input).unwrap_err();
        assert!(matches!(err, DriverError::DuplicateRegion { region_id } if region_id == "Ohio"));
    }

    #[test]
    fn structural_error_aborts() {
        let driver = TrendDriver::new(
            DriverConfig::new(),
            Arc::new(BrokenCache),
            Arc::new(FixedSampler),
        )
        .unwrap();
        let err = driver.run(&[series("Ohio", 1.0, 4)]).unwrap_err();
        assert!(matches!(err, DriverError::Structural(_)));
    }

    #[test]
    fn bad_season_period_aborts() {
        let driver = TrendDriver::new(
            DriverConfig::new().with_season_period(1),
            Arc::new(NoCache),
            Arc::new(FixedSampler),
        )
        .unwrap();
        let err = driver.run(&[series("Ohio", 1.0, 4)]).unwrap_err();
        assert!(matches!(err, DriverError::Structural(_)));
    }

    #[test]
    fn empty_input_is_empty_report() {
        let report = driver(1).run(&[]).unwrap();
        assert!(report.records().is_empty());
        assert!(report.failures().is_empty());
    }

    #[test]
    fn stream_depends_only_on_id() {
        assert_eq!(region_stream("Ohio"), region_stream("Ohio"));
        assert_ne!(region_stream("Ohio"), region_stream("Iowa"));
        assert_eq!(region_stream(""), 0xcbf2_9ce4_8422_2325);
    }
}
