//! Reduction of posterior state draws to a daily growth series.
//!
//! The slope state is the de-seasonalised day-over-day change of
//! `ln(1 + count)`, so `exp(slope) - 1` is the fractional daily growth.
//! The reported trend is its posterior mean over every pooled draw; the
//! 5% and 95% quantiles of the same quantity are kept alongside.
//! Exponentiating the level instead would give the fitted count
//! `1 + count`, not a growth rate.

use epitrend_calendar::NaiveDate;
use epitrend_io::{RegionSeries, TrendRecord};
use epitrend_mcmc::PosteriorDraws;
use epitrend_stats::{mean, quantile_type7, sorted};

use crate::error::ExtractError;

/// State index of the slope.
const SLOPE: usize = 1;

/// Lower posterior band.
pub const LOWER_QUANTILE: f64 = 0.05;

/// Upper posterior band.
pub const UPPER_QUANTILE: f64 = 0.95;

/// Posterior growth summary of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTrend {
    region_id: String,
    dates: Vec<NaiveDate>,
    mean: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl RegionTrend {
    /// Region identifier.
    pub fn region_id(&self) -> &str {
        &self.region_id
    }

    /// Days, copied from the input series.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Posterior mean growth per day.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Posterior [`LOWER_QUANTILE`] of growth per day.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Posterior [`UPPER_QUANTILE`] of growth per day.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// One [`TrendRecord`] per day, oldest first.
    pub fn records(&self) -> Vec<TrendRecord> {
        self.dates
            .iter()
            .zip(&self.mean)
            .map(|(&date, &trend)| TrendRecord::new(self.region_id.as_str(), date, trend))
            .collect()
    }
}

/// Summarises the posterior growth of `series` from its draws.
///
/// # Errors
///
/// Returns an [`ExtractError`] if the draws are empty, lack a slope state,
/// cover a different number of days than `series`, or produce a
/// non-finite growth value.
pub fn summarize(series: &RegionSeries, draws: &PosteriorDraws) -> Result<RegionTrend, ExtractError> {
    if draws.n_draws() == 0 {
        return Err(ExtractError::NoDraws);
    }
    if draws.state_dim() <= SLOPE {
        return Err(ExtractError::MissingSlope {
            state_dim: draws.state_dim(),
        });
    }
    if draws.n_steps() != series.len() {
        return Err(ExtractError::LengthMismatch {
            draws: draws.n_steps(),
            series: series.len(),
        });
    }

    let states = draws.states();
    let n_steps = series.len();
    let mut out = RegionTrend {
        region_id: series.region_id().to_string(),
        dates: series.dates().to_vec(),
        mean: Vec::with_capacity(n_steps),
        lower: Vec::with_capacity(n_steps),
        upper: Vec::with_capacity(n_steps),
    };

    for t in 0..n_steps {
        let growth: Vec<f64> = (0..draws.n_draws())
            .map(|d| states[[d, t, SLOPE]].exp_m1())
            .collect();
        let m = mean(&growth);
        if !m.is_finite() {
            return Err(ExtractError::NonFinite { step: t });
        }
        let ordered = sorted(&growth);
        out.mean.push(m);
        out.lower
            .push(quantile_type7(&ordered, LOWER_QUANTILE).unwrap_or(m));
        out.upper
            .push(quantile_type7(&ordered, UPPER_QUANTILE).unwrap_or(m));
    }

    Ok(out)
}

/// Reduces the draws of `series` to its trend records.
///
/// `trend_t` is the mean over all pooled draws of `exp(slope_t) - 1`.
///
/// # Errors
///
/// See [`summarize`].
pub fn extract_trend(
    series: &RegionSeries,
    draws: &PosteriorDraws,
) -> Result<Vec<TrendRecord>, ExtractError> {
    summarize(series, draws).map(|trend| trend.records())
}
