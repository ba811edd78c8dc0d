//! Pooled posterior draws and sampler diagnostics.

use std::time::Duration;

use ndarray::{Array2, Array3, ArrayView1, ArrayView2, Axis, s};

use crate::chain::ChainOutput;
use crate::error::SamplerError;

/// Split R-hat of every monitored quantity.
///
/// The three standard deviations are monitored on the log scale; the
/// slope is monitored through its time average within each draw. `NaN`
/// marks a quantity whose R-hat could not be computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RhatSummary {
    /// Observation noise standard deviation.
    pub sigma_obs: f64,
    /// Slope innovation standard deviation.
    pub sigma_slope: f64,
    /// Seasonal innovation standard deviation.
    pub sigma_season: f64,
    /// Time-averaged slope.
    pub mean_slope: f64,
}

impl RhatSummary {
    /// Worst (largest) R-hat, ignoring `NaN` entries.
    pub fn max(&self) -> f64 {
        [
            self.sigma_obs,
            self.sigma_slope,
            self.sigma_season,
            self.mean_slope,
        ]
        .into_iter()
        .fold(f64::NAN, f64::max)
    }

    fn from_chains(chains: &[ChainOutput]) -> Self {
        let rhat_of = |series: &[Vec<f64>]| {
            let refs: Vec<&[f64]> = series.iter().map(|v| v.as_slice()).collect();
            epitrend_stats::split_rhat(&refs).unwrap_or(f64::NAN)
        };
        let param = |k: usize| -> Vec<Vec<f64>> {
            chains
                .iter()
                .map(|c| c.thetas.iter().map(|t| t[k]).collect())
                .collect()
        };
        let mean_slope: Vec<Vec<f64>> = chains
            .iter()
            .map(|c| {
                c.states
                    .iter()
                    .map(|s| s.column(1).mean().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        Self {
            sigma_obs: rhat_of(&param(0)),
            sigma_slope: rhat_of(&param(1)),
            sigma_season: rhat_of(&param(2)),
            mean_slope: rhat_of(&mean_slope),
        }
    }
}

/// Summary of one region's sampling run.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerDiagnostics {
    divergences: usize,
    saturated: usize,
    rhat: RhatSummary,
    adapted_widths: Vec<[f64; 3]>,
    elapsed: Duration,
}

impl SamplerDiagnostics {
    /// Assembles diagnostics.
    pub fn new(
        divergences: usize,
        saturated: usize,
        rhat: RhatSummary,
        adapted_widths: Vec<[f64; 3]>,
        elapsed: Duration,
    ) -> Self {
        Self {
            divergences,
            saturated,
            rhat,
            adapted_widths,
            elapsed,
        }
    }

    /// Post-warm-up divergent transitions, summed over chains.
    pub fn divergences(&self) -> usize {
        self.divergences
    }

    /// Post-warm-up transitions whose step-out hit `max_depth`, summed over chains.
    pub fn saturated(&self) -> usize {
        self.saturated
    }

    /// Split R-hat of the monitored quantities.
    pub fn rhat(&self) -> &RhatSummary {
        &self.rhat
    }

    /// Slice widths at the end of warm-up, one triple per chain.
    pub fn adapted_widths(&self) -> &[[f64; 3]] {
        &self.adapted_widths
    }

    /// Wall-clock time of the whole run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Pooled post-warm-up draws of one region.
///
/// | Field | Shape | Meaning |
/// |-------|-------|---------|
/// | states | `(N, T, m)` | latent state trajectory per draw |
/// | sigmas | `(N, 3)` | `[sigma_obs, sigma_slope, sigma_season]` per draw |
/// | chain ids | `N` | chain that produced each draw |
#[derive(Clone, Debug)]
pub struct PosteriorDraws {
    states: Array3<f64>,
    sigmas: Array2<f64>,
    chain_ids: Vec<usize>,
    diagnostics: SamplerDiagnostics,
}

impl PosteriorDraws {
    /// Assembles draws from their parts.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InconsistentDraws`] if the draw counts disagree
    /// or `sigmas` does not have three columns.
    pub fn new(
        states: Array3<f64>,
        sigmas: Array2<f64>,
        chain_ids: Vec<usize>,
        diagnostics: SamplerDiagnostics,
    ) -> Result<Self, SamplerError> {
        let n = states.len_of(Axis(0));
        if sigmas.dim() != (n, 3) {
            return Err(SamplerError::InconsistentDraws {
                reason: format!("sigmas shape {:?}, expected ({n}, 3)", sigmas.dim()),
            });
        }
        if chain_ids.len() != n {
            return Err(SamplerError::InconsistentDraws {
                reason: format!("{} chain ids for {n} draws", chain_ids.len()),
            });
        }
        Ok(Self {
            states,
            sigmas,
            chain_ids,
            diagnostics,
        })
    }

    /// Number of pooled draws `N`.
    pub fn n_draws(&self) -> usize {
        self.states.len_of(Axis(0))
    }

    /// Number of time steps `T`.
    pub fn n_steps(&self) -> usize {
        self.states.len_of(Axis(1))
    }

    /// State dimension `m`.
    pub fn state_dim(&self) -> usize {
        self.states.len_of(Axis(2))
    }

    /// All state trajectories, shape `(N, T, m)`.
    pub fn states(&self) -> &Array3<f64> {
        &self.states
    }

    /// Trajectory of draw `d`, shape `(T, m)`.
    pub fn draw(&self, d: usize) -> ArrayView2<'_, f64> {
        self.states.index_axis(Axis(0), d)
    }

    /// Slope path of draw `d` (state index 1).
    pub fn slope(&self, d: usize) -> ArrayView1<'_, f64> {
        self.states.slice(s![d, .., 1])
    }

    /// Standard deviations per draw, shape `(N, 3)`.
    pub fn sigmas(&self) -> &Array2<f64> {
        &self.sigmas
    }

    /// Chain index of every draw.
    pub fn chain_ids(&self) -> &[usize] {
        &self.chain_ids
    }

    /// Run diagnostics.
    pub fn diagnostics(&self) -> &SamplerDiagnostics {
        &self.diagnostics
    }
}

/// Pools chain outputs in chain order.
pub(crate) fn pool(chains: Vec<ChainOutput>, elapsed: Duration) -> PosteriorDraws {
    let n_draws: usize = chains.iter().map(|c| c.states.len()).sum();
    let (n_steps, m) = chains
        .iter()
        .find_map(|c| c.states.first())
        .map(|s| s.dim())
        .unwrap_or((0, 0));

    let mut states = Array3::zeros((n_draws, n_steps, m));
    let mut sigmas = Array2::zeros((n_draws, 3));
    let mut chain_ids = Vec::with_capacity(n_draws);
    let mut d = 0;
    for (chain_id, chain) in chains.iter().enumerate() {
        for (theta, path) in chain.thetas.iter().zip(&chain.states) {
            states.index_axis_mut(Axis(0), d).assign(path);
            for (k, &t) in theta.iter().enumerate() {
                sigmas[[d, k]] = t.exp();
            }
            chain_ids.push(chain_id);
            d += 1;
        }
    }

    let diagnostics = SamplerDiagnostics::new(
        chains.iter().map(|c| c.divergences).sum(),
        chains.iter().map(|c| c.saturated).sum(),
        RhatSummary::from_chains(&chains),
        chains.iter().map(|c| c.widths).collect(),
        elapsed,
    );

    PosteriorDraws {
        states,
        sigmas,
        chain_ids,
        diagnostics,
    }
}
