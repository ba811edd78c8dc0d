//! Sampler configuration.

use std::time::Duration;

use crate::error::SamplerError;

/// Configuration for [`SliceSampler`](crate::SliceSampler).
///
/// # Example
///
/// ```
/// use epitrend_mcmc::SamplerConfig;
///
/// let config = SamplerConfig::new()
///     .with_n_samples(200)
///     .with_n_chains(4)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.n_warmup(), 150);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    n_samples: usize,
    n_warmup: usize,
    n_chains: usize,
    max_depth: usize,
    target_accept: f64,
    initial_state_variance: f64,
    prior_scales: [f64; 3],
    sigma_floor: f64,
    sigma_ceiling: f64,
    seed: Option<u64>,
    time_budget: Option<Duration>,
    max_rhat: f64,
    max_divergences: usize,
}

impl SamplerConfig {
    /// Creates a configuration with defaults.
    ///
    /// Defaults: 150 samples and 150 warm-up iterations per chain, 2 chains,
    /// `max_depth = 12`, `target_accept = 0.9`, initial state variance 1e3,
    /// half-normal prior scales `(1.0, 0.1, 0.1)` for the observation, slope
    /// and seasonal standard deviations, standard deviations bounded to
    /// `[1e-3, 10]`, `max_rhat = 1.1`, `max_divergences = 10`, no seed and
    /// no time budget.
    pub fn new() -> Self {
        Self {
            n_samples: 150,
            n_warmup: 150,
            n_chains: 2,
            max_depth: 12,
            target_accept: 0.9,
            initial_state_variance: 1e3,
            prior_scales: [1.0, 0.1, 0.1],
            sigma_floor: 1e-3,
            sigma_ceiling: 10.0,
            seed: None,
            time_budget: None,
            max_rhat: 1.1,
            max_divergences: 10,
        }
    }

    /// Sets the number of retained draws per chain.
    pub fn with_n_samples(mut self, n: usize) -> Self {
        self.n_samples = n;
        self
    }

    /// Sets the number of warm-up iterations per chain.
    pub fn with_n_warmup(mut self, n: usize) -> Self {
        self.n_warmup = n;
        self
    }

    /// Sets the number of chains.
    pub fn with_n_chains(mut self, n: usize) -> Self {
        self.n_chains = n;
        self
    }

    /// Sets the step-out expansion limit of the slice sampler.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the share of slice updates whose initial bracket should already
    /// contain the slice. Warm-up widens or narrows each bracket toward it;
    /// higher values give wider brackets and fewer step-out expansions.
    pub fn with_target_accept(mut self, target: f64) -> Self {
        self.target_accept = target;
        self
    }

    /// Sets the variance of the approximately diffuse initial state prior.
    pub fn with_initial_state_variance(mut self, variance: f64) -> Self {
        self.initial_state_variance = variance;
        self
    }

    /// Sets the half-normal prior scales for the observation, slope and
    /// seasonal standard deviations.
    pub fn with_prior_scales(mut self, observation: f64, slope: f64, season: f64) -> Self {
        self.prior_scales = [observation, slope, season];
        self
    }

    /// Sets the support `[floor, ceiling]` of every standard deviation.
    pub fn with_sigma_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.sigma_floor = floor;
        self.sigma_ceiling = ceiling;
        self
    }

    /// Sets the run seed. Chain seeds derive from it, the region stream and
    /// the chain index.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the per-region wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Sets the split R-hat threshold above which a fit is rejected.
    pub fn with_max_rhat(mut self, max_rhat: f64) -> Self {
        self.max_rhat = max_rhat;
        self
    }

    /// Sets the divergence count above which a fit is rejected.
    pub fn with_max_divergences(mut self, max: usize) -> Self {
        self.max_divergences = max;
        self
    }

    // --- Accessors ---

    /// Retained draws per chain.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Warm-up iterations per chain.
    pub fn n_warmup(&self) -> usize {
        self.n_warmup
    }

    /// Number of chains.
    pub fn n_chains(&self) -> usize {
        self.n_chains
    }

    /// Step-out expansion limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Target share of slice updates that need no stepping-out.
    pub fn target_accept(&self) -> f64 {
        self.target_accept
    }

    /// Initial state prior variance.
    pub fn initial_state_variance(&self) -> f64 {
        self.initial_state_variance
    }

    /// Half-normal prior scales `[observation, slope, season]`.
    pub fn prior_scales(&self) -> [f64; 3] {
        self.prior_scales
    }

    /// Lower bound of every standard deviation.
    pub fn sigma_floor(&self) -> f64 {
        self.sigma_floor
    }

    /// Upper bound of every standard deviation.
    pub fn sigma_ceiling(&self) -> f64 {
        self.sigma_ceiling
    }

    /// Run seed, if set.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Per-region wall-clock budget, if set.
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    /// Split R-hat rejection threshold.
    pub fn max_rhat(&self) -> f64 {
        self.max_rhat
    }

    /// Divergence rejection threshold.
    pub fn max_divergences(&self) -> usize {
        self.max_divergences
    }

    /// Total draws pooled over chains.
    pub fn total_draws(&self) -> usize {
        self.n_samples * self.n_chains
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidConfig`] describing the first bad setting.
    pub fn validate(&self) -> Result<(), SamplerError> {
        let invalid = |reason: String| Err(SamplerError::InvalidConfig { reason });

        if self.n_samples < 4 {
            return invalid(format!("n_samples must be >= 4, got {}", self.n_samples));
        }
        if self.n_chains < 2 {
            return invalid(format!("n_chains must be >= 2, got {}", self.n_chains));
        }
        if self.max_depth == 0 {
            return invalid("max_depth must be >= 1".to_string());
        }
        if !(self.target_accept > 0.0 && self.target_accept < 1.0) {
            return invalid(format!(
                "target_accept must be in (0, 1), got {}",
                self.target_accept
            ));
        }
        if !self.initial_state_variance.is_finite() || self.initial_state_variance <= 0.0 {
            return invalid(format!(
                "initial_state_variance must be finite and > 0, got {}",
                self.initial_state_variance
            ));
        }
        for (name, scale) in ["observation", "slope", "season"]
            .iter()
            .zip(self.prior_scales)
        {
            if !scale.is_finite() || scale <= 0.0 {
                return invalid(format!(
                    "{name} prior scale must be finite and > 0, got {scale}"
                ));
            }
        }
        if !(self.sigma_floor.is_finite() && self.sigma_floor > 0.0)
            || !self.sigma_ceiling.is_finite()
            || self.sigma_ceiling <= self.sigma_floor
        {
            return invalid(format!(
                "sigma bounds must satisfy 0 < floor < ceiling, got [{}, {}]",
                self.sigma_floor, self.sigma_ceiling
            ));
        }
        if !self.max_rhat.is_finite() || self.max_rhat < 1.0 {
            return invalid(format!("max_rhat must be finite and >= 1, got {}", self.max_rhat));
        }
        if let Some(budget) = self.time_budget
            && budget.is_zero()
        {
            return invalid("time_budget must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new()
    }
}
