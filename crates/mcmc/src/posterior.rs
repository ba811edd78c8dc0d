//! Collapsed log posterior over the log standard deviations.
//!
//! `theta = (ln sigma_obs, ln sigma_slope, ln sigma_season)`; the latent
//! states are integrated out by the Kalman filter.

use epitrend_ssm::{InitialState, NoiseVariances, StateSpaceModel, log_likelihood};
use statrs::distribution::{Continuous, Normal};

use crate::config::SamplerConfig;
use crate::error::SamplerError;

/// Names of the sampled parameters, in `theta` order.
pub const PARAM_NAMES: [&str; 3] = ["sigma_obs", "sigma_slope", "sigma_season"];

pub(crate) type Theta = [f64; 3];

pub(crate) struct LogPosterior<'a> {
    model: &'a StateSpaceModel,
    y: &'a [f64],
    init: InitialState,
    priors: [Normal; 3],
    log_floor: f64,
    log_ceiling: f64,
}

impl<'a> LogPosterior<'a> {
    pub(crate) fn new(
        model: &'a StateSpaceModel,
        y: &'a [f64],
        config: &SamplerConfig,
    ) -> Result<Self, SamplerError> {
        let [s0, s1, s2] = config.prior_scales();
        let prior = |scale: f64| {
            Normal::new(0.0, scale).map_err(|e| SamplerError::InvalidConfig {
                reason: format!("prior scale {scale}: {e}"),
            })
        };
        Ok(Self {
            model,
            y,
            init: InitialState::diffuse(model.state_dim(), config.initial_state_variance()),
            priors: [prior(s0)?, prior(s1)?, prior(s2)?],
            log_floor: config.sigma_floor().ln(),
            log_ceiling: config.sigma_ceiling().ln(),
        })
    }

    pub(crate) fn model(&self) -> &StateSpaceModel {
        self.model
    }

    pub(crate) fn observations(&self) -> &[f64] {
        self.y
    }

    pub(crate) fn initial_state(&self) -> &InitialState {
        &self.init
    }

    pub(crate) fn bounds(&self) -> (f64, f64) {
        (self.log_floor, self.log_ceiling)
    }

    pub(crate) fn in_support(&self, theta: &Theta) -> bool {
        theta
            .iter()
            .all(|&t| t >= self.log_floor && t <= self.log_ceiling)
    }

    /// Half-normal log prior on each sigma plus the log-Jacobian of `sigma = exp(theta)`.
    pub(crate) fn log_prior(&self, theta: &Theta) -> f64 {
        if !self.in_support(theta) {
            return f64::NEG_INFINITY;
        }
        theta
            .iter()
            .zip(&self.priors)
            .map(|(&t, prior)| prior.ln_pdf(t.exp()) + t)
            .sum()
    }

    /// Unnormalised log posterior.
    ///
    /// `-inf` outside the support; `NaN` when the filter breaks down at an
    /// admissible point.
    pub(crate) fn log_density(&self, theta: &Theta) -> f64 {
        let lp = self.log_prior(theta);
        if lp == f64::NEG_INFINITY {
            return lp;
        }
        match log_likelihood(self.model, self.y, &noise_from_theta(theta), &self.init) {
            Ok(ll) => lp + ll,
            Err(_) => f64::NAN,
        }
    }
}

pub(crate) fn noise_from_theta(theta: &Theta) -> NoiseVariances {
    NoiseVariances::from_std_devs(theta[0].exp(), theta[1].exp(), theta[2].exp())
}
