//! One Markov chain: slice-within-Gibbs over `theta`, then state draws.
//!
//! **Not part of the public API.**

use std::time::Instant;

use epitrend_ssm::draw_states;
use ndarray::Array2;
use rand::Rng;

use crate::config::SamplerConfig;
use crate::error::SamplerError;
use crate::posterior::{LogPosterior, Theta, noise_from_theta};
use crate::slice::slice_step;

const INITIAL_WIDTH: f64 = 1.0;
const MIN_LOG_WIDTH: f64 = -6.9; // ~1e-3
const MAX_LOG_WIDTH: f64 = 2.3; // ~10
/// Robbins-Monro step size decays as `iter^-ADAPT_DECAY`.
const ADAPT_DECAY: f64 = 0.6;

/// Everything one chain produced after warm-up.
#[derive(Clone, Debug)]
pub(crate) struct ChainOutput {
    pub thetas: Vec<Theta>,
    pub states: Vec<Array2<f64>>,
    pub divergences: usize,
    pub saturated: usize,
    pub widths: [f64; 3],
}

/// Runs warm-up and sampling for one chain starting at `start`.
///
/// The deadline is checked before every iteration.
pub(crate) fn run_chain<R: Rng + ?Sized>(
    posterior: &LogPosterior<'_>,
    config: &SamplerConfig,
    start: Theta,
    rng: &mut R,
    deadline: Option<Instant>,
) -> Result<ChainOutput, SamplerError> {
    let n_warmup = config.n_warmup();
    let n_samples = config.n_samples();

    let mut theta = start;
    let mut density = posterior.log_density(&theta);
    let mut log_widths = [INITIAL_WIDTH.ln(); 3];

    let mut out = ChainOutput {
        thetas: Vec::with_capacity(n_samples),
        states: Vec::with_capacity(n_samples),
        divergences: 0,
        saturated: 0,
        widths: [INITIAL_WIDTH; 3],
    };

    for iter in 0..(n_warmup + n_samples) {
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            return Err(SamplerError::TimeBudgetExceeded {
                budget: config.time_budget().unwrap_or_default(),
            });
        }
        let warmup = iter < n_warmup;

        if !warmup && density.is_nan() {
            out.divergences += 1;
        }

        for k in 0..3 {
            let current = theta;
            let step = slice_step(
                |x| {
                    let mut proposal = current;
                    proposal[k] = x;
                    posterior.log_density(&proposal)
                },
                theta[k],
                density,
                log_widths[k].exp(),
                config.max_depth(),
                rng,
            );
            theta[k] = step.value;
            density = step.log_density;

            if warmup {
                // Widen while stepping-out is needed more often than
                // `1 - target_accept`, narrow otherwise.
                let eta = ((iter + 1) as f64).powf(-ADAPT_DECAY);
                let contained = if step.stepped_out { 0.0 } else { 1.0 };
                log_widths[k] = (log_widths[k] + eta * (config.target_accept() - contained))
                    .clamp(MIN_LOG_WIDTH, MAX_LOG_WIDTH);
            } else {
                out.divergences += usize::from(step.divergent);
                out.saturated += usize::from(step.saturated);
            }
        }

        if !warmup {
            let states = draw_states(
                posterior.model(),
                posterior.observations(),
                &noise_from_theta(&theta),
                posterior.initial_state(),
                rng,
            )?;
            out.thetas.push(theta);
            out.states.push(states);
        }
    }

    out.widths = log_widths.map(f64::exp);
    Ok(out)
}
