//! Chain initialisation: posterior mode search plus per-chain jitter.
//!
//! **Not part of the public API.**

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

use crate::posterior::{LogPosterior, Theta};

/// Standard deviation of the per-chain jitter around the mode, in log-sigma units.
const JITTER_SD: f64 = 0.1;

/// Jittered starts tried before falling back to the unjittered point.
const MAX_JITTER_TRIES: usize = 10;

/// Starting point used when the mode search fails: half of each prior scale,
/// clamped into the support.
pub(crate) fn default_point(posterior: &LogPosterior<'_>, prior_scales: [f64; 3]) -> Theta {
    let (lo, hi) = posterior.bounds();
    prior_scales.map(|s| (0.5 * s).ln().clamp(lo, hi))
}

/// Negative log posterior for argmin.
struct NegLogPosterior<'p, 'a> {
    posterior: &'p LogPosterior<'a>,
}

impl CostFunction for NegLogPosterior<'_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let theta = [param[0], param[1], param[2]];
        let v = self.posterior.log_density(&theta);
        if v.is_finite() { Ok(-v) } else { Ok(f64::MAX) }
    }
}

/// Maximum a posteriori estimate of `theta` by Nelder-Mead.
///
/// Returns `None` if the search fails or ends at a non-finite density.
pub(crate) fn find_mode(posterior: &LogPosterior<'_>, start: Theta) -> Option<Theta> {
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(4);
    simplex.push(start.to_vec());
    for i in 0..3 {
        let mut vertex = start.to_vec();
        vertex[i] -= 0.5;
        simplex.push(vertex);
    }

    let cost = NegLogPosterior { posterior };
    let solver = NelderMead::new(simplex).with_sd_tolerance(1e-6).ok()?;
    let result = match Executor::new(cost, solver)
        .configure(|state| state.max_iters(500))
        .run()
    {
        Ok(result) => result,
        Err(e) => {
            debug!(error = %e, "mode search failed");
            return None;
        }
    };

    let best = result.state().best_param.as_ref()?;
    let theta = [best[0], best[1], best[2]];
    posterior.log_density(&theta).is_finite().then_some(theta)
}

/// Disperses a chain start around `center` and keeps it inside the support.
pub(crate) fn jittered_start<R: Rng + ?Sized>(
    posterior: &LogPosterior<'_>,
    center: Theta,
    rng: &mut R,
) -> Theta {
    let (lo, hi) = posterior.bounds();
    for _ in 0..MAX_JITTER_TRIES {
        let candidate =
            center.map(|c| (c + JITTER_SD * rng.sample::<f64, _>(StandardNormal)).clamp(lo, hi));
        if posterior.log_density(&candidate).is_finite() {
            return candidate;
        }
    }
    center
}
