//! Unconditional simulation and conditional state draws.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::ModelError;
use crate::kalman::{InitialState, NoiseVariances, smoothed_states};
use crate::linalg::cholesky_psd;
use crate::state_space::StateSpaceModel;

/// Simulates states and observations from the model.
///
/// Returns `(states, observations)` with shapes `(n, m)` and `n`.
///
/// # Errors
///
/// Returns [`ModelError::InvalidVariance`] for negative variances and
/// [`ModelError::NotPositiveSemiDefinite`] if the initial covariance
/// cannot be factorised.
pub fn simulate<R: Rng + ?Sized>(
    model: &StateSpaceModel,
    noise: &NoiseVariances,
    init: &InitialState,
    rng: &mut R,
) -> Result<(Array2<f64>, Vec<f64>), ModelError> {
    for (name, value) in [
        ("observation", noise.observation),
        ("slope", noise.slope),
        ("season", noise.season),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ModelError::InvalidVariance { name, value });
        }
    }

    let n = model.n_steps();
    let m = model.state_dim();
    let chol = cholesky_psd(init.covariance(), "initial covariance")?;
    let t_mat = model.transition();
    let selection = model.selection();

    let sd_obs = noise.observation.sqrt();
    let sd_slope = noise.slope.sqrt();
    let sd_season = noise.season.sqrt();

    let xi: Array1<f64> = (0..m).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
    let mut alpha = init.mean() + &chol.dot(&xi);

    let mut states = Array2::zeros((n, m));
    let mut obs = Vec::with_capacity(n);
    for t in 0..n {
        states.row_mut(t).assign(&alpha);
        let eps: f64 = rng.sample(StandardNormal);
        obs.push(model.design_at(t).dot(&alpha) + sd_obs * eps);

        let eta = ndarray::arr1(&[
            sd_slope * rng.sample::<f64, _>(StandardNormal),
            sd_season * rng.sample::<f64, _>(StandardNormal),
        ]);
        alpha = t_mat.dot(&alpha) + selection.dot(&eta);
    }
    Ok((states, obs))
}

/// Draws one state path from `p(alpha | y, noise)`.
///
/// Uses the mean-correction simulation smoother: simulate `(alpha+, y+)`
/// unconditionally, then add the smoothed mean of `y - y+` under a
/// zero-mean prior. The result has the exact conditional distribution
/// because the smoothed mean is affine in the observations.
///
/// # Errors
///
/// Propagates errors from [`simulate()`] and the Kalman recursions.
pub fn draw_states<R: Rng + ?Sized>(
    model: &StateSpaceModel,
    y: &[f64],
    noise: &NoiseVariances,
    init: &InitialState,
    rng: &mut R,
) -> Result<Array2<f64>, ModelError> {
    if y.len() != model.n_steps() {
        return Err(ModelError::ObservationLength {
            expected: model.n_steps(),
            got: y.len(),
        });
    }
    let (plus_states, plus_obs) = simulate(model, noise, init, rng)?;
    let residual: Vec<f64> = y.iter().zip(&plus_obs).map(|(a, b)| a - b).collect();
    let correction = smoothed_states(model, &residual, noise, &init.centered())?;
    let draw = plus_states + correction;

    if draw.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteState { step: y.len() });
    }
    Ok(draw)
}
