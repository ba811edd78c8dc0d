//! Kalman filter and fixed-interval state smoother.
//!
//! The filter evaluates the exact Gaussian log-likelihood of the
//! observations with the latent states integrated out (prediction error
//! decomposition); the smoother returns `E[alpha_t | y_1..y_n]`.
//!
//! Recursions, with scalar observations:
//!
//! ```text
//! v_t = y_t - Z_t a_t              F_t = Z_t P_t Z_tᵀ + H
//! K_t = T P_t Z_tᵀ / F_t
//! a_{t+1} = T a_t + K_t v_t        P_{t+1} = T P_t Tᵀ - F_t K_t K_tᵀ + R Q Rᵀ
//!
//! r_{t-1} = Z_tᵀ v_t / F_t + L_tᵀ r_t,   L_t = T - K_t Z_t,   r_n = 0
//! alpha_hat_t = a_t + P_t r_{t-1}
//! ```

use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};

use crate::error::ModelError;
use crate::linalg::{outer, symmetrize};
use crate::state_space::StateSpaceModel;

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Observation and innovation variances `(H, q_slope, q_season)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseVariances {
    /// Observation noise variance `H`.
    pub observation: f64,
    /// Slope innovation variance.
    pub slope: f64,
    /// Seasonal innovation variance.
    pub season: f64,
}

impl NoiseVariances {
    /// Creates a set of variances.
    pub fn new(observation: f64, slope: f64, season: f64) -> Self {
        Self {
            observation,
            slope,
            season,
        }
    }

    /// Creates a set of variances from standard deviations.
    pub fn from_std_devs(observation: f64, slope: f64, season: f64) -> Self {
        Self::new(observation * observation, slope * slope, season * season)
    }

    fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [
            ("observation", self.observation),
            ("slope", self.slope),
            ("season", self.season),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidVariance { name, value });
            }
        }
        Ok(())
    }
}

/// Prior on the first state, `alpha_1 ~ N(mean, covariance)`.
#[derive(Clone, Debug, PartialEq)]
pub struct InitialState {
    mean: Array1<f64>,
    covariance: Array2<f64>,
}

impl InitialState {
    /// Zero mean and `variance * I`, an approximate diffuse prior.
    pub fn diffuse(state_dim: usize, variance: f64) -> Self {
        Self {
            mean: Array1::zeros(state_dim),
            covariance: Array2::eye(state_dim) * variance,
        }
    }

    /// Explicit mean and covariance.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DimensionMismatch`] if the shapes disagree.
    pub fn new(mean: Array1<f64>, covariance: Array2<f64>) -> Result<Self, ModelError> {
        let m = mean.len();
        crate::state_space::check_shape("initial covariance", covariance.shape(), &[m, m])?;
        Ok(Self { mean, covariance })
    }

    /// Mean of the first state.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Covariance of the first state.
    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    /// The same covariance with a zero mean.
    pub(crate) fn centered(&self) -> Self {
        Self {
            mean: Array1::zeros(self.mean.len()),
            covariance: self.covariance.clone(),
        }
    }
}

/// Everything the smoother needs from a filter pass.
#[derive(Clone, Debug)]
pub struct FilterOutput {
    /// Gaussian log-likelihood of the observations.
    pub log_likelihood: f64,
    /// Predicted states `a_t` (n x m).
    pub predicted_states: Array2<f64>,
    /// Predicted covariances `P_t` (n x m x m).
    pub predicted_covariances: Array3<f64>,
    /// Innovations `v_t`.
    pub innovations: Vec<f64>,
    /// Innovation variances `F_t`.
    pub innovation_variances: Vec<f64>,
    /// Kalman gains `K_t` (n x m).
    pub gains: Array2<f64>,
}

fn check_inputs(
    model: &StateSpaceModel,
    y: &[f64],
    noise: &NoiseVariances,
    init: &InitialState,
) -> Result<(), ModelError> {
    if y.len() != model.n_steps() {
        return Err(ModelError::ObservationLength {
            expected: model.n_steps(),
            got: y.len(),
        });
    }
    let m = model.state_dim();
    crate::state_space::check_shape("initial mean", init.mean.shape(), &[m])?;
    crate::state_space::check_shape("initial covariance", init.covariance.shape(), &[m, m])?;
    noise.validate()
}

/// Runs the forward recursion, handing each step's quantities to `visit`.
fn recurse<F>(
    model: &StateSpaceModel,
    y: &[f64],
    noise: &NoiseVariances,
    init: &InitialState,
    mut visit: F,
) -> Result<f64, ModelError>
where
    F: FnMut(usize, &Array1<f64>, &Array2<f64>, f64, f64, &Array1<f64>),
{
    check_inputs(model, y, noise, init)?;

    let t_mat = model.transition();
    let t_tr = t_mat.t();
    let rqr = model.state_covariance(noise.slope, noise.season);

    let mut a = init.mean.clone();
    let mut p = init.covariance.clone();
    let mut loglik = 0.0;

    for (t, &yt) in y.iter().enumerate() {
        let z = model.design_at(t);
        let pz = p.dot(&z);
        let f = z.dot(&pz) + noise.observation;
        if !f.is_finite() || f <= 0.0 {
            return Err(ModelError::NonPositiveVariance { step: t });
        }
        let v = yt - z.dot(&a);
        if !v.is_finite() {
            return Err(ModelError::NonFiniteState { step: t });
        }
        let k = t_mat.dot(&pz) / f;

        visit(t, &a, &p, v, f, &k);
        loglik -= 0.5 * (LN_2PI + f.ln() + v * v / f);

        a = t_mat.dot(&a) + &k * v;
        p = t_mat.dot(&p).dot(&t_tr) - outer(&k, &k) * f + &rqr;
        symmetrize(&mut p);
    }

    if !loglik.is_finite() {
        return Err(ModelError::NonFiniteState { step: y.len() });
    }
    Ok(loglik)
}

/// Gaussian log-likelihood `log p(y | noise)` with the states integrated out.
///
/// # Errors
///
/// Returns [`ModelError::ObservationLength`] for a length mismatch,
/// [`ModelError::InvalidVariance`] for negative variances, and
/// [`ModelError::NonPositiveVariance`] / [`ModelError::NonFiniteState`] when
/// the recursion breaks down numerically.
pub fn log_likelihood(
    model: &StateSpaceModel,
    y: &[f64],
    noise: &NoiseVariances,
    init: &InitialState,
) -> Result<f64, ModelError> {
    recurse(model, y, noise, init, |_, _, _, _, _, _| {})
}

/// Full filter pass, keeping the quantities needed for smoothing.
///
/// # Errors
///
/// Same as [`log_likelihood()`].
pub fn filter(
    model: &StateSpaceModel,
    y: &[f64],
    noise: &NoiseVariances,
    init: &InitialState,
) -> Result<FilterOutput, ModelError> {
    let n = y.len();
    let m = model.state_dim();
    let mut predicted_states = Array2::zeros((n, m));
    let mut predicted_covariances = Array3::zeros((n, m, m));
    let mut innovations = vec![0.0; n];
    let mut innovation_variances = vec![0.0; n];
    let mut gains = Array2::zeros((n, m));

    let log_likelihood = recurse(model, y, noise, init, |t, a, p, v, f, k| {
        predicted_states.row_mut(t).assign(a);
        predicted_covariances.index_axis_mut(Axis(0), t).assign(p);
        innovations[t] = v;
        innovation_variances[t] = f;
        gains.row_mut(t).assign(k);
    })?;

    Ok(FilterOutput {
        log_likelihood,
        predicted_states,
        predicted_covariances,
        innovations,
        innovation_variances,
        gains,
    })
}

/// Backward smoothing pass over a filter output; returns `alpha_hat` (n x m).
pub fn smooth(model: &StateSpaceModel, output: &FilterOutput) -> Array2<f64> {
    let n = output.innovations.len();
    let m = model.state_dim();
    let t_tr = model.transition().t();

    let mut r = Array1::<f64>::zeros(m);
    let mut smoothed = Array2::zeros((n, m));

    for t in (0..n).rev() {
        let z: ArrayView1<'_, f64> = model.design_at(t);
        let kr = output.gains.row(t).dot(&r);
        let mut r_prev = t_tr.dot(&r);
        r_prev.scaled_add(
            output.innovations[t] / output.innovation_variances[t] - kr,
            &z,
        );

        let p = output.predicted_covariances.index_axis(Axis(0), t);
        let alpha = &output.predicted_states.row(t) + &p.dot(&r_prev);
        smoothed.row_mut(t).assign(&alpha);
        r = r_prev;
    }
    smoothed
}

/// Smoothed state means `E[alpha_t | y]` (n x m).
///
/// # Errors
///
/// Same as [`log_likelihood()`].
pub fn smoothed_states(
    model: &StateSpaceModel,
    y: &[f64],
    noise: &NoiseVariances,
    init: &InitialState,
) -> Result<Array2<f64>, ModelError> {
    let output = filter(model, y, noise, init)?;
    Ok(smooth(model, &output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::cholesky_psd;
    use approx::assert_abs_diff_eq;

    /// Builds the joint covariance of y directly and evaluates the MVN log-density.
    fn direct_log_likelihood(
        model: &StateSpaceModel,
        y: &[f64],
        noise: &NoiseVariances,
        init: &InitialState,
    ) -> f64 {
        let n = y.len();
        let t_mat = model.transition();
        let rqr = model.state_covariance(noise.slope, noise.season);

        // Marginal state covariances V_t.
        let mut v = vec![init.covariance().clone()];
        for t in 1..n {
            let next = t_mat.dot(&v[t - 1]).dot(&t_mat.t()) + &rqr;
            v.push(next);
        }

        let mut sigma = Array2::<f64>::zeros((n, n));
        for s in 0..n {
            // Cov(alpha_t, alpha_s) = T^(t-s) V_s for t >= s.
            let mut cross = v[s].clone();
            for t in s..n {
                let zt = model.design_at(t);
                let zs = model.design_at(s);
                let c = zt.dot(&cross.dot(&zs));
                sigma[[t, s]] = c;
                sigma[[s, t]] = c;
                cross = t_mat.dot(&cross);
            }
            sigma[[s, s]] += noise.observation;
        }

        let l = cholesky_psd(&sigma, "sigma").unwrap();
        let mut w = vec![0.0; n];
        for i in 0..n {
            let mut acc = y[i];
            for k in 0..i {
                acc -= l[[i, k]] * w[k];
            }
            w[i] = acc / l[[i, i]];
        }
        let log_det: f64 = (0..n).map(|i| 2.0 * l[[i, i]].ln()).sum();
        let quad: f64 = w.iter().map(|x| x * x).sum();
        -0.5 * (n as f64 * LN_2PI + log_det + quad)
    }

    #[test]
    fn loglik_matches_direct_computation() {
        let model = StateSpaceModel::new(5, 3).unwrap();
        let y = [0.3, -0.2, 0.9, 1.4, 0.7];
        let noise = NoiseVariances::new(0.5, 0.1, 0.2);
        let init = InitialState::diffuse(model.state_dim(), 2.0);

        let kalman = log_likelihood(&model, &y, &noise, &init).unwrap();
        let direct = direct_log_likelihood(&model, &y, &noise, &init);
        assert_abs_diff_eq!(kalman, direct, epsilon = 1e-9);
    }

    #[test]
    fn filter_and_loglik_agree() {
        let model = StateSpaceModel::new(10, 7).unwrap();
        let y: Vec<f64> = (0..10).map(|t| (t as f64 * 0.3).sin() + 2.0).collect();
        let noise = NoiseVariances::new(0.1, 0.01, 0.01);
        let init = InitialState::diffuse(8, 100.0);
        let ll = log_likelihood(&model, &y, &noise, &init).unwrap();
        let out = filter(&model, &y, &noise, &init).unwrap();
        assert_abs_diff_eq!(ll, out.log_likelihood, epsilon = 1e-12);
        assert_eq!(out.predicted_states.shape(), &[10, 8]);
        assert_eq!(out.predicted_covariances.shape(), &[10, 8, 8]);
        assert!(out.innovation_variances.iter().all(|&f| f > 0.0));
    }

    #[test]
    fn smoother_recovers_linear_trend() {
        let n = 28;
        let model = StateSpaceModel::new(n, 7).unwrap();
        let y: Vec<f64> = (0..n).map(|t| 1.0 + 0.1 * t as f64).collect();
        let noise = NoiseVariances::new(1e-3, 1e-6, 1e-6);
        let init = InitialState::diffuse(8, 1e2);

        let smoothed = smoothed_states(&model, &y, &noise, &init).unwrap();
        for t in 0..n {
            assert_abs_diff_eq!(smoothed[[t, 1]], 0.1, epsilon = 5e-3);
            assert_abs_diff_eq!(smoothed[[t, 0]], y[t], epsilon = 5e-2);
        }
    }

    #[test]
    fn smoother_zero_series_is_zero() {
        let model = StateSpaceModel::new(14, 7).unwrap();
        let y = vec![0.0; 14];
        let noise = NoiseVariances::new(0.1, 0.01, 0.01);
        let init = InitialState::diffuse(8, 1e3);
        let smoothed = smoothed_states(&model, &y, &noise, &init).unwrap();
        assert_abs_diff_eq!(smoothed.iter().map(|x| x.abs()).sum::<f64>(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn length_mismatch() {
        let model = StateSpaceModel::new(5, 7).unwrap();
        let err = log_likelihood(
            &model,
            &[1.0, 2.0],
            &NoiseVariances::new(1.0, 1.0, 1.0),
            &InitialState::diffuse(8, 1.0),
        )
        .unwrap_err();
        assert_eq!(err, ModelError::ObservationLength { expected: 5, got: 2 });
    }

    #[test]
    fn negative_variance_rejected() {
        let model = StateSpaceModel::new(3, 7).unwrap();
        let err = log_likelihood(
            &model,
            &[1.0, 2.0, 3.0],
            &NoiseVariances::new(-1.0, 1.0, 1.0),
            &InitialState::diffuse(8, 1.0),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidVariance { name: "observation", .. }));
    }

    #[test]
    fn degenerate_prediction_variance() {
        // No prior uncertainty and no noise: F_0 = 0.
        let model = StateSpaceModel::new(3, 7).unwrap();
        let err = log_likelihood(
            &model,
            &[0.0, 0.0, 0.0],
            &NoiseVariances::new(0.0, 0.0, 0.0),
            &InitialState::diffuse(8, 0.0),
        )
        .unwrap_err();
        assert_eq!(err, ModelError::NonPositiveVariance { step: 0 });
    }

    #[test]
    fn non_finite_observation() {
        let model = StateSpaceModel::new(2, 7).unwrap();
        let err = log_likelihood(
            &model,
            &[1.0, f64::NAN],
            &NoiseVariances::new(1.0, 1.0, 1.0),
            &InitialState::diffuse(8, 1.0),
        )
        .unwrap_err();
        assert_eq!(err, ModelError::NonFiniteState { step: 1 });
    }
}
