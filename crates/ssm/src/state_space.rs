//! Local level + slope + seasonal state-space representation.
//!
//! ```text
//! alpha[t+1] = T * alpha[t] + R * eta[t]      (state transition)
//! y[t]       = Z[t] * alpha[t] + eps[t]       (observation)
//! ```
//!
//! with `alpha = [level, slope, season_1, ..., season_{S-1}]`.

use ndarray::{Array2, Array3, ArrayView1, Axis, s};

use crate::definition::{CompiledModel, ModelDefinition};
use crate::error::ModelError;

/// Builds the transition matrix `T` (m x m).
///
/// - `level[t+1] = level[t] + slope[t]`, `slope[t+1] = slope[t]`
/// - `season_1[t+1] = -(season_1[t] + ... + season_{S-1}[t])`
/// - `season_i[t+1] = season_{i-1}[t]` for the remaining slots
pub(crate) fn build_transition(season_period: usize) -> Array2<f64> {
    let m = season_period + 1;
    let mut t = Array2::zeros((m, m));

    t[[0, 0]] = 1.0;
    t[[0, 1]] = 1.0;
    t[[1, 1]] = 1.0;

    for j in 2..m {
        t[[2, j]] = -1.0;
    }
    for i in 3..m {
        t[[i, i - 1]] = 1.0;
    }
    t
}

/// Builds one observation loading block (1 x m): level plus active season.
pub(crate) fn build_design_row(season_period: usize) -> Array2<f64> {
    let m = season_period + 1;
    let mut z = Array2::zeros((1, m));
    z[[0, 0]] = 1.0;
    z[[0, 2]] = 1.0;
    z
}

/// Builds the disturbance loading `R` (m x 2).
///
/// Column 0 shocks the slope, column 1 shocks the active season slot.
pub(crate) fn build_selection(season_period: usize) -> Array2<f64> {
    let m = season_period + 1;
    let mut r = Array2::zeros((m, 2));
    r[[1, 0]] = 1.0;
    r[[2, 1]] = 1.0;
    r
}

/// Stacks `n_steps` copies of `row` into an `(n_steps, p, m)` array.
pub(crate) fn replicate_design(row: &Array2<f64>, n_steps: usize) -> Array3<f64> {
    let (p, m) = row.dim();
    let mut z = Array3::zeros((n_steps, p, m));
    for mut step in z.axis_iter_mut(Axis(0)) {
        step.assign(row);
    }
    z
}

pub(crate) fn check_shape(name: &str, got: &[usize], expected: &[usize]) -> Result<(), ModelError> {
    if got != expected {
        return Err(ModelError::DimensionMismatch {
            name: name.to_string(),
            expected: expected.to_vec(),
            got: got.to_vec(),
        });
    }
    Ok(())
}

/// The trend model for one series of fixed length.
///
/// Immutable after construction; share it by reference across chains.
///
/// # Example
///
/// ```
/// use epitrend_ssm::StateSpaceModel;
///
/// let model = StateSpaceModel::new(30, 7).unwrap();
/// assert_eq!(model.transition().shape(), &[8, 8]);
/// assert_eq!(model.design().shape(), &[30, 1, 8]);
/// assert_eq!(model.selection().shape(), &[8, 2]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StateSpaceModel {
    definition: ModelDefinition,
    transition: Array2<f64>,
    design: Array3<f64>,
    selection: Array2<f64>,
}

impl StateSpaceModel {
    /// Builds the model for `n_steps` observations and seasonal period `season_period`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSeasonPeriod`] if `season_period < 2`, or
    /// [`ModelError::EmptySeries`] if `n_steps == 0`.
    pub fn new(n_steps: usize, season_period: usize) -> Result<Self, ModelError> {
        ModelDefinition::new(season_period).build(n_steps)
    }

    /// Builds a model from a compiled template.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySeries`] if `n_steps == 0`.
    pub fn from_compiled(compiled: &CompiledModel, n_steps: usize) -> Result<Self, ModelError> {
        compiled.instantiate(n_steps)
    }

    /// Assembles a model from explicit matrices without checking them.
    ///
    /// Call [`StateSpaceModel::validate()`] before handing it to a sampler.
    pub fn from_raw_parts(
        definition: ModelDefinition,
        transition: Array2<f64>,
        design: Array3<f64>,
        selection: Array2<f64>,
    ) -> Self {
        Self {
            definition,
            transition,
            design,
            selection,
        }
    }

    /// The structural definition.
    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    /// Number of time steps `n`.
    pub fn n_steps(&self) -> usize {
        self.design.len_of(Axis(0))
    }

    /// State dimension `m`.
    pub fn state_dim(&self) -> usize {
        self.definition.state_dim()
    }

    /// Observation dimension `p`.
    pub fn obs_dim(&self) -> usize {
        self.definition.obs_dim()
    }

    /// Disturbance dimension `r`.
    pub fn disturbance_dim(&self) -> usize {
        self.definition.disturbance_dim()
    }

    /// Transition matrix `T` (m x m).
    pub fn transition(&self) -> &Array2<f64> {
        &self.transition
    }

    /// Observation loadings, shape `(n, p, m)`.
    pub fn design(&self) -> &Array3<f64> {
        &self.design
    }

    /// Observation loading row at step `t` (length m).
    ///
    /// # Panics
    ///
    /// Panics if `t >= n_steps()`.
    pub fn design_at(&self, t: usize) -> ArrayView1<'_, f64> {
        self.design.slice(s![t, 0, ..])
    }

    /// Disturbance loading `R` (m x r).
    pub fn selection(&self) -> &Array2<f64> {
        &self.selection
    }

    /// State innovation covariance `R diag(q_slope, q_season) Rᵀ` (m x m).
    pub fn state_covariance(&self, slope_var: f64, season_var: f64) -> Array2<f64> {
        let q = Array2::from_diag(&ndarray::arr1(&[slope_var, season_var]));
        self.selection.dot(&q).dot(&self.selection.t())
    }

    /// Checks every matrix against the dimensions implied by the definition.
    ///
    /// A failure here is a construction bug, not a data problem.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSeasonPeriod`], [`ModelError::EmptySeries`],
    /// or [`ModelError::DimensionMismatch`].
    pub fn validate(&self) -> Result<(), ModelError> {
        self.definition.validate()?;
        let n = self.design.len_of(Axis(0));
        if n == 0 {
            return Err(ModelError::EmptySeries);
        }
        let m = self.state_dim();
        let p = self.obs_dim();
        let r = self.disturbance_dim();
        check_shape("transition", self.transition.shape(), &[m, m])?;
        check_shape("design", self.design.shape(), &[n, p, m])?;
        check_shape("selection", self.selection.shape(), &[m, r])?;
        Ok(())
    }
}
