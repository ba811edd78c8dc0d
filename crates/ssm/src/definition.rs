//! Structural model definition and its compiled, length-independent form.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ModelError;
use crate::state_space::{self, StateSpaceModel};

/// Day-of-week seasonality.
pub const DEFAULT_SEASON_PERIOD: usize = 7;

/// One observed series per region.
pub const OBS_DIM: usize = 1;

/// Slope innovation and seasonal innovation.
pub const DISTURBANCE_DIM: usize = 2;

/// Bumped whenever the matrix construction changes, which invalidates cached artifacts.
const STRUCTURE_VERSION: u32 = 1;

const MODEL_NAME: &str = "local-level-slope-seasonal";

/// The structural definition of the trend model.
///
/// Everything about the matrices follows from the seasonal period `S`:
/// `m = S + 1` states, `p = 1` observation, `r = 2` disturbances.
///
/// # Example
///
/// ```
/// use epitrend_ssm::ModelDefinition;
///
/// let def = ModelDefinition::default();
/// assert_eq!(def.season_period(), 7);
/// assert_eq!(def.state_dim(), 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDefinition {
    season_period: usize,
}

impl ModelDefinition {
    /// Creates a definition with the given seasonal period.
    pub fn new(season_period: usize) -> Self {
        Self { season_period }
    }

    /// Seasonal period `S`.
    pub fn season_period(&self) -> usize {
        self.season_period
    }

    /// State dimension `m = S + 1`.
    pub fn state_dim(&self) -> usize {
        self.season_period + 1
    }

    /// Observation dimension `p`.
    pub fn obs_dim(&self) -> usize {
        OBS_DIM
    }

    /// Disturbance dimension `r`.
    pub fn disturbance_dim(&self) -> usize {
        DISTURBANCE_DIM
    }

    /// Short name used for cache artifacts.
    pub fn name(&self) -> &'static str {
        MODEL_NAME
    }

    /// Rejects periods that leave no seasonal slot.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSeasonPeriod`] if `S < 2`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.season_period < 2 {
            return Err(ModelError::InvalidSeasonPeriod {
                period: self.season_period,
            });
        }
        Ok(())
    }

    /// SHA-256 fingerprint of the structural definition (hex encoded).
    ///
    /// Two definitions share a fingerprint exactly when they produce the
    /// same matrices, so the fingerprint keys compiled-model caches.
    pub fn fingerprint(&self) -> String {
        let canonical = format!(
            "{MODEL_NAME};version={STRUCTURE_VERSION};S={};p={};r={}",
            self.season_period, OBS_DIM, DISTURBANCE_DIM
        );
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Builds the length-independent matrices.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSeasonPeriod`] if `S < 2`.
    pub fn compile(&self) -> Result<CompiledModel, ModelError> {
        self.validate()?;
        Ok(CompiledModel {
            definition: *self,
            fingerprint: self.fingerprint(),
            transition: state_space::build_transition(self.season_period),
            design_row: state_space::build_design_row(self.season_period),
            selection: state_space::build_selection(self.season_period),
        })
    }

    /// Builds the full model for a series of `n_steps` observations.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidSeasonPeriod`] if `S < 2`, or
    /// [`ModelError::EmptySeries`] if `n_steps == 0`.
    pub fn build(&self, n_steps: usize) -> Result<StateSpaceModel, ModelError> {
        self.compile()?.instantiate(n_steps)
    }
}

impl Default for ModelDefinition {
    fn default() -> Self {
        Self::new(DEFAULT_SEASON_PERIOD)
    }
}

/// Prepared, length-independent matrices of a [`ModelDefinition`].
///
/// This is the artifact shared read-only across regions (behind an `Arc`)
/// and persisted by [`FileCache`](crate::FileCache). Per-region models are
/// obtained with [`CompiledModel::instantiate()`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledModel {
    definition: ModelDefinition,
    fingerprint: String,
    transition: Array2<f64>,
    design_row: Array2<f64>,
    selection: Array2<f64>,
}

impl CompiledModel {
    /// Assembles a compiled model from explicit matrices without checking them.
    ///
    /// Call [`CompiledModel::validate()`] before use.
    pub fn from_raw_parts(
        definition: ModelDefinition,
        transition: Array2<f64>,
        design_row: Array2<f64>,
        selection: Array2<f64>,
    ) -> Self {
        Self {
            fingerprint: definition.fingerprint(),
            definition,
            transition,
            design_row,
            selection,
        }
    }

    /// The definition these matrices were built from.
    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    /// Fingerprint recorded at compile time.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Transition matrix `T` (m x m).
    pub fn transition(&self) -> &Array2<f64> {
        &self.transition
    }

    /// A single observation loading row block (p x m).
    pub fn design_row(&self) -> &Array2<f64> {
        &self.design_row
    }

    /// Disturbance loading `R` (m x r).
    pub fn selection(&self) -> &Array2<f64> {
        &self.selection
    }

    /// Checks that the stored fingerprint and matrix shapes agree with the definition.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::FingerprintMismatch`] or
    /// [`ModelError::DimensionMismatch`].
    pub fn validate(&self) -> Result<(), ModelError> {
        self.definition.validate()?;
        let expected = self.definition.fingerprint();
        if self.fingerprint != expected {
            return Err(ModelError::FingerprintMismatch {
                expected,
                got: self.fingerprint.clone(),
            });
        }
        let m = self.definition.state_dim();
        let p = self.definition.obs_dim();
        let r = self.definition.disturbance_dim();
        state_space::check_shape("transition", self.transition.shape(), &[m, m])?;
        state_space::check_shape("design", self.design_row.shape(), &[p, m])?;
        state_space::check_shape("selection", self.selection.shape(), &[m, r])?;
        Ok(())
    }

    /// Replicates the observation loading over `n_steps` and returns the full model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySeries`] if `n_steps == 0`.
    pub fn instantiate(&self, n_steps: usize) -> Result<StateSpaceModel, ModelError> {
        if n_steps == 0 {
            return Err(ModelError::EmptySeries);
        }
        Ok(StateSpaceModel::from_raw_parts(
            self.definition,
            self.transition.clone(),
            state_space::replicate_design(&self.design_row, n_steps),
            self.selection.clone(),
        ))
    }
}
