//! # epitrend-ssm
//!
//! Structural time-series model for daily case counts: a local level with a
//! stochastic slope and dummy-encoded day-of-week seasonality, together with
//! the Kalman recursions used to evaluate and sample from it.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["ModelDefinition::new(7)"] -->|"cache.get_or_build()"| B["Arc&lt;CompiledModel&gt;"]
//!     B -->|".instantiate(n)"| C["StateSpaceModel"]
//!     C -->|"log_likelihood()"| D["f64"]
//!     C -->|"smoothed_states()"| E["n x m means"]
//!     C -->|"draw_states(&mut rng)"| F["n x m draw"]
//! ```
//!
//! ## State Layout
//!
//! | Index | Component | Shocked by |
//! |-------|-----------|------------|
//! | 0 | level | (deterministic: level + slope) |
//! | 1 | slope | `R[1, 0]`, slope innovation |
//! | 2 | active season | `R[2, 1]`, seasonal innovation |
//! | 3..m | older seasons | (deterministic rotation) |
//!
//! ## Mathematical Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | T | [`StateSpaceModel::transition()`] | State transition (m x m) |
//! | Z | [`StateSpaceModel::design()`] | Observation loading, one (p x m) slice per step |
//! | R | [`StateSpaceModel::selection()`] | Disturbance loading (m x r) |
//! | H | [`NoiseVariances::observation`] | Observation noise variance |
//! | Q | [`NoiseVariances::slope`], [`NoiseVariances::season`] | Innovation variances |

mod cache;
mod definition;
mod error;
mod kalman;
mod linalg;
mod simulation;
mod state_space;

pub use cache::{FileCache, MemoryCache, ModelCache, NoCache};
pub use definition::{
    CompiledModel, DEFAULT_SEASON_PERIOD, DISTURBANCE_DIM, ModelDefinition, OBS_DIM,
};
pub use error::ModelError;
pub use kalman::{
    FilterOutput, InitialState, NoiseVariances, filter, log_likelihood, smooth, smoothed_states,
};
pub use simulation::{draw_states, simulate};
pub use state_space::StateSpaceModel;
