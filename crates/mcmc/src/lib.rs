//! # epitrend-mcmc
//!
//! Posterior sampler for the local level + slope + seasonal trend model.
//!
//! The sampler works on the collapsed posterior of the three log standard
//! deviations `theta = (ln sigma_obs, ln sigma_slope, ln sigma_season)`,
//! with the latent states integrated out by the Kalman filter. Each
//! retained iteration then draws a complete state trajectory from
//! `p(alpha | theta, y)` with the simulation smoother.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["y, StateSpaceModel"] --> B["Nelder-Mead mode"]
//!     B -->|"jitter per chain"| C["chain 0 .. n_chains"]
//!     C -->|"slice-within-Gibbs on theta"| D["theta draws"]
//!     D -->|"simulation smoother"| E["state draws"]
//!     E --> F["PosteriorDraws + split R-hat"]
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use epitrend_mcmc::{PosteriorSampler, SamplerConfig, SliceSampler};
//! use epitrend_ssm::StateSpaceModel;
//!
//! let y = vec![0.0; 45];
//! let model = StateSpaceModel::new(y.len(), 7).unwrap();
//! let sampler = SliceSampler::new(SamplerConfig::new().with_seed(42)).unwrap();
//! let draws = sampler.sample(&model, &y, 0).unwrap();
//! println!("max R-hat = {:.3}", draws.diagnostics().rhat().max());
//! ```
//!
//! ## Priors
//!
//! | Parameter | Prior | Default scale |
//! |-----------|-------|---------------|
//! | `sigma_obs` | half-normal, truncated | 1.0 |
//! | `sigma_slope` | half-normal, truncated | 0.1 |
//! | `sigma_season` | half-normal, truncated | 0.1 |
//! | `alpha_1` | `N(0, kappa I)` | `kappa = 1e3` |
//!
//! ## Diagnostics
//!
//! | Quantity | Meaning |
//! |----------|---------|
//! | divergences | non-finite density met, or shrinkage did not terminate |
//! | saturated | stepping-out reached `max_depth` expansions |
//! | split R-hat | agreement of `2 x n_chains` half-chains |

mod chain;
mod config;
mod draws;
mod error;
mod init;
mod posterior;
mod sampler;
mod slice;

pub use config::SamplerConfig;
pub use draws::{PosteriorDraws, RhatSummary, SamplerDiagnostics};
pub use error::SamplerError;
pub use posterior::PARAM_NAMES;
pub use sampler::{PosteriorSampler, SliceSampler, chain_seed};
