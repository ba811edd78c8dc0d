//! # epitrend-trend
//!
//! Per-region trend estimation: fit the state-space model to every
//! region's `ln(1 + new_cases)` series, sample its posterior, and reduce
//! the slope draws to a daily fractional growth rate.
//!
//! ```mermaid
//! graph LR
//!     A["Vec<RegionSeries>"] -->|"sort, dedup"| B["TrendDriver"]
//!     C["ModelCache"] -->|"Arc<CompiledModel>"| B
//!     B -->|"per region"| D["PosteriorSampler"]
//!     D --> E["extract_trend"]
//!     E --> F["DriverReport"]
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use epitrend_mcmc::{SamplerConfig, SliceSampler};
//! use epitrend_ssm::MemoryCache;
//! use epitrend_trend::{DriverConfig, TrendDriver};
//!
//! # fn run(series: Vec<epitrend_io::RegionSeries>) -> Result<(), Box<dyn std::error::Error>> {
//! let sampler = SliceSampler::new(SamplerConfig::new().with_seed(42))?;
//! let driver = TrendDriver::new(
//!     DriverConfig::new().with_workers(4),
//!     Arc::new(MemoryCache::new()),
//!     Arc::new(sampler),
//! )?;
//! let report = driver.run(&series)?;
//! for failure in report.failures() {
//!     eprintln!("{}: {}", failure.region_id, failure.reason);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure policy
//!
//! | Failure | Scope |
//! |---------|-------|
//! | duplicate region id | whole run |
//! | model structure invalid | whole run |
//! | non-convergence, time budget, numerical error | region skipped |
//! | all-zero series | fitted, logged as suspect |

mod diagnostics;
mod driver;
mod error;
mod extract;

pub use diagnostics::write_diagnostics;
pub use driver::{
    DriverConfig, DriverReport, RegionFailure, RegionSummary, TrendDriver, region_stream,
};
pub use error::{DriverError, ExtractError};
pub use extract::{LOWER_QUANTILE, RegionTrend, UPPER_QUANTILE, extract_trend, summarize};
