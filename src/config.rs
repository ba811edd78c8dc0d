use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level epitrend configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EpitrendConfig {
    /// Global RNG seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Raw table settings.
    #[serde(default)]
    pub source: SourceToml,

    /// Model structure and cache settings.
    #[serde(default)]
    pub model: ModelToml,

    /// Posterior sampler settings.
    #[serde(default)]
    pub sampler: SamplerToml,

    /// Driver settings.
    #[serde(default)]
    pub driver: DriverToml,

    /// Output settings.
    #[serde(default)]
    pub output: OutputToml,
}

impl EpitrendConfig {
    /// Reads `path`, or returns the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&toml_str)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceToml {
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_region_column")]
    pub region_column: String,
    #[serde(default = "default_cases_column")]
    pub cases_column: String,
    /// First day of every series, or `"first"` for the first observed date.
    #[serde(default = "default_epoch")]
    pub epoch: String,
    #[serde(default)]
    pub end: Option<String>,
}

impl Default for SourceToml {
    fn default() -> Self {
        Self {
            location: default_location(),
            date_column: default_date_column(),
            region_column: default_region_column(),
            cases_column: default_cases_column(),
            epoch: default_epoch(),
            end: None,
        }
    }
}

fn default_location() -> String {
    "https://raw.githubusercontent.com/nytimes/covid-19-data/master/us-counties.csv".to_string()
}
fn default_date_column() -> String {
    "date".to_string()
}
fn default_region_column() -> String {
    "state".to_string()
}
fn default_cases_column() -> String {
    "cases".to_string()
}
fn default_epoch() -> String {
    "2020-03-01".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    #[serde(default = "default_season_period")]
    pub season_period: usize,
    /// `"none"`, `"memory"`, or `"file"`.
    #[serde(default = "default_cache")]
    pub cache: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for ModelToml {
    fn default() -> Self {
        Self {
            season_period: default_season_period(),
            cache: default_cache(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_season_period() -> usize {
    7
}
fn default_cache() -> String {
    "memory".to_string()
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(".epitrend-cache")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerToml {
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,
    #[serde(default = "default_n_warmup")]
    pub n_warmup: usize,
    #[serde(default = "default_n_chains")]
    pub n_chains: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_target_accept")]
    pub target_accept: f64,
    #[serde(default = "default_initial_state_variance")]
    pub initial_state_variance: f64,
    /// Half-normal scales of `[sigma_obs, sigma_slope, sigma_season]`.
    #[serde(default = "default_prior_scales")]
    pub prior_scales: [f64; 3],
    #[serde(default = "default_sigma_floor")]
    pub sigma_floor: f64,
    #[serde(default = "default_sigma_ceiling")]
    pub sigma_ceiling: f64,
    #[serde(default)]
    pub time_budget_secs: Option<f64>,
    #[serde(default = "default_max_rhat")]
    pub max_rhat: f64,
    #[serde(default = "default_max_divergences")]
    pub max_divergences: usize,
}

impl Default for SamplerToml {
    fn default() -> Self {
        Self {
            n_samples: default_n_samples(),
            n_warmup: default_n_warmup(),
            n_chains: default_n_chains(),
            max_depth: default_max_depth(),
            target_accept: default_target_accept(),
            initial_state_variance: default_initial_state_variance(),
            prior_scales: default_prior_scales(),
            sigma_floor: default_sigma_floor(),
            sigma_ceiling: default_sigma_ceiling(),
            time_budget_secs: None,
            max_rhat: default_max_rhat(),
            max_divergences: default_max_divergences(),
        }
    }
}

fn default_n_samples() -> usize {
    150
}
fn default_n_warmup() -> usize {
    150
}
fn default_n_chains() -> usize {
    2
}
fn default_max_depth() -> usize {
    12
}
fn default_target_accept() -> f64 {
    0.9
}
fn default_initial_state_variance() -> f64 {
    1e3
}
fn default_prior_scales() -> [f64; 3] {
    [1.0, 0.1, 0.1]
}
fn default_sigma_floor() -> f64 {
    1e-3
}
fn default_sigma_ceiling() -> f64 {
    10.0
}
fn default_max_rhat() -> f64 {
    1.1
}
fn default_max_divergences() -> usize {
    10
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverToml {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for DriverToml {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputToml {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    /// `"csv"` or `"parquet"`; inferred from the extension when unset.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
    #[serde(default)]
    pub diagnostics: Option<PathBuf>,
}

impl Default for OutputToml {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: None,
            compression: default_compression(),
            row_group_size: default_row_group_size(),
            diagnostics: None,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("trends.csv")
}
fn default_compression() -> String {
    "snappy".to_string()
}
fn default_row_group_size() -> usize {
    1_000_000
}
