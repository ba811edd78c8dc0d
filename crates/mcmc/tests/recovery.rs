//! Posterior recovery on data simulated from the model itself.

use epitrend_mcmc::{PosteriorSampler, SamplerConfig, SliceSampler};
use epitrend_ssm::{InitialState, NoiseVariances, StateSpaceModel, simulate};
use ndarray::Array1;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn simulated(n: usize, slope: f64, seed: u64) -> (StateSpaceModel, Vec<f64>) {
    let model = StateSpaceModel::new(n, 7).unwrap();
    let mut mean = Array1::zeros(8);
    mean[0] = 4.0;
    mean[1] = slope;
    mean[2] = 0.2;
    mean[3] = -0.1;
    mean[4] = 0.05;
    let init = InitialState::new(mean, ndarray::Array2::zeros((8, 8))).unwrap();
    let noise = NoiseVariances::from_std_devs(0.05, 0.0005, 0.01);
    let mut rng = StdRng::seed_from_u64(seed);
    let (_, y) = simulate(&model, &noise, &init, &mut rng).unwrap();
    (model, y)
}

fn config() -> SamplerConfig {
    SamplerConfig::new()
        .with_n_warmup(100)
        .with_n_samples(100)
        .with_seed(2024)
        .with_max_rhat(1.5)
        .with_max_divergences(50)
}

#[test]
fn recovers_slope_of_simulated_series() {
    let (model, y) = simulated(56, 0.05, 7);
    let sampler = SliceSampler::new(config()).unwrap();
    let draws = sampler.sample(&model, &y, 0).unwrap();

    // Posterior mean slope over the last three weeks.
    let n = draws.n_draws();
    let mut total = 0.0;
    let mut count = 0;
    for d in 0..n {
        for t in 35..56 {
            total += draws.slope(d)[t];
            count += 1;
        }
    }
    let mean_slope = total / count as f64;
    assert!(
        (mean_slope - 0.05).abs() < 0.03,
        "posterior mean slope {mean_slope}"
    );
}

#[test]
fn observation_noise_is_small_for_smooth_data() {
    let (model, y) = simulated(56, 0.0, 11);
    let sampler = SliceSampler::new(config()).unwrap();
    let draws = sampler.sample(&model, &y, 1).unwrap();
    let sigma_obs = draws.sigmas().column(0).mean().unwrap();
    assert!(sigma_obs < 0.3, "posterior mean sigma_obs {sigma_obs}");
}

#[test]
fn draws_carry_chain_ids() {
    let (model, y) = simulated(28, 0.01, 3);
    let config = config().with_n_chains(3).with_n_warmup(30).with_n_samples(20);
    let sampler = SliceSampler::new(config).unwrap();
    let draws = sampler.sample(&model, &y, 2).unwrap();
    assert_eq!(draws.n_draws(), 60);
    let mut ids = draws.chain_ids().to_vec();
    ids.dedup();
    assert_eq!(ids, vec![0, 1, 2]);
}
