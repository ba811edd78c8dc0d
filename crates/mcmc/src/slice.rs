//! Univariate slice sampling with bounded stepping-out and shrinkage.
//!
//! **Not part of the public API.**

use rand::Rng;

/// Shrinkage proposals tried before a transition is declared divergent.
const MAX_SHRINK: usize = 64;

/// Result of one univariate slice update.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SliceStep {
    /// New value of the coordinate.
    pub value: f64,
    /// Log density at `value`.
    pub log_density: f64,
    /// Whether the initial bracket had to be stepped out on either side.
    pub stepped_out: bool,
    /// Whether stepping-out hit the expansion limit on either side.
    pub saturated: bool,
    /// Whether a non-finite density was met or shrinkage did not terminate.
    pub divergent: bool,
}

/// One slice update of a coordinate currently at `x0` with log density `f0`.
///
/// The bracket of width `width` is stepped out at most `max_depth` times in
/// total, split randomly between the two sides, then shrunk towards `x0`.
/// `NaN` densities are treated as outside the slice and flag the step as
/// divergent. If shrinkage fails, the chain stays at `x0`.
pub(crate) fn slice_step<F, R>(
    mut log_density: F,
    x0: f64,
    f0: f64,
    width: f64,
    max_depth: usize,
    rng: &mut R,
) -> SliceStep
where
    F: FnMut(f64) -> f64,
    R: Rng + ?Sized,
{
    let mut divergent = false;
    let mut eval = |x: f64, divergent: &mut bool| {
        let v = log_density(x);
        if v.is_nan() {
            *divergent = true;
            f64::NEG_INFINITY
        } else {
            v
        }
    };

    // Height of the slice: log(u * p(x0)) with u ~ U(0, 1].
    let log_y = f0 + (1.0 - rng.random::<f64>()).ln();

    let mut left = x0 - width * rng.random::<f64>();
    let mut right = left + width;
    let mut left_budget =
        (((max_depth + 1) as f64 * rng.random::<f64>()).floor() as usize).min(max_depth);
    let mut right_budget = max_depth - left_budget;
    let mut saturated = false;
    let mut stepped_out = false;

    while eval(left, &mut divergent) > log_y {
        if left_budget == 0 {
            saturated = true;
            break;
        }
        left -= width;
        left_budget -= 1;
        stepped_out = true;
    }
    while eval(right, &mut divergent) > log_y {
        if right_budget == 0 {
            saturated = true;
            break;
        }
        right += width;
        right_budget -= 1;
        stepped_out = true;
    }

    for _ in 0..MAX_SHRINK {
        let x1 = left + rng.random::<f64>() * (right - left);
        let f1 = eval(x1, &mut divergent);
        if f1 >= log_y {
            return SliceStep {
                value: x1,
                log_density: f1,
                stepped_out,
                saturated,
                divergent,
            };
        }
        if x1 < x0 {
            left = x1;
        } else {
            right = x1;
        }
    }

    SliceStep {
        value: x0,
        log_density: f0,
        stepped_out,
        saturated,
        divergent: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn run(
        log_density: impl Fn(f64) -> f64,
        x0: f64,
        width: f64,
        n: usize,
        seed: u64,
    ) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = x0;
        let mut f = log_density(x);
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let step = slice_step(&log_density, x, f, width, 12, &mut rng);
            x = step.value;
            f = step.log_density;
            out.push(x);
        }
        out
    }

    #[test]
    fn recovers_standard_normal_moments() {
        let draws = run(|x| -0.5 * x * x, 0.0, 1.0, 20_000, 11);
        let mean = epitrend_stats::mean(&draws);
        let var = epitrend_stats::variance(&draws);
        assert_abs_diff_eq!(mean, 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(var, 1.0, epsilon = 0.08);
    }

    #[test]
    fn recovers_shifted_scaled_normal() {
        // N(3, 0.5^2), started far away with a poor width.
        let draws = run(|x| -0.5 * ((x - 3.0) / 0.5).powi(2), -4.0, 0.1, 20_000, 5);
        let kept = &draws[1_000..];
        assert_abs_diff_eq!(epitrend_stats::mean(kept), 3.0, epsilon = 0.05);
        assert_abs_diff_eq!(epitrend_stats::sd(kept), 0.5, epsilon = 0.05);
    }

    #[test]
    fn respects_truncated_support() {
        let draws = run(
            |x| if (0.0..=1.0).contains(&x) { 0.0 } else { f64::NEG_INFINITY },
            0.5,
            0.3,
            5_000,
            2,
        );
        assert!(draws.iter().all(|&x| (0.0..=1.0).contains(&x)));
        assert_abs_diff_eq!(epitrend_stats::mean(&draws), 0.5, epsilon = 0.03);
    }

    #[test]
    fn tiny_width_saturates() {
        let mut rng = StdRng::seed_from_u64(0);
        let step = slice_step(|x| -0.5 * x * x, 0.0, 0.0, 1e-4, 3, &mut rng);
        assert!(step.saturated);
        assert!(!step.divergent);
    }

    #[test]
    fn wide_bracket_rarely_steps_out() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut x = 0.0;
        let mut f = 0.0;
        let mut narrow = 0;
        let mut wide = 0;
        for _ in 0..2_000 {
            let step = slice_step(|x| -0.5 * x * x, x, f, 0.05, 12, &mut rng);
            narrow += usize::from(step.stepped_out);
            let (x1, f1) = (step.value, step.log_density);
            let step = slice_step(|x| -0.5 * x * x, x1, f1, 40.0, 12, &mut rng);
            wide += usize::from(step.stepped_out);
            x = step.value;
            f = step.log_density;
        }
        assert!(narrow > 1_800, "narrow bracket stepped out {narrow} times");
        assert!(wide < 300, "wide bracket stepped out {wide} times");
    }

    #[test]
    fn nan_density_flags_divergence() {
        let mut rng = StdRng::seed_from_u64(4);
        let f = |x: f64| if x > 0.2 { f64::NAN } else { -0.5 * x * x };
        let mut flagged = false;
        for _ in 0..50 {
            let step = slice_step(f, 0.0, 0.0, 2.0, 12, &mut rng);
            assert!(step.value <= 0.2);
            flagged |= step.divergent;
        }
        assert!(flagged);
    }

    #[test]
    fn deterministic_with_seed() {
        let a = run(|x| -0.5 * x * x, 0.0, 1.0, 100, 9);
        let b = run(|x| -0.5 * x * x, 0.0, 1.0, 100, 9);
        assert_eq!(a, b);
    }
}
