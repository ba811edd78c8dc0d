//! Statistical helper functions for posterior summaries and chain diagnostics.

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Sample variance with N-1 denominator.
/// Returns 0.0 if fewer than 2 elements.
pub fn variance(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let m = mean(data);
    data.iter().map(|&x| (x - m) * (x - m)).sum::<f64>() / (nf - 1.0)
}

/// Sample standard deviation with N-1 denominator.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// R's default quantile algorithm (type=7) on pre-sorted data.
///
/// Returns `None` for an empty slice. `p` is clamped to `[0, 1]`.
pub fn quantile_type7(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let n = sorted.len();
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    Some(sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo]))
}

/// Returns a sorted copy of `data`; NaN values sort last.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut out = data.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Split potential scale reduction factor (split R-hat).
///
/// Every chain is truncated to the shortest chain length, then cut into a
/// first and second half (the middle draw is dropped for odd lengths), so
/// `chains.len()` chains yield twice as many sequences. Values near 1.0
/// indicate the sequences agree; larger values indicate non-convergence.
///
/// Returns `None` when there are no chains or the half-chains hold fewer
/// than two draws. Returns `Some(1.0)` when every sequence is constant and
/// identical, and `Some(f64::INFINITY)` when the sequences are constant but
/// disagree.
pub fn split_rhat(chains: &[&[f64]]) -> Option<f64> {
    let n = chains.iter().map(|c| c.len()).min()?;
    let half = n / 2;
    if half < 2 {
        return None;
    }

    let mut sequences: Vec<&[f64]> = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        sequences.push(&chain[..half]);
        sequences.push(&chain[n - half..n]);
    }

    let m = sequences.len() as f64;
    let len = half as f64;
    let seq_means: Vec<f64> = sequences.iter().map(|s| mean(s)).collect();
    let seq_vars: Vec<f64> = sequences.iter().map(|s| variance(s)).collect();

    let grand = mean(&seq_means);
    let between = len / (m - 1.0) * seq_means.iter().map(|x| (x - grand).powi(2)).sum::<f64>();
    let within = mean(&seq_vars);

    if within <= 0.0 {
        return Some(if between <= 0.0 { 1.0 } else { f64::INFINITY });
    }

    let var_plus = (len - 1.0) / len * within + between / len;
    Some((var_plus / within).sqrt())
}
