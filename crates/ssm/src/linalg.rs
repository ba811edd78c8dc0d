//! Small dense helpers for the Kalman recursions.
//!
//! State dimensions are tiny (`m = S + 1`), so plain loops over `ndarray`
//! storage are sufficient.

use ndarray::{Array1, Array2};

use crate::error::ModelError;

/// Lower-triangular factor `L` with `L Lᵀ = a` for a symmetric positive
/// semi-definite matrix.
///
/// Pivots that vanish up to rounding produce a zero column, so singular
/// covariances (deterministic state components) are accepted.
pub(crate) fn cholesky_psd(a: &Array2<f64>, name: &str) -> Result<Array2<f64>, ModelError> {
    let n = a.nrows();
    let scale = (0..n).map(|i| a[[i, i]].abs()).fold(0.0, f64::max).max(1.0);
    let tol = 1e-12 * scale;
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if !diag.is_finite() || diag < -tol {
            return Err(ModelError::NotPositiveSemiDefinite {
                name: name.to_string(),
            });
        }
        if diag <= tol {
            continue;
        }
        let pivot = diag.sqrt();
        l[[j, j]] = pivot;
        for i in (j + 1)..n {
            let mut v = a[[i, j]];
            for k in 0..j {
                v -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = v / pivot;
        }
    }
    Ok(l)
}

/// Replaces `p` by `(p + pᵀ) / 2` in place.
pub(crate) fn symmetrize(p: &mut Array2<f64>) {
    let n = p.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (p[[i, j]] + p[[j, i]]);
            p[[i, j]] = avg;
            p[[j, i]] = avg;
        }
    }
}

/// Outer product `u vᵀ`.
pub(crate) fn outer(u: &Array1<f64>, v: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((u.len(), v.len()), |(i, j)| u[i] * v[j])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn cholesky_spd() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky_psd(&a, "a").unwrap();
        let back = l.dot(&l.t());
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(back[[i, j]], a[[i, j]], epsilon = 1e-12);
            }
        }
        assert_abs_diff_eq!(l[[0, 1]], 0.0);
    }

    #[test]
    fn cholesky_singular() {
        // Rank one: [1, 1; 1, 1]
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let l = cholesky_psd(&a, "a").unwrap();
        let back = l.dot(&l.t());
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(back[[i, j]], a[[i, j]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn cholesky_zero_matrix() {
        let a = Array2::<f64>::zeros((3, 3));
        let l = cholesky_psd(&a, "a").unwrap();
        assert_abs_diff_eq!(l.sum(), 0.0);
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let a = array![[1.0, 0.0], [0.0, -1.0]];
        assert!(matches!(
            cholesky_psd(&a, "a"),
            Err(ModelError::NotPositiveSemiDefinite { .. })
        ));
    }

    #[test]
    fn symmetrize_averages() {
        let mut p = array![[1.0, 2.0], [4.0, 1.0]];
        symmetrize(&mut p);
        assert_abs_diff_eq!(p[[0, 1]], 3.0);
        assert_abs_diff_eq!(p[[1, 0]], 3.0);
    }

    #[test]
    fn outer_product() {
        let o = outer(&array![1.0, 2.0], &array![3.0, 4.0, 5.0]);
        assert_eq!(o.shape(), &[2, 3]);
        assert_abs_diff_eq!(o[[1, 2]], 10.0);
    }
}
