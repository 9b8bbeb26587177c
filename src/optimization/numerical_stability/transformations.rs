//! Numerically stable parameter transforms.
//!
//! Maps between the unconstrained optimizer vector and symmetric PSD
//! Kronecker factors, plus the log-sum-exp reduction used to normalize
//! mixture responsibilities.
//!
//! # Provided items
//! - [`log_cholesky_decode`]: θ-block ↦ `L Lᵗ` with `diag(L) = exp(·)`.
//! - [`log_cholesky_encode`]: PSD matrix ↦ θ-block (Cholesky, log diagonal),
//!   with a diagonal jitter retry for singular PSD input.
//! - [`log_cholesky_grad`]: pulls `∂ℓ/∂X` back to `∂ℓ/∂θ`.
//! - [`log_sum_exp`]: max-shifted `ln Σ exp(xᵢ)`.
//!
//! # θ-block layout
//! For a `d × d` factor the block has length `d(d+1)/2`: first the strict
//! lower triangle of `L` in row-major order (`(1,0), (2,0), (2,1), …`), then
//! the `d` log-diagonal entries.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{
    optimization::numerical_stability::linalg::SpdFactor,
    separable::errors::{KronError, KronResult},
};

/// Eigenvalues below this magnitude are treated as zero in PSD checks.
pub const EIGEN_EPS: f64 = 1e-10;

/// Relative diagonal jitter added when encoding a singular PSD matrix.
pub const CHOLESKY_JITTER: f64 = 1e-8;

/// Length of the θ-block for a `d × d` factor: `d(d+1)/2`.
pub fn log_cholesky_len(dim: usize) -> usize {
    dim * (dim + 1) / 2
}

/// Build `L Lᵗ` from strict-lower entries and log-diagonal values.
///
/// The dimension is taken from `log_diag.len()`.
///
/// # Errors
/// [`KronError::InvalidDimension`] if `lower.len() != d(d-1)/2`.
pub fn psd_from_parts(lower: ArrayView1<f64>, log_diag: ArrayView1<f64>) -> KronResult<Array2<f64>> {
    let l = lower_factor(lower, log_diag)?;
    Ok(l.dot(&l.t()))
}

/// Decode a θ-block of length `d(d+1)/2` into a `d × d` PSD matrix.
///
/// # Errors
/// [`KronError::InvalidDimension`] on a length mismatch.
pub fn log_cholesky_decode(theta: ArrayView1<f64>, dim: usize) -> KronResult<Array2<f64>> {
    let l = log_cholesky_factor(theta, dim)?;
    Ok(l.dot(&l.t()))
}

/// Decode a θ-block into its lower-triangular factor `L`.
///
/// # Errors
/// [`KronError::InvalidDimension`] on a length mismatch.
pub fn log_cholesky_factor(theta: ArrayView1<f64>, dim: usize) -> KronResult<Array2<f64>> {
    let expected = log_cholesky_len(dim);
    if theta.len() != expected {
        return Err(KronError::InvalidDimension {
            what: "log-Cholesky parameter block",
            expected,
            found: theta.len(),
        });
    }
    let n_strict = expected - dim;
    lower_factor(theta.slice(ndarray::s![..n_strict]), theta.slice(ndarray::s![n_strict..]))
}

fn lower_factor(lower: ArrayView1<f64>, log_diag: ArrayView1<f64>) -> KronResult<Array2<f64>> {
    let dim = log_diag.len();
    let expected = dim * dim.saturating_sub(1) / 2;
    if lower.len() != expected {
        return Err(KronError::InvalidDimension {
            what: "strict-lower entries",
            expected,
            found: lower.len(),
        });
    }
    let mut l = Array2::<f64>::zeros((dim, dim));
    let mut k = 0;
    for i in 1..dim {
        for j in 0..i {
            l[[i, j]] = lower[k];
            k += 1;
        }
    }
    for i in 0..dim {
        l[[i, i]] = log_diag[i].exp();
    }
    Ok(l)
}

/// Encode a symmetric PSD matrix as a θ-block.
///
/// A matrix that is PSD but singular (e.g. a rank-deficient ALS output) is
/// retried once with `CHOLESKY_JITTER · max(1, mean diag)` added to the
/// diagonal.
///
/// # Errors
/// [`KronError::NonPositiveDefinite`] if neither attempt factorizes.
pub fn log_cholesky_encode(a: ArrayView2<f64>) -> KronResult<Array1<f64>> {
    let dim = a.nrows();
    let l = match SpdFactor::new(a, "log-Cholesky encode") {
        Ok(f) => f.lower(),
        Err(_) => {
            let mean_diag = a.diag().sum() / dim.max(1) as f64;
            let jitter = CHOLESKY_JITTER * mean_diag.abs().max(1.0);
            let mut shifted = a.to_owned();
            shifted.diag_mut().mapv_inplace(|v| v + jitter);
            SpdFactor::new(shifted.view(), "log-Cholesky encode")?.lower()
        }
    };
    let mut theta = Array1::<f64>::zeros(log_cholesky_len(dim));
    let mut k = 0;
    for i in 1..dim {
        for j in 0..i {
            theta[k] = l[[i, j]];
            k += 1;
        }
    }
    for i in 0..dim {
        theta[k + i] = l[[i, i]].ln();
    }
    Ok(theta)
}

/// Chain rule from `∂ℓ/∂X` to the θ-block, for `X = L Lᵗ`.
///
/// `∂ℓ/∂L = (D + Dᵗ) L` with `D = ∂ℓ/∂X`; strict-lower θ entries take
/// `∂ℓ/∂Lᵢⱼ` and log-diagonal entries take `∂ℓ/∂Lᵢᵢ · Lᵢᵢ`.
pub fn log_cholesky_grad(l: ArrayView2<f64>, d_x: ArrayView2<f64>) -> Array1<f64> {
    let dim = l.nrows();
    let d_l = (&d_x + &d_x.t()).dot(&l);
    let mut grad = Array1::<f64>::zeros(log_cholesky_len(dim));
    let mut k = 0;
    for i in 1..dim {
        for j in 0..i {
            grad[k] = d_l[[i, j]];
            k += 1;
        }
    }
    for i in 0..dim {
        grad[k + i] = d_l[[i, i]] * l[[i, i]];
    }
    grad
}

/// Stable `ln Σ exp(xᵢ)`.
///
/// Returns `-∞` for an empty slice or when every entry is `-∞`.
pub fn log_sum_exp(values: ArrayView1<f64>) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::numerical_stability::linalg::symmetric_eigen;
    use approx::assert_relative_eq;
    use finitediff::FiniteDiff;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Decode at the origin and PSD-ness on a deterministic parameter grid.
    // - Encode/decode recovery, including the singular jitter path.
    // - The analytic chain rule against finite differences.
    // - log-sum-exp in the overflow and all-(-∞) regimes.
    //
    // Random-draw PSD checks over dimensions 1..=20 live in the integration
    // suite.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The all-zero θ-block decodes to the identity.
    //
    // Given
    // -----
    // - θ = 0 of length 6 (d = 3).
    //
    // Expect
    // ------
    // - The decoded matrix is I₃.
    fn zero_block_decodes_to_identity() {
        let decoded = log_cholesky_decode(Array1::zeros(6).view(), 3).expect("length 6 is d = 3");
        assert_eq!(decoded, Array2::eye(3));
    }

    #[test]
    // Purpose
    // -------
    // Decoded matrices are symmetric with non-negative spectrum even for
    // large-magnitude parameters.
    //
    // Given
    // -----
    // - A d = 4 block filled with alternating ±7.5·k values.
    //
    // Expect
    // ------
    // - Exact symmetry and min eigenvalue ≥ -EIGEN_EPS · max eigenvalue.
    fn decode_is_psd_for_extreme_parameters() {
        // Arrange
        let theta = Array1::from_shape_fn(10, |k| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            sign * 7.5 * k as f64 / 10.0
        });

        // Act
        let x = log_cholesky_decode(theta.view(), 4).expect("length 10 is d = 4");
        let (eig, _) = symmetric_eigen(x.view()).expect("decoded matrix is symmetric");

        // Assert
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(x[[i, j]], x[[j, i]]);
            }
        }
        let max = eig.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(eig.iter().all(|&e| e >= -EIGEN_EPS * max.max(1.0)));
    }

    #[test]
    // Purpose
    // -------
    // Encoding inverts decoding for positive-definite input.
    //
    // Given
    // -----
    // - A = [[2, 0.3, 0], [0.3, 1, -0.2], [0, -0.2, 0.5]].
    //
    // Expect
    // ------
    // - decode(encode(A)) = A to 1e-12.
    fn encode_then_decode_recovers_spd_matrix() {
        // Arrange
        let a = array![[2.0, 0.3, 0.0], [0.3, 1.0, -0.2], [0.0, -0.2, 0.5]];

        // Act
        let theta = log_cholesky_encode(a.view()).expect("A is SPD");
        let back = log_cholesky_decode(theta.view(), 3).expect("length matches");

        // Assert
        for ((i, j), v) in a.indexed_iter() {
            assert_relative_eq!(back[[i, j]], *v, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // A singular PSD matrix is still encodable; an indefinite one is not.
    //
    // Given
    // -----
    // - The rank-one matrix 11ᵗ (2×2) and [[1, 2], [2, 1]].
    //
    // Expect
    // ------
    // - The rank-one matrix encodes to finite θ and decodes close to itself;
    //   the indefinite matrix yields `NonPositiveDefinite`.
    fn encode_jitters_singular_input_and_rejects_indefinite() {
        let rank_one = array![[1.0, 1.0], [1.0, 1.0]];
        let theta = log_cholesky_encode(rank_one.view()).expect("jitter makes it SPD");
        assert!(theta.iter().all(|t| t.is_finite()));
        let back = log_cholesky_decode(theta.view(), 2).expect("length matches");
        assert_relative_eq!(back[[0, 1]], 1.0, epsilon = 1e-6);

        let indefinite = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(matches!(
            log_cholesky_encode(indefinite.view()),
            Err(KronError::NonPositiveDefinite { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Length mismatches are usage errors, not panics.
    //
    // Given
    // -----
    // - A length-5 block declared as d = 3, and parts with 2 strict-lower
    //   entries for a 3-entry diagonal.
    //
    // Expect
    // ------
    // - `InvalidDimension` with expected 6 and 3 respectively.
    fn length_mismatch_is_invalid_dimension() {
        assert_eq!(
            log_cholesky_decode(Array1::zeros(5).view(), 3),
            Err(KronError::InvalidDimension {
                what: "log-Cholesky parameter block",
                expected: 6,
                found: 5
            })
        );
        assert!(matches!(
            psd_from_parts(array![0.1, 0.2].view(), array![0.0, 0.0, 0.0].view()),
            Err(KronError::InvalidDimension { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The analytic θ-gradient of f(X) = tr(B X) matches finite differences.
    //
    // Given
    // -----
    // - A non-symmetric weight B (3×3) and a generic θ-block.
    //
    // Expect
    // ------
    // - `log_cholesky_grad(L, B)` equals the central-difference gradient
    //   to 1e-6.
    fn chain_rule_matches_finite_differences() {
        // Arrange
        let b = array![[1.0, -0.5, 0.2], [0.3, 2.0, 0.0], [-0.4, 0.1, 0.7]];
        let theta = array![0.2, -0.3, 0.5, 0.1, -0.2, 0.3];
        let f = |t: &Array1<f64>| -> f64 {
            let x = log_cholesky_decode(t.view(), 3).expect("length matches");
            (&b * &x.t()).sum()
        };

        // Act
        let l = log_cholesky_factor(theta.view(), 3).expect("length matches");
        let analytic = log_cholesky_grad(l.view(), b.view());
        let numeric = theta.central_diff(&f);

        // Assert
        for k in 0..6 {
            assert_relative_eq!(analytic[k], numeric[k], epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // log-sum-exp does not overflow and handles the all-(-∞) case.
    //
    // Given
    // -----
    // - [1000, 1000] and [-∞, -∞].
    //
    // Expect
    // ------
    // - 1000 + ln 2 and -∞ respectively.
    fn log_sum_exp_is_stable() {
        assert_relative_eq!(log_sum_exp(array![1000.0, 1000.0].view()), 1000.0 + 2f64.ln());
        assert_eq!(
            log_sum_exp(array![f64::NEG_INFINITY, f64::NEG_INFINITY].view()),
            f64::NEG_INFINITY
        );
    }
}
