//! Dense linear-algebra bridge between `ndarray` and `nalgebra`.
//!
//! Matrices live in `ndarray` everywhere in the crate; factorizations
//! (Cholesky, symmetric eigen) are delegated to `nalgebra`. This module owns
//! the copies between the two and turns factorization failures into
//! [`KronError`] values instead of `Option`s or panics.
use nalgebra::{linalg::Cholesky, DMatrix, Dyn};
use ndarray::{Array1, Array2, ArrayView2};

use crate::separable::errors::{KronError, KronResult};

/// Copy an `ndarray` matrix into a column-major `DMatrix`.
pub fn to_dmatrix(a: ArrayView2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Copy a `DMatrix` back into an `ndarray` matrix.
pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Replace `a` by `(a + aᵗ) / 2` in place.
pub fn symmetrize(a: &mut Array2<f64>) {
    let n = a.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (a[[i, j]] + a[[j, i]]);
            a[[i, j]] = avg;
            a[[j, i]] = avg;
        }
    }
}

/// Cholesky factor of a symmetric positive-definite matrix.
///
/// Built once per likelihood evaluation; exposes the log-determinant and
/// the explicit inverse (chol2inv), which is what the separable likelihood
/// and its gradient consume.
#[derive(Debug, Clone)]
pub struct SpdFactor {
    chol: Cholesky<f64, Dyn>,
}

impl SpdFactor {
    /// Factor `a`.
    ///
    /// # Errors
    /// [`KronError::NonPositiveDefinite`] tagged with `context` when `a`
    /// contains non-finite entries or the factorization breaks down.
    pub fn new(a: ArrayView2<f64>, context: &'static str) -> KronResult<Self> {
        if a.iter().any(|v| !v.is_finite()) {
            return Err(KronError::NonPositiveDefinite { context });
        }
        let chol = to_dmatrix(a).cholesky().ok_or(KronError::NonPositiveDefinite { context })?;
        Ok(Self { chol })
    }

    /// `log det A = 2 Σ log Lᵢᵢ`.
    pub fn log_det(&self) -> f64 {
        2.0 * self.chol.l_dirty().diagonal().iter().map(|d| d.ln()).sum::<f64>()
    }

    /// Explicit, symmetrized inverse `A⁻¹`.
    pub fn inverse(&self) -> Array2<f64> {
        let mut inv = from_dmatrix(&self.chol.inverse());
        symmetrize(&mut inv);
        inv
    }

    /// Lower-triangular factor `L` with `A = L Lᵗ`.
    pub fn lower(&self) -> Array2<f64> {
        from_dmatrix(&self.chol.l())
    }
}

/// Inverse of a Kronecker factor that must be symmetric positive definite.
///
/// # Errors
/// [`KronError::SingularMatrix`] naming `factor` when the Cholesky
/// factorization fails or the inverse is not finite.
pub fn factor_inverse(a: ArrayView2<f64>, factor: &'static str) -> KronResult<Array2<f64>> {
    let inv = SpdFactor::new(a, "Kronecker factor")
        .map_err(|_| KronError::SingularMatrix { factor })?
        .inverse();
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(KronError::SingularMatrix { factor });
    }
    Ok(inv)
}

/// Symmetric eigendecomposition `A = V diag(λ) Vᵗ`.
///
/// Eigenvalues are returned in the order produced by `nalgebra` (unsorted);
/// column `k` of the second array is the eigenvector of `λ[k]`.
///
/// # Errors
/// [`KronError::EigenDecompositionFailed`] if the iteration does not
/// converge or the input is not finite.
pub fn symmetric_eigen(a: ArrayView2<f64>) -> KronResult<(Array1<f64>, Array2<f64>)> {
    let dim = a.nrows();
    if a.iter().any(|v| !v.is_finite()) {
        return Err(KronError::EigenDecompositionFailed { dim });
    }
    let eig = to_dmatrix(a)
        .try_symmetric_eigen(f64::EPSILON, 0)
        .ok_or(KronError::EigenDecompositionFailed { dim })?;
    let values = Array1::from_iter(eig.eigenvalues.iter().copied());
    Ok((values, from_dmatrix(&eig.eigenvectors)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Round-trip copies between `ndarray` and `nalgebra`.
    // - Log-determinant and inverse from the Cholesky factor.
    // - Failure reporting for indefinite and singular inputs.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The Cholesky-based log-determinant and inverse agree with closed forms.
    //
    // Given
    // -----
    // - A = [[4, 2], [2, 3]] with det 8 and inverse [[3, -2], [-2, 4]] / 8.
    //
    // Expect
    // ------
    // - log_det = ln 8; inverse matches entrywise; A = L Lᵗ.
    fn spd_factor_matches_closed_form_2x2() {
        // Arrange
        let a = array![[4.0, 2.0], [2.0, 3.0]];

        // Act
        let factor = SpdFactor::new(a.view(), "test").expect("A is SPD");
        let inv = factor.inverse();
        let l = factor.lower();

        // Assert
        assert_relative_eq!(factor.log_det(), 8.0_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(inv[[0, 0]], 3.0 / 8.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[0, 1]], -2.0 / 8.0, epsilon = 1e-12);
        assert_relative_eq!(inv[[1, 1]], 4.0 / 8.0, epsilon = 1e-12);
        let rebuilt = l.dot(&l.t());
        for ((i, j), v) in a.indexed_iter() {
            assert_relative_eq!(rebuilt[[i, j]], *v, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Indefinite, NaN-laden and singular inputs are reported with the
    // matching error kind.
    //
    // Given
    // -----
    // - An indefinite matrix, a matrix with NaN, and a rank-one matrix.
    //
    // Expect
    // ------
    // - `NonPositiveDefinite` for the first two; `SingularMatrix` naming
    //   the factor for the rank-one matrix.
    fn factorization_failures_are_typed() {
        let indefinite = array![[1.0, 2.0], [2.0, 1.0]];
        let with_nan = array![[1.0, f64::NAN], [f64::NAN, 1.0]];
        let rank_one = array![[1.0, 1.0], [1.0, 1.0]];

        assert_eq!(
            SpdFactor::new(indefinite.view(), "M").err(),
            Some(KronError::NonPositiveDefinite { context: "M" })
        );
        assert!(SpdFactor::new(with_nan.view(), "M").is_err());
        assert_eq!(
            factor_inverse(rank_one.view(), "R").err(),
            Some(KronError::SingularMatrix { factor: "R" })
        );
    }

    #[test]
    // Purpose
    // -------
    // Eigenpairs returned by `symmetric_eigen` reconstruct the input.
    //
    // Given
    // -----
    // - A symmetric 3×3 matrix.
    //
    // Expect
    // ------
    // - V diag(λ) Vᵗ equals the input to 1e-10.
    fn symmetric_eigen_reconstructs_input() {
        // Arrange
        let a = array![[2.0, 0.5, 0.1], [0.5, 1.0, -0.3], [0.1, -0.3, 3.0]];

        // Act
        let (values, vectors) = symmetric_eigen(a.view()).expect("symmetric input");
        let rebuilt = vectors.dot(&Array2::from_diag(&values)).dot(&vectors.t());

        // Assert
        for ((i, j), v) in a.indexed_iter() {
            assert_relative_eq!(rebuilt[[i, j]], *v, epsilon = 1e-10);
        }
    }
}
