//! Observation containers and sufficient statistics.
//!
//! Purpose
//! -------
//! Hold the observation matrix `Y` (n rows of vectorized p×q matrices) in a
//! validated container and reduce it to the scatter statistics every
//! likelihood evaluation consumes.
//!
//! Key behaviors
//! -------------
//! - [`KronData::new`] rejects empty, mis-sized or non-finite input once, so
//!   estimators never re-validate.
//! - [`ScatterStats`] stores `S = Σ wᵢ yᵢ yᵢᵗ` and `W = Σ wᵢ`. The
//!   unweighted statistics use `wᵢ = 1`; mixture components use their
//!   responsibility column as weights.
//!
//! Invariants & assumptions
//! ------------------------
//! - `y.ncols() == shape.dim()` and `y.nrows() ≥ 1`; all entries finite.
//! - `ScatterStats::total_weight` is finite and strictly positive; the
//!   scatter matrix is symmetric.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction failures and the agreement of the
//!   weighted scatter with an explicit sum of outer products.
use ndarray::{Array2, ArrayView1, Axis};

use crate::{
    kronecker::blocks::check_square,
    optimization::numerical_stability::symmetrize,
    separable::{
        core::shape::KronShape,
        errors::{KronError, KronResult},
    },
};

/// Validated observation matrix.
///
/// Row `i` is `vec(Xᵢ)` in row-major order. Read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct KronData {
    pub y: Array2<f64>,
    pub shape: KronShape,
}

impl KronData {
    /// Construct a validated [`KronData`].
    ///
    /// # Errors
    /// - [`KronError::InvalidDimension`] if `y.ncols() != p·q`.
    /// - [`KronError::EmptyData`] if `y` has no rows.
    /// - [`KronError::NonFiniteData`] for the first NaN/±inf entry.
    pub fn new(y: Array2<f64>, shape: KronShape) -> KronResult<Self> {
        if y.ncols() != shape.dim() {
            return Err(KronError::InvalidDimension {
                what: "observation row",
                expected: shape.dim(),
                found: y.ncols(),
            });
        }
        if y.nrows() == 0 {
            return Err(KronError::EmptyData);
        }
        if let Some(((row, col), &value)) = y.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(KronError::NonFiniteData { row, col, value });
        }
        Ok(KronData { y, shape })
    }

    /// Number of observations `n`.
    pub fn n_obs(&self) -> usize {
        self.y.nrows()
    }

    /// Unweighted statistics `S = YᵗY`, `W = n`.
    pub fn scatter(&self) -> ScatterStats {
        let mut scatter = self.y.t().dot(&self.y);
        symmetrize(&mut scatter);
        ScatterStats { scatter, total_weight: self.n_obs() as f64, shape: self.shape }
    }

    /// Weighted statistics `S = Yᵗ diag(w) Y`, `W = Σ wᵢ`.
    ///
    /// # Errors
    /// - [`KronError::InvalidDimension`] if `weights.len() != n`.
    /// - [`KronError::InvalidWeights`] for a negative or non-finite weight,
    ///   or when the weights sum to zero.
    pub fn weighted_scatter(&self, weights: ArrayView1<f64>) -> KronResult<ScatterStats> {
        let n = self.n_obs();
        if weights.len() != n {
            return Err(KronError::InvalidDimension {
                what: "weight vector",
                expected: n,
                found: weights.len(),
            });
        }
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(KronError::InvalidWeights {
                    index,
                    value,
                    reason: "Weights must be finite and non-negative.",
                });
            }
        }
        let total_weight = weights.sum();
        if total_weight <= 0.0 {
            return Err(KronError::InvalidWeights {
                index: 0,
                value: total_weight,
                reason: "Weights must not all be zero.",
            });
        }
        let weighted = &self.y * &weights.insert_axis(Axis(1));
        let mut scatter = weighted.t().dot(&self.y);
        symmetrize(&mut scatter);
        Ok(ScatterStats { scatter, total_weight, shape: self.shape })
    }

    /// Empirical covariance `YᵗY / n` (mean assumed zero).
    pub fn empirical_covariance(&self) -> Array2<f64> {
        self.scatter().covariance()
    }
}

/// Sufficient statistics `(S, W)` for the separable Gaussian likelihood.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterStats {
    pub scatter: Array2<f64>,
    pub total_weight: f64,
    pub shape: KronShape,
}

impl ScatterStats {
    /// Wrap a precomputed scatter matrix.
    ///
    /// # Errors
    /// - [`KronError::InvalidDimension`] if `scatter` is not `(p·q)²`.
    /// - [`KronError::InvalidWeights`] if `total_weight` is not finite and > 0.
    /// - [`KronError::NonFiniteData`] for a non-finite scatter entry.
    pub fn new(scatter: Array2<f64>, total_weight: f64, shape: KronShape) -> KronResult<Self> {
        check_square(scatter.view(), shape.dim(), "scatter matrix")?;
        if !total_weight.is_finite() || total_weight <= 0.0 {
            return Err(KronError::InvalidWeights {
                index: 0,
                value: total_weight,
                reason: "Total weight must be finite and positive.",
            });
        }
        if let Some(((row, col), &value)) = scatter.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(KronError::NonFiniteData { row, col, value });
        }
        let mut scatter = scatter;
        symmetrize(&mut scatter);
        Ok(ScatterStats { scatter, total_weight, shape })
    }

    /// Normalized second moment `S / W`.
    pub fn covariance(&self) -> Array2<f64> {
        &self.scatter / self.total_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};

    fn shape12() -> KronShape {
        KronShape::new(1, 2).expect("1x2 is valid")
    }

    #[test]
    // Purpose
    // -------
    // Construction rejects the three kinds of malformed input.
    //
    // Given
    // -----
    // - A 2×3 matrix for shape (1, 2), an empty 0×2 matrix, and a matrix with
    //   NaN at (1, 0).
    //
    // Expect
    // ------
    // - `InvalidDimension`, `EmptyData` and `NonFiniteData { row: 1, col: 0 }`.
    fn new_rejects_malformed_input() {
        assert!(matches!(
            KronData::new(Array2::zeros((2, 3)), shape12()),
            Err(KronError::InvalidDimension { expected: 2, found: 3, .. })
        ));
        assert_eq!(KronData::new(Array2::zeros((0, 2)), shape12()), Err(KronError::EmptyData));
        assert!(matches!(
            KronData::new(array![[1.0, 2.0], [f64::NAN, 0.0]], shape12()),
            Err(KronError::NonFiniteData { row: 1, col: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The weighted scatter equals Σ wᵢ yᵢ yᵢᵗ and unit weights reproduce the
    // unweighted statistics.
    //
    // Given
    // -----
    // - Y = [[1, 2], [3, -1], [0, 1]] and w = [0.5, 2, 0].
    //
    // Expect
    // ------
    // - S[0,0] = 0.5 + 18, S[0,1] = 1 − 6, S[1,1] = 2 + 2; W = 2.5.
    fn weighted_scatter_matches_outer_products() {
        // Arrange
        let data = KronData::new(array![[1.0, 2.0], [3.0, -1.0], [0.0, 1.0]], shape12())
            .expect("valid data");

        // Act
        let stats = data.weighted_scatter(array![0.5, 2.0, 0.0].view()).expect("valid weights");
        let unit = data.weighted_scatter(Array1::ones(3).view()).expect("valid weights");

        // Assert
        assert_relative_eq!(stats.scatter[[0, 0]], 18.5);
        assert_relative_eq!(stats.scatter[[0, 1]], -5.0);
        assert_relative_eq!(stats.scatter[[1, 1]], 4.0);
        assert_relative_eq!(stats.total_weight, 2.5);
        assert_eq!(unit, data.scatter());
    }

    #[test]
    // Purpose
    // -------
    // Invalid weight vectors are rejected before any arithmetic.
    //
    // Given
    // -----
    // - A negative weight, an all-zero vector and a short vector.
    //
    // Expect
    // ------
    // - `InvalidWeights` twice and `InvalidDimension` once.
    fn weighted_scatter_rejects_bad_weights() {
        let data = KronData::new(array![[1.0, 2.0], [3.0, -1.0]], shape12()).expect("valid data");
        assert!(matches!(
            data.weighted_scatter(array![1.0, -0.1].view()),
            Err(KronError::InvalidWeights { index: 1, .. })
        ));
        assert!(matches!(
            data.weighted_scatter(array![0.0, 0.0].view()),
            Err(KronError::InvalidWeights { .. })
        ));
        assert!(matches!(
            data.weighted_scatter(array![1.0].view()),
            Err(KronError::InvalidDimension { .. })
        ));
    }
}
