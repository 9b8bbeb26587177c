//! Shared validation helpers for separable estimators.
use ndarray::ArrayView1;

use crate::{
    optimization::errors::{OptError, OptResult},
    separable::{
        core::{params::KronFactors, shape::KronShape},
        errors::{KronError, KronResult},
    },
};

/// Iteration caps must be at least 1.
///
/// # Errors
/// [`KronError::InvalidMaxIter`].
pub fn validate_max_iter(max_iter: usize) -> KronResult<()> {
    if max_iter == 0 {
        return Err(KronError::InvalidMaxIter {
            max_iter,
            reason: "Iteration count must be greater than zero.",
        });
    }
    Ok(())
}

/// Tolerances must be finite and strictly positive.
///
/// # Errors
/// [`KronError::InvalidTolerance`].
pub fn validate_tol(tol: f64) -> KronResult<()> {
    if !tol.is_finite() {
        return Err(KronError::InvalidTolerance { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(KronError::InvalidTolerance { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// Check a θ vector against the log-Cholesky layout of `shape`.
///
/// # Errors
/// - [`OptError::ThetaLengthMismatch`] on a length mismatch.
/// - [`OptError::InvalidThetaInput`] for the first non-finite entry.
pub fn validate_theta(theta: ArrayView1<f64>, shape: KronShape) -> OptResult<()> {
    if theta.len() != shape.n_params() {
        return Err(OptError::ThetaLengthMismatch {
            expected: shape.n_params(),
            actual: theta.len(),
        });
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaInput { index, value });
    }
    Ok(())
}

/// Two shapes must agree factor by factor.
///
/// # Errors
/// [`KronError::InvalidDimension`] naming the first mismatched factor.
pub fn validate_shape(found: KronShape, expected: KronShape) -> KronResult<()> {
    if found.p != expected.p {
        return Err(KronError::InvalidDimension {
            what: "row factor",
            expected: expected.p,
            found: found.p,
        });
    }
    if found.q != expected.q {
        return Err(KronError::InvalidDimension {
            what: "column factor",
            expected: expected.q,
            found: found.q,
        });
    }
    Ok(())
}

/// Factors must match `shape`.
///
/// # Errors
/// [`KronError::InvalidDimension`] naming the mismatched factor.
pub fn validate_factors(factors: &KronFactors, shape: KronShape) -> KronResult<()> {
    validate_shape(factors.shape(), shape)
}
