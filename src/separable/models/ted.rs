//! Truncated eigenvalue decomposition (TED) covariance baseline.
//!
//! Given an empirical covariance `S` of `y = x + e` with `e ~ N(0, I)`, TED
//! estimates `Cov(x)` without imposing separability:
//!
//! 1. `S = V diag(λ) Vᵗ`;
//! 2. `dₖ = max(λₖ − 1, floor)`;
//! 3. every eigenvalue outside the top `rank` (by `λ`) is set to `floor`;
//! 4. return `V diag(d) Vᵗ`.
//!
//! It is a single pass and serves as the unconstrained comparison point for
//! the separable estimators, and as the denoising step of the approximate
//! mixture M-step.
use ndarray::{Array2, ArrayView2};

use crate::{
    optimization::numerical_stability::{symmetric_eigen, symmetrize},
    separable::{
        core::options::TedOptions,
        errors::{KronError, KronResult},
    },
};

/// TED estimate of the signal covariance.
///
/// # Errors
/// - [`KronError::InvalidDimension`] if `s` is not square.
/// - [`KronError::InvalidRank`] if `opts.rank` exceeds the dimension.
/// - [`KronError::InvalidFloor`] if `opts.floor` is negative or not finite.
/// - [`KronError::EigenDecompositionFailed`] for non-finite input.
pub fn ted(s: ArrayView2<f64>, opts: &TedOptions) -> KronResult<Array2<f64>> {
    let dim = s.nrows();
    if s.ncols() != dim {
        return Err(KronError::InvalidDimension {
            what: "TED input (square)",
            expected: dim,
            found: s.ncols(),
        });
    }
    if !opts.floor.is_finite() || opts.floor < 0.0 {
        return Err(KronError::InvalidFloor { floor: opts.floor });
    }
    let rank = opts.rank.unwrap_or(dim);
    if rank == 0 || rank > dim {
        return Err(KronError::InvalidRank { rank, dim });
    }

    let (values, vectors) = symmetric_eigen(s)?;
    let mut order: Vec<usize> = (0..dim).collect();
    order.sort_by(|&i, &j| values[j].total_cmp(&values[i]));

    let mut scaled = vectors.clone();
    for (position, &k) in order.iter().enumerate() {
        let d = if position < rank { (values[k] - 1.0).max(opts.floor) } else { opts.floor };
        scaled.column_mut(k).mapv_inplace(|v| v * d);
    }
    let mut out = scaled.dot(&vectors.t());
    symmetrize(&mut out);
    Ok(out)
}
