//! Kronecker shape `(p, q)` of a separable covariance model.
//!
//! A vectorized p×q observation has length `d = p·q`; its covariance is
//! modeled through a p×p row factor `R` and a q×q column factor `C`. Vectors
//! are row-major, `vec(X)[i·q + a] = X[i, a]`, so entry `(i·q+a, j·q+b)` of
//! `R⊗C` equals `R[i,j]·C[a,b]`.
use crate::{
    optimization::numerical_stability::log_cholesky_len,
    separable::errors::{KronError, KronResult},
};

/// Dimensions of the row (`p`) and column (`q`) Kronecker factors.
///
/// Invariant: `p ≥ 1` and `q ≥ 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KronShape {
    pub p: usize,
    pub q: usize,
}

impl KronShape {
    /// Construct a validated [`KronShape`].
    ///
    /// # Errors
    /// - [`KronError::InvalidShape`] if `p == 0` or `q == 0`.
    pub fn new(p: usize, q: usize) -> KronResult<Self> {
        if p == 0 || q == 0 {
            return Err(KronError::InvalidShape { p, q });
        }
        Ok(KronShape { p, q })
    }

    /// Length of a vectorized observation, `p·q`.
    pub fn dim(&self) -> usize {
        self.p * self.q
    }

    /// θ-block length of the row factor, `p(p+1)/2`.
    pub fn r_params(&self) -> usize {
        log_cholesky_len(self.p)
    }

    /// θ-block length of the column factor, `q(q+1)/2`.
    pub fn c_params(&self) -> usize {
        log_cholesky_len(self.q)
    }

    /// Total θ length, `p(p+1)/2 + q(q+1)/2`.
    pub fn n_params(&self) -> usize {
        self.r_params() + self.c_params()
    }

    /// The transposed layout `(q, p)`.
    pub fn transposed(&self) -> Self {
        KronShape { p: self.q, q: self.p }
    }
}
