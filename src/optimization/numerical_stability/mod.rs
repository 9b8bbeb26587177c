//! numerical_stability — PSD transforms, dense factorizations, stable sums.
//!
//! Purpose
//! -------
//! Collect the numerical primitives the separable estimators are composed
//! from: the log-Cholesky map between unconstrained vectors and PSD
//! Kronecker factors, a thin `ndarray` ↔ `nalgebra` bridge for Cholesky and
//! symmetric eigendecompositions, and a max-shifted log-sum-exp.
//!
//! Key behaviors
//! -------------
//! - [`transformations::log_cholesky_decode`] always yields a symmetric PSD
//!   matrix; [`transformations::log_cholesky_encode`] inverts it and falls
//!   back to a jittered diagonal for singular PSD input.
//! - [`transformations::log_cholesky_grad`] propagates `∂ℓ/∂X` to the
//!   θ-block so likelihoods can supply analytic gradients.
//! - [`linalg::SpdFactor`] exposes `log det` and the explicit inverse from a
//!   single Cholesky factorization; failures become typed errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - θ-block layout is `[strict lower (row-major), log-diagonal]`.
//! - Shape mismatches are reported as `InvalidDimension`; factorization
//!   failures as `NonPositiveDefinite`, `SingularMatrix` or
//!   `EigenDecompositionFailed`. Nothing here panics on bad numbers.
//!
//! Conventions
//! -----------
//! - `ndarray` is the storage type at every public boundary; `nalgebra`
//!   matrices never escape [`linalg`].
//! - No logging, no I/O, no global state.
//!
//! Testing notes
//! -------------
//! - Unit tests check closed forms, encode/decode recovery and the chain
//!   rule against `finitediff`. Random PSD sweeps are in `tests/`.

pub mod linalg;
pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::linalg::{
    factor_inverse, from_dmatrix, symmetric_eigen, symmetrize, to_dmatrix, SpdFactor,
};
pub use self::transformations::{
    log_cholesky_decode, log_cholesky_encode, log_cholesky_factor, log_cholesky_grad,
    log_cholesky_len, log_sum_exp, psd_from_parts, CHOLESKY_JITTER, EIGEN_EPS,
};

pub mod prelude {
    pub use super::linalg::SpdFactor;
    pub use super::transformations::{
        log_cholesky_decode, log_cholesky_encode, log_sum_exp, psd_from_parts,
    };
}
