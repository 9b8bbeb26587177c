//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer the separable estimators are built on: an
//! Argmin-backed log-likelihood maximizer, numerically stable PSD transforms
//! and factorizations, and a single error/result surface for the solver.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer` maximizes a [`LogLikelihood`](loglik_optimizer::LogLikelihood)
//!   with L-BFGS, behind the [`Maximizer`](loglik_optimizer::Maximizer) trait.
//! - `numerical_stability` maps unconstrained θ-blocks to PSD factors and
//!   wraps `nalgebra` Cholesky / eigen routines.
//! - `errors::OptError` normalizes configuration mistakes, backend failures
//!   and model-side numerical errors raised during a run.
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; every user-facing
//!   value is expressed in terms of `ℓ`.
//! - No printing. The only observer is the optional `argmin-observer-slog`
//!   logger behind the `obs_slog` feature.
//!
//! Testing notes
//! -------------
//! - Submodule unit tests cover option validation, adapter sign handling,
//!   transforms and error conversions. End-to-end runs are exercised by the
//!   separable estimators and the integration suite.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
