//! loglik_optimizer — Argmin-backed log-likelihood maximizer.
//!
//! Purpose
//! -------
//! Provide the quasi-Newton black box that the separable estimators are
//! built on. A model implements [`LogLikelihood`] over an unconstrained
//! parameter vector [`Theta`] and calls [`maximize`] (or any
//! [`Maximizer`]) to run L-BFGS with a configurable line search.
//!
//! Key behaviors
//! -------------
//! - Convert `ℓ(θ)` into the Argmin cost `c(θ) = -ℓ(θ)` via
//!   [`adapter::NegLogLik`], falling back to finite differences when a
//!   model has no analytic gradient.
//! - Build and run the solver in [`solver`], configured by [`MLEOptions`].
//! - Normalize results into an [`OptimOutcome`] whose `converged` flag is
//!   `false` when the iteration cap, not a tolerance, stopped the run.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer never clamps or bounds θ; positivity of covariance
//!   factors comes from the log-Cholesky parameterization upstream.
//! - Errors raised by a model inside a cost evaluation abort the run and
//!   come back out as the same [`OptError`] variant.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the sign convention and FD fallback of the adapter,
//!   solver runs on a paraboloid, option validation and outcome
//!   classification.
//! - Full runs are exercised by the separable MLE and mixture EM tests.

pub mod adapter;
pub mod options;
pub mod solver;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::options::{LineSearcher, MLEOptions, Tolerances};
pub use self::solver::maximize;
pub use self::traits::{LogLikelihood, Maximizer, OptimOutcome};
pub use self::types::{Cost, FnEvalMap, Grad, Theta, DEFAULT_LBFGS_MEM, DEFAULT_MAX_ITER};

pub mod prelude {
    pub use super::options::{LineSearcher, MLEOptions, Tolerances};
    pub use super::solver::maximize;
    pub use super::traits::{LogLikelihood, Maximizer, OptimOutcome};
    pub use super::types::{Cost, Grad, Theta};
}
