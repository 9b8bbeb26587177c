//! separable — Kronecker-structured covariance estimation.
//!
//! Purpose
//! -------
//! Estimate covariances of the form `I + R⊗C` for vectorized p×q
//! observations, where `R` (p×p) and `C` (q×q) are PSD factors and the unit
//! noise is known. Provides the likelihood-based, least-squares and EM
//! estimators together with the unconstrained TED baseline.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds shapes, data and sufficient statistics, factor pairs and
//!   their log-Cholesky parameters, the (weighted) log-likelihood with its
//!   analytic gradient, and estimator options.
//! - [`models`] holds the estimators: [`SeparableModel`] (MLE),
//!   [`frobenius_als`], [`ted`], [`fit_uniform_em`] and [`fit_mixture`].
//! - [`errors`] defines [`KronError`] and the soft [`FitWarning`]s.
//!
//! Invariants & assumptions
//! ------------------------
//! - Observations are mean-zero rows of length `p·q`, vectorized row-major:
//!   entry `(i, a)` of the p×q matrix sits at index `i·q + a`, matching the
//!   `R⊗C` block layout.
//! - Only the product `R⊗C` is identified; every estimator returns factors
//!   whose individual scales depend on its starting point.
//!
//! Conventions
//! -----------
//! - Estimators are pure functions of their inputs and return result
//!   structs; nothing is cached on the model.
//! - Iterative estimators take a `&mut dyn ProgressSink`; pass
//!   [`NoProgress`] to ignore progress.
//!
//! Downstream usage
//! ----------------
//! - Rust callers usually `use separable_cov::separable::prelude::*;`.
//! - The Python bindings in the crate root are thin wrappers over the same
//!   entry points.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; recovery on simulated data, PSD
//!   sweeps and mixture behavior are covered in `tests/`.

pub mod core;
pub mod errors;
pub mod models;

pub use self::core::{
    data::{KronData, ScatterStats},
    options::{AlsOptions, DegeneratePolicy, EmOptions, MStep, TedOptions, UniformOptions},
    params::KronFactors,
    progress::{NoProgress, ProgressSink},
    shape::KronShape,
};
pub use self::errors::{FitWarning, KronError, KronResult};
pub use self::models::{
    als::{frobenius_als, AlsFit, AlsTermination},
    mixture::{fit_mixture, fit_mixture_with, ComponentKind, EmPhase, MixtureComponent, MixtureFit},
    mle::{MleFit, SeparableModel},
    ted::ted,
    uniform::{fit_uniform_em, opt_rc_uniform, UniformFit},
};

pub mod prelude {
    pub use crate::optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances};

    pub use super::core::loglik::{loglik, loglik_rows, null_loglik_rows};
    pub use super::{
        fit_mixture, fit_uniform_em, frobenius_als, ted, AlsOptions, DegeneratePolicy, EmOptions,
        FitWarning, KronData, KronError, KronFactors, KronResult, KronShape, MStep, NoProgress,
        ProgressSink, SeparableModel, TedOptions, UniformOptions,
    };
}
