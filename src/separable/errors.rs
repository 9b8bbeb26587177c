//! Errors and soft warnings for separable covariance estimation.
//!
//! This module defines the model error type, [`KronError`], used by every
//! estimator in [`crate::separable`] and by the shared numerical helpers, and
//! the non-fatal [`FitWarning`] values attached to fit results.
//!
//! ## Conventions
//! - **Indices are 0-based**; component indices count separable components
//!   first and the null component last.
//! - Numerical breakdown inside a likelihood or partial-trace update
//!   (`NonPositiveDefinite`, `SingularMatrix`) aborts the current call; it is
//!   never turned into a `NaN` result.
//! - Running out of an iteration budget is a [`FitWarning`], not an error.
//! - Failures inside the mixture EM loop are wrapped in
//!   [`KronError::EmFailed`], which carries the iteration, the component and
//!   the last valid mixture state.
use crate::{optimization::errors::OptError, separable::models::mixture::MixtureFit};

/// Crate-wide result alias for separable-model operations.
pub type KronResult<T> = Result<T, KronError>;

/// Unified error type for separable covariance estimation.
#[derive(Debug, Clone, PartialEq)]
pub enum KronError {
    // ---- Shapes and data ----
    /// A vector or matrix does not have the size implied by `(p, q)`.
    InvalidDimension { what: &'static str, expected: usize, found: usize },

    /// Row/column factor dimensions must both be at least 1.
    InvalidShape { p: usize, q: usize },

    /// Observation matrix has no rows.
    EmptyData,

    /// An observation is NaN/±inf.
    NonFiniteData { row: usize, col: usize, value: f64 },

    /// Per-row weights must be finite, non-negative and not all zero.
    InvalidWeights { index: usize, value: f64, reason: &'static str },

    // ---- Linear algebra ----
    /// Cholesky factorization failed.
    NonPositiveDefinite { context: &'static str },

    /// A Kronecker factor could not be inverted.
    SingularMatrix { factor: &'static str },

    /// Symmetric eigendecomposition did not converge.
    EigenDecompositionFailed { dim: usize },

    // ---- Mixture ----
    /// A component's total responsibility fell below the configured floor.
    DegenerateComponent { component: usize, weight: f64 },

    // ---- Options validation ----
    /// Iteration caps must be ≥ 1.
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// Tolerances must be finite and > 0.
    InvalidTolerance { tol: f64, reason: &'static str },

    /// TED eigenvalue floor must be finite and ≥ 0.
    InvalidFloor { floor: f64 },

    /// TED rank must lie in `1..=dim`.
    InvalidRank { rank: usize, dim: usize },

    /// A mixture needs at least one separable component besides the null.
    InvalidComponentCount { n_components: usize },

    /// Unknown M-step strategy name.
    InvalidMStep { name: String },

    /// Partial-trace sub-iterations must be ≥ 1.
    InvalidSubIterations { sub_iters: usize },

    /// Degenerate-weight threshold must be finite and in `[0, 1)`.
    InvalidMinWeight { value: f64 },

    // ---- Estimation ----
    /// Error raised by the log-likelihood optimizer.
    Optimization(OptError),

    /// Mixture EM failed; `partial` holds the last valid state.
    EmFailed {
        iteration: usize,
        component: Option<usize>,
        source: Box<KronError>,
        partial: Box<MixtureFit>,
    },
}

impl std::error::Error for KronError {}

impl std::fmt::Display for KronError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Shapes and data ----
            KronError::InvalidDimension { what, expected, found } => {
                write!(f, "Invalid dimension for {what}: expected {expected}, found {found}")
            }
            KronError::InvalidShape { p, q } => {
                write!(f, "Invalid Kronecker shape ({p}, {q}): both factors need dimension >= 1")
            }
            KronError::EmptyData => write!(f, "Observation matrix is empty"),
            KronError::NonFiniteData { row, col, value } => {
                write!(f, "Non-finite observation at ({row}, {col}): {value}")
            }
            KronError::InvalidWeights { index, value, reason } => {
                write!(f, "Invalid weight at index {index}: {value}: {reason}")
            }

            // ---- Linear algebra ----
            KronError::NonPositiveDefinite { context } => {
                write!(f, "Cholesky factorization failed for {context}")
            }
            KronError::SingularMatrix { factor } => {
                write!(f, "Kronecker factor {factor} is numerically singular")
            }
            KronError::EigenDecompositionFailed { dim } => {
                write!(f, "Symmetric eigendecomposition failed for a {dim}x{dim} matrix")
            }

            // ---- Mixture ----
            KronError::DegenerateComponent { component, weight } => {
                write!(f, "Mixture component {component} is degenerate (weight {weight:e})")
            }

            // ---- Options validation ----
            KronError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            KronError::InvalidTolerance { tol, reason } => {
                write!(f, "Invalid tolerance {tol}: {reason}")
            }
            KronError::InvalidFloor { floor } => {
                write!(f, "Invalid eigenvalue floor {floor}: must be finite and >= 0")
            }
            KronError::InvalidRank { rank, dim } => {
                write!(f, "Invalid target rank {rank}: must lie in 1..={dim}")
            }
            KronError::InvalidComponentCount { n_components } => {
                write!(
                    f,
                    "Invalid component count {n_components}: need at least one separable component"
                )
            }
            KronError::InvalidMStep { name } => {
                write!(f, "Invalid M-step '{name}': expected 'approximate' or 'exact'")
            }
            KronError::InvalidSubIterations { sub_iters } => {
                write!(f, "Invalid partial-trace sub-iterations {sub_iters}: must be >= 1")
            }
            KronError::InvalidMinWeight { value } => {
                write!(f, "Invalid minimum component weight {value}: must be finite and in [0, 1)")
            }

            // ---- Estimation ----
            KronError::Optimization(err) => write!(f, "Optimization failed: {err}"),
            KronError::EmFailed { iteration, component, source, .. } => match component {
                Some(k) => write!(f, "EM failed at iteration {iteration}, component {k}: {source}"),
                None => write!(f, "EM failed at iteration {iteration}: {source}"),
            },
        }
    }
}

impl From<OptError> for KronError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::NonPositiveDefinite { context } => KronError::NonPositiveDefinite { context },
            OptError::SingularMatrix { factor } => KronError::SingularMatrix { factor },
            OptError::InvalidDimension { what, expected, found } => {
                KronError::InvalidDimension { what, expected, found }
            }
            other => KronError::Optimization(other),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<KronError> for pyo3::PyErr {
    fn from(err: KronError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

/// Non-fatal conditions observed during a fit.
#[derive(Debug, Clone, PartialEq)]
pub enum FitWarning {
    /// The quasi-Newton search stopped before meeting its tolerances, either
    /// on its iteration budget or because the solver gave up; `status` says
    /// which.
    ///
    /// `component` is `Some(k)` inside a mixture M-step.
    OptimizerNonConvergence { component: Option<usize>, iterations: usize, status: String },

    /// A mixture component's weight fell below the degenerate threshold at
    /// `iteration` and was handled according to the configured policy.
    DegenerateComponent { iteration: usize, component: usize, weight: f64 },
}

impl std::fmt::Display for FitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitWarning::OptimizerNonConvergence { component: Some(k), iterations, status } => {
                write!(f, "Component {k}: optimizer stopped after {iterations} iterations ({status})")
            }
            FitWarning::OptimizerNonConvergence { component: None, iterations, status } => {
                write!(f, "Optimizer stopped after {iterations} iterations ({status})")
            }
            FitWarning::DegenerateComponent { iteration, component, weight } => {
                write!(f, "Iteration {iteration}: component {component} degenerate (weight {weight:e})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Numerical optimizer errors come back as the matching model variant;
    // everything else is wrapped.
    //
    // Given
    // -----
    // - `OptError::SingularMatrix` and `OptError::MissingThetaHat`.
    //
    // Expect
    // ------
    // - `KronError::SingularMatrix` and `KronError::Optimization(..)`.
    fn from_opt_error_unwraps_numeric_kinds() {
        assert_eq!(
            KronError::from(OptError::SingularMatrix { factor: "R" }),
            KronError::SingularMatrix { factor: "R" }
        );
        assert_eq!(
            KronError::from(OptError::MissingThetaHat),
            KronError::Optimization(OptError::MissingThetaHat)
        );
    }

    #[test]
    // Purpose
    // -------
    // Error messages name the failing component and iteration.
    //
    // Given
    // -----
    // - A component-tagged and an untagged optimizer warning, and a
    //   degenerate-component error.
    //
    // Expect
    // ------
    // - Each rendered message contains its identifying numbers.
    fn display_mentions_component_and_iteration() {
        let tagged = FitWarning::OptimizerNonConvergence {
            component: Some(2),
            iterations: 5,
            status: "Maximum number of iterations reached".to_string(),
        };
        assert!(tagged.to_string().starts_with("Component 2"));
        let untagged = FitWarning::OptimizerNonConvergence {
            component: None,
            iterations: 7,
            status: "capped".to_string(),
        };
        assert!(untagged.to_string().contains("7 iterations"));
        let degenerate = KronError::DegenerateComponent { component: 1, weight: 0.0 };
        assert!(degenerate.to_string().contains("component 1"));
    }
}
