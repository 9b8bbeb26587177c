//! Optimizer-layer errors.
//!
//! [`OptError`] covers three sources: invalid solver configuration, failures
//! reported by the `argmin` backend, and model-side numerical errors raised
//! while evaluating `ℓ(θ)` or its gradient. Model errors travel through
//! `argmin` boxed in its `Error` type and are recovered intact by the
//! `From<argmin::core::Error>` conversion.
use argmin::core::{ArgminError, Error};

use crate::separable::errors::KronError;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

/// Category of a failure reported by the `argmin` backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    InvalidParameter,
    NotImplemented,
    NotInitialized,
    ConditionViolated,
    CheckpointNotFound,
    PotentialBug,
    Impossible,
    /// Line-search or solver error without an `ArgminError` tag.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// The model has no analytic gradient; finite differences are used.
    GradientNotImplemented,
    GradientDimMismatch { expected: usize, found: usize },
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- Solver configuration ----
    InvalidTolGrad { tol: f64, reason: &'static str },
    InvalidTolCost { tol: f64, reason: &'static str },
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    NoTolerancesProvided,
    InvalidLineSearch { name: String, reason: &'static str },
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Evaluation and outcome ----
    /// `ℓ(θ)` was NaN or infinite.
    NonFiniteCost { value: f64 },
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },
    MissingThetaHat,
    /// Every restart of the search was stopped by a model error at a trial
    /// point; `cause` is the last such error.
    SearchAborted { restarts: usize, cause: Box<OptError> },

    // ---- Backend ----
    Backend { kind: BackendKind, text: String },

    // ---- θ layout ----
    /// θ length does not match the log-Cholesky layout of the shape.
    ThetaLengthMismatch { expected: usize, actual: usize },
    InvalidThetaInput { index: usize, value: f64 },

    // ---- Model side ----
    InvalidDimension { what: &'static str, expected: usize, found: usize },
    NonPositiveDefinite { context: &'static str },
    SingularMatrix { factor: &'static str },
    /// Any other model error, carried as text.
    Model { text: String },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::GradientNotImplemented => write!(f, "Analytic gradient not implemented"),
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient length mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient entry {index} ({value}): {reason}")
            }

            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "At least one of tol_grad, tol_cost or max_iter is required")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line search '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            OptError::NonFiniteCost { value } => write!(f, "Log-likelihood is not finite: {value}"),
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid optimum entry {index} ({value}): {reason}")
            }
            OptError::MissingThetaHat => write!(f, "Solver returned no parameter vector"),
            OptError::SearchAborted { restarts, cause } => {
                write!(f, "Line search aborted after {restarts} restarts: {cause}")
            }

            OptError::Backend { kind, text } => write!(f, "argmin {kind:?}: {text}"),

            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Theta entry {index} is not finite: {value}")
            }

            OptError::InvalidDimension { what, expected, found } => {
                write!(f, "Invalid dimension for {what}: expected {expected}, found {found}")
            }
            OptError::NonPositiveDefinite { context } => {
                write!(f, "Cholesky factorization failed for {context}")
            }
            OptError::SingularMatrix { factor } => {
                write!(f, "Kronecker factor {factor} is numerically singular")
            }
            OptError::Model { text } => write!(f, "Model error: {text}"),
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        let err = match err.downcast::<OptError>() {
            Ok(inner) => return inner,
            Err(err) => err,
        };
        let text = err.to_string();
        let kind = match err.downcast_ref::<ArgminError>() {
            Some(ArgminError::InvalidParameter { .. }) => BackendKind::InvalidParameter,
            Some(ArgminError::NotImplemented { .. }) => BackendKind::NotImplemented,
            Some(ArgminError::NotInitialized { .. }) => BackendKind::NotInitialized,
            Some(ArgminError::ConditionViolated { .. }) => BackendKind::ConditionViolated,
            Some(ArgminError::CheckpointNotFound { .. }) => BackendKind::CheckpointNotFound,
            Some(ArgminError::PotentialBug { .. }) => BackendKind::PotentialBug,
            Some(ArgminError::ImpossibleError { .. }) => BackendKind::Impossible,
            _ => BackendKind::Other,
        };
        OptError::Backend { kind, text }
    }
}

impl From<KronError> for OptError {
    fn from(err: KronError) -> Self {
        match err {
            KronError::InvalidDimension { what, expected, found } => {
                OptError::InvalidDimension { what, expected, found }
            }
            KronError::NonPositiveDefinite { context } => OptError::NonPositiveDefinite { context },
            KronError::SingularMatrix { factor } => OptError::SingularMatrix { factor },
            KronError::Optimization(inner) => inner,
            other => OptError::Model { text: other.to_string() },
        }
    }
}
