//! loglik_optimizer::traits — the model and solver seams.
//!
//! - [`LogLikelihood`]: what a model implements to be fitted.
//! - [`Maximizer`]: the "maximize ℓ from θ₀" black box the separable
//!   estimators are written against. [`MLEOptions`] is the Argmin-backed
//!   implementation; tests inject their own.
//! - [`OptimOutcome`]: the normalized result of one run.
use argmin::core::{TerminationReason, TerminationStatus};

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        options::MLEOptions,
        solver::{self, grad_norm},
        validation::{finite_value, finite_theta_hat},
        FnEvalMap, Grad, Theta,
    },
};

/// A log-likelihood over an unconstrained parameter vector.
///
/// `value` may fail (for instance when the model covariance is not positive
/// definite); the error aborts the run and is returned unchanged. Models
/// without an analytic gradient keep the default `grad`, which makes the
/// adapter fall back to finite differences of the cost.
pub trait LogLikelihood {
    type Data: 'static;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64>;

    /// Reject a malformed `θ₀`/data pair before the solver starts.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    /// `∇ℓ(θ)`.
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// General-purpose quasi-Newton maximizer.
pub trait Maximizer {
    fn maximize<F: LogLikelihood>(
        &self, f: &F, theta0: Theta, data: &F::Data,
    ) -> OptResult<OptimOutcome>;
}

impl Maximizer for MLEOptions {
    fn maximize<F: LogLikelihood>(
        &self, f: &F, theta0: Theta, data: &F::Data,
    ) -> OptResult<OptimOutcome> {
        solver::maximize(f, theta0, data, self)
    }
}

/// Result of one maximization.
///
/// `value` is the best log-likelihood `ℓ(θ̂)`, not the Argmin cost.
/// `converged` is `true` only when the solver's own tolerances ended the
/// run; the iteration cap, a solver exit (such as a failed line search) or
/// an interrupt leave it `false` so callers can surface a warning.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    /// The iteration cap ended the run.
    pub capped: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// # Errors
    /// `MissingThetaHat` / `InvalidThetaHat` for an absent or non-finite
    /// best point and `NonFiniteCost` for a non-finite value.
    pub fn new(
        theta_hat: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = finite_theta_hat(theta_hat)?;
        finite_value(value)?;
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            )
        );
        let capped =
            matches!(termination, TerminationStatus::Terminated(TerminationReason::MaxItersReached));
        let status = match termination {
            TerminationStatus::NotTerminated => "not terminated".to_string(),
            TerminationStatus::Terminated(TerminationReason::MaxItersReached) => {
                "iteration cap reached".to_string()
            }
            TerminationStatus::Terminated(TerminationReason::SolverExit(text)) => text,
            TerminationStatus::Terminated(reason) => format!("{reason:?}"),
        };
        Ok(Self {
            theta_hat,
            value,
            converged,
            capped,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad_norm(grad.as_ref()),
        })
    }
}
