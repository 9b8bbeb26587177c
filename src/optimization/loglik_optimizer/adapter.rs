//! loglik_optimizer::adapter — a [`LogLikelihood`] seen as an Argmin
//! minimization problem.
//!
//! The cost is `c(θ) = -s·ℓ(θ)` for a positive scale `s` (1 unless the
//! solver restarts with a shrunken objective) and analytic gradients are
//! negated and scaled the same way. When a model has no gradient the cost
//! itself is finite-differenced, so that path needs no sign flip.
//!
//! Argmin swallows errors raised inside a line search, so the adapter can
//! also write the first model error it returns into a caller-owned
//! [`FailureLog`].
use std::cell::RefCell;

use argmin::core::{CostFunction, Error as ArgminFailure, Gradient};
use finitediff::FiniteDiff;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};

/// First model error returned to Argmin during a run.
pub type FailureLog = RefCell<Option<OptError>>;

/// `(model, data)` pair handed to the Argmin executor.
#[derive(Debug, Clone)]
pub struct NegLogLik<'a, F: LogLikelihood> {
    pub model: &'a F,
    pub data: &'a F::Data,
    pub scale: f64,
    failures: Option<&'a FailureLog>,
}

impl<'a, F: LogLikelihood> NegLogLik<'a, F> {
    pub fn new(model: &'a F, data: &'a F::Data) -> Self {
        NegLogLik { model, data, scale: 1.0, failures: None }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_failure_log(mut self, log: &'a FailureLog) -> Self {
        self.failures = Some(log);
        self
    }

    fn record(&self, err: OptError) -> ArgminFailure {
        if let Some(log) = self.failures {
            log.borrow_mut().get_or_insert_with(|| err.clone());
        }
        err.into()
    }

    /// `-s·ℓ(θ)` without touching the failure log.
    fn scaled_cost(&self, theta: &Theta) -> Result<Cost, OptError> {
        let ell = self.model.value(theta, self.data)?;
        if ell.is_finite() {
            Ok(-self.scale * ell)
        } else {
            Err(OptError::NonFiniteCost { value: ell })
        }
    }

    /// Finite-difference gradient of the cost.
    ///
    /// `finitediff` wants an infallible `Fn(&Theta) -> f64`, so the first
    /// model error is stashed and the stencil point scores `NaN`. A stashed
    /// error or a non-finite central difference triggers one forward
    /// difference; whatever that one reports is final.
    fn numeric_gradient(&self, theta: &Theta) -> Result<Grad, OptError> {
        let failure: FailureLog = RefCell::new(None);
        let scored = |point: &Theta| -> f64 {
            self.scaled_cost(point).unwrap_or_else(|err| {
                failure.borrow_mut().get_or_insert(err);
                f64::NAN
            })
        };

        let central = theta.central_diff(&scored);
        let central_failed = failure.borrow_mut().take().is_some();
        if !central_failed && validate_grad(&central, theta.len()).is_ok() {
            return Ok(central);
        }

        let forward = theta.forward_diff(&scored);
        if let Some(err) = failure.into_inner() {
            return Err(err);
        }
        validate_grad(&forward, theta.len())?;
        Ok(forward)
    }
}

impl<F: LogLikelihood> CostFunction for NegLogLik<'_, F> {
    type Param = Theta;
    type Output = Cost;

    /// `-s·ℓ(θ)`. A non-finite `ℓ` is an error rather than a silent `NaN`.
    fn cost(&self, theta: &Theta) -> Result<Cost, ArgminFailure> {
        self.scaled_cost(theta).map_err(|err| self.record(err))
    }
}

impl<F: LogLikelihood> Gradient for NegLogLik<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// `-s·∇ℓ(θ)`, or the numeric gradient of the cost when the model
    /// reports `GradientNotImplemented`. Other model errors pass through.
    fn gradient(&self, theta: &Theta) -> Result<Grad, ArgminFailure> {
        let grad = match self.model.grad(theta, self.data) {
            Ok(g) => validate_grad(&g, theta.len()).map(|()| g.mapv(|v| -self.scale * v)),
            Err(OptError::GradientNotImplemented) => self.numeric_gradient(theta),
            Err(err) => Err(err),
        };
        grad.map_err(|err| self.record(err))
    }
}
