//! Input and output checks for the L-BFGS wrapper.
//!
//! Each check reports the first offending entry through its own
//! [`OptError`] variant, so a configuration mistake never reads like a
//! numerical breakdown inside the separable likelihood.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta},
};

fn positive_finite(tol: Option<f64>) -> Result<(), (f64, &'static str)> {
    match tol {
        Some(t) if !t.is_finite() => Err((t, "must be finite")),
        Some(t) if t <= 0.0 => Err((t, "must be positive")),
        _ => Ok(()),
    }
}

/// # Errors
/// [`OptError::InvalidTolGrad`] for a non-finite or non-positive value.
pub fn check_tol_grad(tol: Option<f64>) -> OptResult<()> {
    positive_finite(tol).map_err(|(tol, reason)| OptError::InvalidTolGrad { tol, reason })
}

/// # Errors
/// [`OptError::InvalidTolCost`] for a non-finite or non-positive value.
pub fn check_tol_cost(tol: Option<f64>) -> OptResult<()> {
    positive_finite(tol).map_err(|(tol, reason)| OptError::InvalidTolCost { tol, reason })
}

/// Length `dim` and every entry finite.
///
/// # Errors
/// [`OptError::GradientDimMismatch`] or [`OptError::InvalidGradient`].
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().position(|g| !g.is_finite()) {
        Some(index) => Err(OptError::InvalidGradient {
            index,
            value: grad[index],
            reason: "gradient entries must be finite",
        }),
        None => Ok(()),
    }
}

/// Unwrap the solver's best point, refusing non-finite entries.
///
/// # Errors
/// [`OptError::MissingThetaHat`] or [`OptError::InvalidThetaHat`].
pub fn finite_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some(index) = theta.iter().position(|t| !t.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value: theta[index],
            reason: "estimates must be finite",
        });
    }
    Ok(theta)
}

/// # Errors
/// [`OptError::NonFiniteCost`] for `NaN` or `±∞`.
pub fn finite_value(value: f64) -> OptResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OptError::NonFiniteCost { value })
    }
}
