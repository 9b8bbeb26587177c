//! Separable MLE: the log-likelihood of `N(0, I + R⊗C)` over log-Cholesky
//! parameters, wired to the optimizer layer.
//!
//! [`SeparableModel`] implements [`LogLikelihood`] with
//! `Data = ScatterStats`, so the same model serves the unweighted fit and the
//! responsibility-weighted exact M-step of the mixture engine. The analytic
//! gradient is used; finite differences are never needed.
//!
//! Key ideas:
//! - θ = `[θ_R, θ_C]`; θ = 0 decodes to `R = I_p`, `C = I_q`.
//! - The optimizer sees `ℓ(θ)/W` with `W = total_weight`, so its gradient
//!   and tolerances do not grow with the sample size. [`MleFit::loglik`] is
//!   the unscaled `ℓ(θ̂)`.
//! - The optimizer is injected through [`Maximizer`]; `MLEOptions` is the
//!   default L-BFGS backend.
//! - Running out of iterations is reported as a
//!   [`FitWarning::OptimizerNonConvergence`] on the result, not an error.
use ndarray::Array1;

use crate::{
    optimization::{
        errors::OptResult,
        loglik_optimizer::{Grad, LogLikelihood, MLEOptions, Maximizer, OptimOutcome, Theta},
    },
    separable::{
        core::{
            data::{KronData, ScatterStats},
            loglik::{loglik, loglik_theta_grad},
            params::KronFactors,
            shape::KronShape,
            validation::{validate_shape, validate_theta},
        },
        errors::{FitWarning, KronResult},
    },
};

/// Separable Gaussian model with fixed shape and optimizer options.
///
/// `options` drive [`SeparableModel::fit`] and
/// [`SeparableModel::fit_stats`]; [`SeparableModel::fit_with`] runs
/// whatever [`Maximizer`] it is handed instead.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparableModel {
    pub shape: KronShape,
    pub options: MLEOptions,
}

/// Result of a separable MLE fit.
#[derive(Debug, Clone, PartialEq)]
pub struct MleFit {
    /// Decoded `(R̂, Ĉ)`.
    pub factors: KronFactors,
    /// `ℓ(θ̂)`.
    pub loglik: f64,
    /// Raw optimizer outcome (θ̂, counters, status). Its `value` is the
    /// per-unit-weight objective `ℓ(θ̂)/W`.
    pub outcome: OptimOutcome,
    pub warnings: Vec<FitWarning>,
}

impl SeparableModel {
    pub fn new(shape: KronShape, options: MLEOptions) -> Self {
        SeparableModel { shape, options }
    }

    /// Fit `(R, C)` by maximum likelihood with the model's own options.
    ///
    /// `theta0` defaults to zeros (identity factors).
    ///
    /// # Errors
    /// - [`KronError::InvalidDimension`] if the data shape differs from the
    ///   model shape.
    /// - Optimizer and numerical failures, see [`SeparableModel::fit_with`].
    pub fn fit(&self, theta0: Option<Theta>, data: &KronData) -> KronResult<MleFit> {
        validate_shape(data.shape, self.shape)?;
        let theta0 = theta0.unwrap_or_else(|| Array1::zeros(self.shape.n_params()));
        self.fit_stats(theta0, &data.scatter())
    }

    /// Fit against precomputed (possibly weighted) statistics with the
    /// model's own options.
    ///
    /// # Errors
    /// See [`SeparableModel::fit_with`].
    pub fn fit_stats(&self, theta0: Theta, stats: &ScatterStats) -> KronResult<MleFit> {
        self.fit_with(&self.options, theta0, stats)
    }

    /// Fit against precomputed (possibly weighted) statistics with any
    /// [`Maximizer`].
    ///
    /// # Errors
    /// - [`KronError::Optimization`] for invalid `theta0`, backend failures,
    ///   or a search that factorization failures stopped on every restart
    ///   (`SearchAborted`).
    /// - [`KronError::NonPositiveDefinite`] if a likelihood evaluation fails
    ///   at an accepted iterate.
    pub fn fit_with<M: Maximizer>(
        &self, maximizer: &M, theta0: Theta, stats: &ScatterStats,
    ) -> KronResult<MleFit> {
        let outcome = maximizer.maximize(self, theta0, stats)?;
        let factors = KronFactors::from_theta(outcome.theta_hat.view(), self.shape)?;
        let mut warnings = Vec::new();
        if !outcome.converged {
            warnings.push(FitWarning::OptimizerNonConvergence {
                component: None,
                iterations: outcome.iterations,
                status: outcome.status.clone(),
            });
        }
        let loglik = outcome.value * stats.total_weight;
        Ok(MleFit { factors, loglik, outcome, warnings })
    }
}

impl LogLikelihood for SeparableModel {
    type Data = ScatterStats;

    /// `ℓ(θ)/W` on the sufficient statistics.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        let factors = KronFactors::from_theta(theta.view(), self.shape)?;
        Ok(loglik(&factors, data)? / data.total_weight)
    }

    /// θ length/finiteness and statistics shape.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        validate_theta(theta.view(), self.shape)?;
        validate_shape(data.shape, self.shape)?;
        Ok(())
    }

    /// Analytic `∇ℓ(θ)/W` through the log-Cholesky chain rule.
    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        let (_, grad) = loglik_theta_grad(theta.view(), data)?;
        Ok(grad / data.total_weight)
    }
}
