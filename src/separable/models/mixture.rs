//! Mixture EM: separable components plus a fixed `N(0, I)` null component.
//!
//! Purpose
//! -------
//! Cluster observations into `K − 1` separable components
//! `N(0, I + R_k⊗C_k)` and one null component `N(0, I)` whose density has no
//! free parameters. Only the null weight is estimated for it.
//!
//! Key behaviors
//! -------------
//! - E-step: per-row log-densities plus log-weights, normalized with a
//!   log-sum-exp; the row normalizers sum to the mixture log-likelihood.
//! - M-step: weights are mean responsibilities; each separable component is
//!   then refit against its responsibility-weighted statistics, either
//!   - [`MStep::Approximate`]: weighted covariance → TED (floor 0, full
//!     rank) → Frobenius ALS warm-started from the current factors, or
//!   - [`MStep::Exact`]: a short quasi-Newton maximization of the weighted
//!     log-likelihood warm-started from the current factors' log-Cholesky
//!     parameters.
//! - The trajectory holds the log-likelihood at the starting parameters and
//!   after each full M/E cycle. With `tol` set, the loop stops once the
//!   relative change falls below it.
//! - Components whose weight drops below `min_component_weight` are handled
//!   per [`DegeneratePolicy`] and reported once per episode as a
//!   [`FitWarning::DegenerateComponent`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Component order is fixed: separable components first, null last.
//!   `Drop` removes separable components but never the null one.
//! - Weights always sum to one.
//! - Exact M-steps never decrease the trajectory (generalized EM); the
//!   approximate route carries no such guarantee.
//! - A failure inside the loop is returned as [`KronError::EmFailed`] with
//!   the state reached so far.
//!
//! Conventions
//! -----------
//! - A failed inner optimization keeps the component's previous factors and
//!   records [`FitWarning::OptimizerNonConvergence`]. An inner run the
//!   solver gave up on keeps its best point and is reported the same way;
//!   hitting the inner iteration budget is expected and not reported.
use ndarray::{Array1, Array2, Axis};

use crate::{
    optimization::{loglik_optimizer::Maximizer, numerical_stability::log_sum_exp},
    separable::{
        core::{
            data::KronData,
            loglik::{loglik_rows, null_loglik_rows},
            options::{DegeneratePolicy, EmOptions, MStep, TedOptions},
            params::KronFactors,
            progress::{NoProgress, ProgressSink},
            validation::validate_factors,
        },
        errors::{FitWarning, KronError, KronResult},
        models::{als::frobenius_als, mle::SeparableModel, ted::ted},
    },
};

/// Density family of a mixture component.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    /// `N(0, I + R⊗C)`.
    Separable(KronFactors),
    /// `N(0, I)`.
    Null,
}

/// One mixture component: density, weight and per-row responsibilities.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureComponent {
    pub kind: ComponentKind,
    pub weight: f64,
    pub responsibility: Array1<f64>,
    /// Weight is currently below the degenerate threshold.
    pub degenerate: bool,
}

impl MixtureComponent {
    fn new(kind: ComponentKind, weight: f64, n: usize) -> Self {
        MixtureComponent { kind, weight, responsibility: Array1::zeros(n), degenerate: false }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ComponentKind::Null)
    }

    pub fn factors(&self) -> Option<&KronFactors> {
        match &self.kind {
            ComponentKind::Separable(f) => Some(f),
            ComponentKind::Null => None,
        }
    }
}

/// Where the engine is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmPhase {
    /// Evaluating the starting parameters.
    Initializing,
    EStep,
    MStep,
    /// Relative log-likelihood change fell below `tol`.
    Converged,
    /// `n_iter` iterations were run.
    IterationCapReached,
}

/// Mixture EM state and result.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureFit {
    /// Separable components first, null last.
    pub components: Vec<MixtureComponent>,
    /// Initial log-likelihood, then one entry per iteration.
    pub trajectory: Vec<f64>,
    pub iterations: usize,
    /// Terminal phase on success; the failing phase inside `EmFailed`.
    pub phase: EmPhase,
    pub warnings: Vec<FitWarning>,
}

impl MixtureFit {
    /// Mixture weights in component order.
    pub fn weights(&self) -> Array1<f64> {
        self.components.iter().map(|c| c.weight).collect()
    }

    /// Weight of the null component (0 if it is absent).
    pub fn null_weight(&self) -> f64 {
        self.components.iter().filter(|c| c.is_null()).map(|c| c.weight).sum()
    }

    /// `n × K` responsibility matrix in component order.
    pub fn responsibilities(&self) -> Array2<f64> {
        let n = self.components.first().map_or(0, |c| c.responsibility.len());
        let mut out = Array2::zeros((n, self.components.len()));
        for (k, comp) in self.components.iter().enumerate() {
            out.column_mut(k).assign(&comp.responsibility);
        }
        out
    }

    /// Factors of the separable components, in order.
    pub fn separable_factors(&self) -> Vec<&KronFactors> {
        self.components.iter().filter_map(MixtureComponent::factors).collect()
    }

    /// Last recorded log-likelihood.
    pub fn loglik(&self) -> Option<f64> {
        self.trajectory.last().copied()
    }
}

/// Failure location inside the loop.
struct StepError {
    component: Option<usize>,
    source: KronError,
}

fn at(component: usize) -> impl FnOnce(KronError) -> StepError {
    move |source| StepError { component: Some(component), source }
}

/// Borrowed inputs shared by every step.
struct EmEngine<'a, M: Maximizer> {
    data: &'a KronData,
    opts: &'a EmOptions,
    maximizer: &'a M,
    null_rows: Array1<f64>,
}

impl<M: Maximizer> EmEngine<'_, M> {
    /// Responsibilities for the current parameters; returns the
    /// log-likelihood.
    fn e_step(&self, components: &mut [MixtureComponent]) -> Result<f64, StepError> {
        let n = self.data.n_obs();
        let mut log_w = Array2::<f64>::zeros((n, components.len()));
        for (k, comp) in components.iter().enumerate() {
            let rows = match &comp.kind {
                ComponentKind::Separable(f) => loglik_rows(f, self.data).map_err(at(k))?,
                ComponentKind::Null => self.null_rows.clone(),
            };
            let ln_pi = comp.weight.ln();
            log_w.column_mut(k).assign(&rows.mapv(|v| v + ln_pi));
        }
        let mut total = 0.0;
        for (i, mut row) in log_w.axis_iter_mut(Axis(0)).enumerate() {
            let norm = log_sum_exp(row.view());
            if !norm.is_finite() {
                return Err(StepError {
                    component: None,
                    source: KronError::NonFiniteData { row: i, col: 0, value: norm },
                });
            }
            row.mapv_inplace(|v| (v - norm).exp());
            total += norm;
        }
        for (k, comp) in components.iter_mut().enumerate() {
            comp.responsibility.assign(&log_w.column(k));
        }
        Ok(total)
    }

    /// Weights, degenerate handling and factor updates.
    fn m_step(
        &self, iteration: usize, components: &mut Vec<MixtureComponent>,
        warnings: &mut Vec<FitWarning>,
    ) -> Result<(), StepError> {
        for comp in components.iter_mut() {
            comp.weight = comp.responsibility.mean().unwrap_or(0.0);
        }

        let mut dropped = vec![false; components.len()];
        for (k, comp) in components.iter_mut().enumerate() {
            let current = match &comp.kind {
                ComponentKind::Separable(f) => f.clone(),
                ComponentKind::Null => continue,
            };
            if comp.weight < self.opts.min_component_weight || comp.weight == 0.0 {
                if !comp.degenerate {
                    warnings.push(FitWarning::DegenerateComponent {
                        iteration,
                        component: k,
                        weight: comp.weight,
                    });
                    comp.degenerate = true;
                }
                match self.opts.degenerate_policy {
                    DegeneratePolicy::Freeze => {}
                    DegeneratePolicy::Reinitialize => {
                        comp.kind = ComponentKind::Separable(KronFactors::identity(self.data.shape));
                    }
                    DegeneratePolicy::Drop => dropped[k] = true,
                    DegeneratePolicy::Abort => {
                        return Err(StepError {
                            component: Some(k),
                            source: KronError::DegenerateComponent { component: k, weight: comp.weight },
                        });
                    }
                }
                continue;
            }
            comp.degenerate = false;
            let updated = self.update_factors(k, &current, &comp.responsibility, warnings)?;
            comp.kind = ComponentKind::Separable(updated);
        }

        if dropped.iter().any(|&d| d) {
            let mut keep = dropped.iter().map(|&d| !d);
            components.retain(|_| keep.next().unwrap_or(true));
            let total: f64 = components.iter().map(|c| c.weight).sum();
            if total > 0.0 {
                for comp in components.iter_mut() {
                    comp.weight /= total;
                }
            }
        }
        Ok(())
    }

    fn update_factors(
        &self, k: usize, current: &KronFactors, responsibility: &Array1<f64>,
        warnings: &mut Vec<FitWarning>,
    ) -> Result<KronFactors, StepError> {
        let shape = self.data.shape;
        let stats = self.data.weighted_scatter(responsibility.view()).map_err(at(k))?;
        match self.opts.m_step {
            MStep::Approximate => {
                let signal = ted(stats.covariance().view(), &TedOptions::default()).map_err(at(k))?;
                let fit = frobenius_als(signal.view(), shape, Some(current), &self.opts.als, &mut NoProgress)
                    .map_err(at(k))?;
                Ok(fit.factors)
            }
            MStep::Exact => {
                let theta0 = current.to_theta().map_err(at(k))?;
                let model = SeparableModel::new(shape, self.opts.inner.clone());
                match model.fit_with(self.maximizer, theta0, &stats) {
                    Ok(fit) => {
                        if !fit.outcome.converged && !fit.outcome.capped {
                            warnings.push(FitWarning::OptimizerNonConvergence {
                                component: Some(k),
                                iterations: fit.outcome.iterations,
                                status: fit.outcome.status.clone(),
                            });
                        }
                        Ok(fit.factors)
                    }
                    Err(KronError::Optimization(err)) => {
                        warnings.push(FitWarning::OptimizerNonConvergence {
                            component: Some(k),
                            iterations: 0,
                            status: err.to_string(),
                        });
                        Ok(current.clone())
                    }
                    Err(other) => Err(at(k)(other)),
                }
            }
        }
    }
}

/// Fit the mixture with the default L-BFGS backend for exact M-steps.
///
/// `init` optionally supplies starting factors for the `n_components − 1`
/// separable components; the default is the identity pair for each. Starting
/// weights are uniform.
///
/// # Errors
/// - [`KronError::InvalidDimension`] if `init` has the wrong length or a
///   factor pair does not match the data.
/// - [`KronError::EmFailed`] for any failure inside the loop.
pub fn fit_mixture(
    data: &KronData, init: Option<&[KronFactors]>, opts: &EmOptions,
    progress: &mut dyn ProgressSink,
) -> KronResult<MixtureFit> {
    fit_mixture_with(&opts.inner, data, init, opts, progress)
}

/// [`fit_mixture`] with an injected [`Maximizer`] for exact M-steps.
///
/// # Errors
/// As [`fit_mixture`].
pub fn fit_mixture_with<M: Maximizer>(
    maximizer: &M, data: &KronData, init: Option<&[KronFactors]>, opts: &EmOptions,
    progress: &mut dyn ProgressSink,
) -> KronResult<MixtureFit> {
    let n_separable = opts.n_components.saturating_sub(1);
    if n_separable == 0 {
        return Err(KronError::InvalidComponentCount { n_components: opts.n_components });
    }
    let starts: Vec<KronFactors> = match init {
        Some(list) => {
            if list.len() != n_separable {
                return Err(KronError::InvalidDimension {
                    what: "initial separable components",
                    expected: n_separable,
                    found: list.len(),
                });
            }
            for f in list {
                validate_factors(f, data.shape)?;
            }
            list.to_vec()
        }
        None => vec![KronFactors::identity(data.shape); n_separable],
    };

    let n = data.n_obs();
    let weight = 1.0 / opts.n_components as f64;
    let mut components: Vec<MixtureComponent> = starts
        .into_iter()
        .map(|f| MixtureComponent::new(ComponentKind::Separable(f), weight, n))
        .collect();
    components.push(MixtureComponent::new(ComponentKind::Null, weight, n));

    let engine = EmEngine { data, opts, maximizer, null_rows: null_loglik_rows(data) };
    let mut fit = MixtureFit {
        components,
        trajectory: Vec::with_capacity(opts.n_iter + 1),
        iterations: 0,
        phase: EmPhase::Initializing,
        warnings: Vec::new(),
    };

    let initial = match engine.e_step(&mut fit.components) {
        Ok(v) => v,
        Err(err) => return Err(failed(fit, 0, err)),
    };
    fit.trajectory.push(initial);

    let mut previous = initial;
    for iteration in 1..=opts.n_iter {
        fit.phase = EmPhase::MStep;
        let mut components = fit.components.clone();
        if let Err(err) = engine.m_step(iteration, &mut components, &mut fit.warnings) {
            return Err(failed(fit, iteration, err));
        }
        fit.phase = EmPhase::EStep;
        let current = match engine.e_step(&mut components) {
            Ok(v) => v,
            Err(err) => return Err(failed(fit, iteration, err)),
        };
        fit.components = components;
        fit.trajectory.push(current);
        fit.iterations = iteration;
        progress.on_iteration(iteration, current);

        if let Some(tol) = opts.tol {
            if (current - previous).abs() <= tol * previous.abs().max(f64::MIN_POSITIVE) {
                fit.phase = EmPhase::Converged;
                return Ok(fit);
            }
        }
        previous = current;
    }
    fit.phase = EmPhase::IterationCapReached;
    Ok(fit)
}

fn failed(partial: MixtureFit, iteration: usize, err: StepError) -> KronError {
    KronError::EmFailed {
        iteration,
        component: err.component,
        source: Box::new(err.source),
        partial: Box::new(partial),
    }
}
