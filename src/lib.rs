//! separable_cov — separable (Kronecker) covariance estimation with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the separable covariance estimators to Python via the `_separable_cov`
//! extension module. When the `python-bindings` feature is enabled, this
//! module defines the Python-facing result classes and functions used by the
//! `separable_cov` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`kronecker`, `optimization` and
//!   `separable`) as the public crate surface.
//! - Define `#[pyclass]` result wrappers, `#[pyfunction]` entry points and the
//!   `#[pymodule]` initializer for the `_separable_cov` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input conversion, and error mapping.
//! - Observations cross the boundary as `n × (p·q)` float64 matrices whose
//!   rows are row-major vectorizations of p×q samples.
//!
//! Conventions
//! -----------
//! - Python-exposed items live under `_separable_cov.separable` and are
//!   wrapped by thin pure-Python facades in the top-level package.
//! - Errors from core Rust code are propagated as [`separable::KronError`] internally
//!   and converted to `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on [`separable`] and can ignore
//!   the PyO3 items guarded by the `python-bindings` feature.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules and
//!   by the integration tests in `tests/`.

pub mod kronecker;
pub mod optimization;
pub mod separable;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    separable::{
        core::{
            options::{AlsOptions, EmOptions, MStep, TedOptions, UniformOptions},
            params::KronFactors,
            progress::NoProgress,
        },
        models::{
            als::AlsFit, mixture::{EmPhase, MixtureFit}, mle::{MleFit, SeparableModel},
            uniform::UniformFit,
        },
    },
    utils::{extract_degenerate_policy, extract_f64_matrix, extract_kron_data, extract_mle_opts},
};

/// SeparableFit — Python-facing result of a separable estimator.
///
/// Purpose
/// -------
/// Present the fitted factors `(R̂, Ĉ)` and the scalar diagnostics of an MLE,
/// ALS or uniform-EM fit in one read-only wrapper.
///
/// Fields
/// ------
/// - `factors`: [`KronFactors`]
///   Fitted row and column factors.
/// - `objective`: `f64`
///   Log-likelihood for MLE / uniform EM, Frobenius residual for ALS.
/// - `trajectory`: `Vec<f64>`
///   Objective history (empty for MLE).
/// - `iterations`, `converged`, `status`, `warnings`
///   Optimizer or loop diagnostics.
///
/// Notes
/// -----
/// - Rust callers should use [`MleFit`], [`AlsFit`] or [`UniformFit`]
///   directly; this type exists solely for the PyO3 binding.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "separable_cov.separable")]
pub struct SeparableFit {
    factors: KronFactors,
    objective: f64,
    trajectory: Vec<f64>,
    iterations: usize,
    converged: bool,
    status: String,
    warnings: Vec<String>,
}

#[cfg(feature = "python-bindings")]
impl From<MleFit> for SeparableFit {
    fn from(fit: MleFit) -> Self {
        SeparableFit {
            objective: fit.loglik,
            trajectory: Vec::new(),
            iterations: fit.outcome.iterations,
            converged: fit.outcome.converged,
            status: fit.outcome.status.clone(),
            warnings: fit.warnings.iter().map(ToString::to_string).collect(),
            factors: fit.factors,
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<AlsFit> for SeparableFit {
    fn from(fit: AlsFit) -> Self {
        SeparableFit {
            objective: fit.objective,
            iterations: fit.iterations,
            converged: true,
            status: format!("{:?}", fit.termination),
            warnings: Vec::new(),
            trajectory: fit.trajectory,
            factors: fit.factors,
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<UniformFit> for SeparableFit {
    fn from(fit: UniformFit) -> Self {
        SeparableFit {
            objective: fit.loglik,
            iterations: fit.iterations,
            converged: false,
            status: "IterationCapReached".to_string(),
            warnings: Vec::new(),
            trajectory: fit.trajectory,
            factors: fit.factors,
        }
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SeparableFit {
    #[getter]
    pub fn r<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.factors.r.clone().into_pyarray(py)
    }

    #[getter]
    pub fn c<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.factors.c.clone().into_pyarray(py)
    }

    /// The Kronecker product `R̂⊗Ĉ`.
    #[getter]
    pub fn kron<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.factors.kron().into_pyarray(py)
    }

    #[getter]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    #[getter]
    pub fn trajectory(&self) -> Vec<f64> {
        self.trajectory.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.converged
    }

    #[getter]
    pub fn status(&self) -> String {
        self.status.clone()
    }

    #[getter]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.clone()
    }
}

/// MixtureResult — Python-facing result of the separable mixture EM.
///
/// Purpose
/// -------
/// Expose mixture weights, responsibilities, per-component factors and the
/// log-likelihood trajectory of a [`MixtureFit`].
///
/// Invariants
/// ----------
/// - Component order matches the Rust side: separable components first,
///   the null component last.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "separable_cov.separable")]
pub struct MixtureResult {
    inner: MixtureFit,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl MixtureResult {
    #[getter]
    pub fn weights<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.weights().into_pyarray(py)
    }

    #[getter]
    pub fn null_weight(&self) -> f64 {
        self.inner.null_weight()
    }

    #[getter]
    pub fn responsibilities<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.inner.responsibilities().into_pyarray(py)
    }

    /// `[(R₀, C₀), (R₁, C₁), ...]` for the separable components.
    #[getter]
    pub fn factors<'py>(
        &self, py: Python<'py>,
    ) -> Vec<(Bound<'py, PyArray2<f64>>, Bound<'py, PyArray2<f64>>)> {
        self.inner
            .separable_factors()
            .into_iter()
            .map(|f| (f.r.clone().into_pyarray(py), f.c.clone().into_pyarray(py)))
            .collect()
    }

    #[getter]
    pub fn trajectory(&self) -> Vec<f64> {
        self.inner.trajectory.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.phase == EmPhase::Converged
    }

    #[getter]
    pub fn warnings(&self) -> Vec<String> {
        self.inner.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Separable MLE of `(R, C)` under `y ~ N(0, I + R⊗C)`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (y, p, q, theta0 = None, tol_grad = None, tol_cost = None, max_iter = None,
                 line_searcher = None, lbfgs_mem = None, verbose = false),
    text_signature = "(y, p, q, /, theta0=None, tol_grad=None, tol_cost=None, max_iter=None, \
                      line_searcher=None, lbfgs_mem=None, verbose=False)"
)]
#[allow(clippy::too_many_arguments)]
pub fn fit_mle(
    y: &Bound<'_, PyAny>, p: usize, q: usize, theta0: Option<Vec<f64>>, tol_grad: Option<f64>,
    tol_cost: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
    lbfgs_mem: Option<usize>, verbose: bool,
) -> PyResult<SeparableFit> {
    let data = extract_kron_data(y, p, q)?;
    let opts =
        extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?.with_verbose(verbose);
    let model = SeparableModel::new(data.shape, opts);
    let fit = model.fit(theta0.map(ndarray::Array1::from), &data)?;
    Ok(fit.into())
}

/// Nearest Kronecker product of a `(p·q) × (p·q)` matrix.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (a, p, q, max_iter = 100, tol = 1e-12),
    text_signature = "(a, p, q, /, max_iter=100, tol=1e-12)"
)]
pub fn frobenius_als(
    a: &Bound<'_, PyAny>, p: usize, q: usize, max_iter: usize, tol: f64,
) -> PyResult<SeparableFit> {
    let shape = separable::core::shape::KronShape::new(p, q)?;
    let a = extract_f64_matrix(a)?;
    let opts = AlsOptions::new(max_iter, tol)?;
    let fit = separable::models::als::frobenius_als(a.view(), shape, None, &opts, &mut NoProgress)?;
    Ok(fit.into())
}

/// TED estimate of the signal covariance from an empirical covariance.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (s, floor = 0.0, rank = None), text_signature = "(s, /, floor=0.0, rank=None)")]
pub fn ted<'py>(
    py: Python<'py>, s: &Bound<'py, PyAny>, floor: f64, rank: Option<usize>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let s = extract_f64_matrix(s)?;
    let opts = TedOptions::new(floor, rank)?;
    Ok(separable::models::ted::ted(s.view(), &opts)?.into_pyarray(py))
}

/// Uniform-noise EM with partial-trace M-steps.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (y, p, q, n_iter = 50, sub_iters = 5),
    text_signature = "(y, p, q, /, n_iter=50, sub_iters=5)"
)]
pub fn fit_uniform_em(
    y: &Bound<'_, PyAny>, p: usize, q: usize, n_iter: usize, sub_iters: usize,
) -> PyResult<SeparableFit> {
    let data = extract_kron_data(y, p, q)?;
    let opts = UniformOptions::new(n_iter, sub_iters)?;
    let fit = separable::models::uniform::fit_uniform_em(&data, None, &opts, &mut NoProgress)?;
    Ok(fit.into())
}

/// Mixture of separable components plus a null component.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (y, p, q, n_components = 2, n_iter = 50, m_step = "approximate", tol = None,
                 inner_max_iter = 5, min_component_weight = 1e-8, degenerate_policy = None),
    text_signature = "(y, p, q, /, n_components=2, n_iter=50, m_step='approximate', tol=None, \
                      inner_max_iter=5, min_component_weight=1e-8, degenerate_policy=None)"
)]
#[allow(clippy::too_many_arguments)]
pub fn fit_mixture(
    y: &Bound<'_, PyAny>, p: usize, q: usize, n_components: usize, n_iter: usize, m_step: &str,
    tol: Option<f64>, inner_max_iter: usize, min_component_weight: f64,
    degenerate_policy: Option<&str>,
) -> PyResult<MixtureResult> {
    let data = extract_kron_data(y, p, q)?;
    let m_step: MStep = m_step.parse()?;
    let mut opts = EmOptions::new(n_components, n_iter, m_step)?
        .with_inner_max_iter(inner_max_iter)?
        .with_min_component_weight(min_component_weight)?
        .with_degenerate_policy(extract_degenerate_policy(degenerate_policy)?);
    if let Some(tol) = tol {
        opts = opts.with_tol(tol)?;
    }
    let fit = separable::models::mixture::fit_mixture(&data, None, &opts, &mut NoProgress)?;
    Ok(MixtureResult { inner: fit })
}

/// _separable_cov — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_separable_cov` Python module and register its `separable`
/// submodule so it is importable via a dotted path.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating the submodule or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _separable_cov<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let separable_mod = PyModule::new(py, "separable")?;
    separable_mod.add_class::<SeparableFit>()?;
    separable_mod.add_class::<MixtureResult>()?;
    separable_mod.add_function(wrap_pyfunction!(fit_mle, &separable_mod)?)?;
    separable_mod.add_function(wrap_pyfunction!(frobenius_als, &separable_mod)?)?;
    separable_mod.add_function(wrap_pyfunction!(ted, &separable_mod)?)?;
    separable_mod.add_function(wrap_pyfunction!(fit_uniform_em, &separable_mod)?)?;
    separable_mod.add_function(wrap_pyfunction!(fit_mixture, &separable_mod)?)?;
    m.add_submodule(&separable_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    py.import("sys")?.getattr("modules")?.set_item("separable_cov.separable", separable_mod)?;
    Ok(())
}
