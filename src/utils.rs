//! Python-side input conversion helpers (only built with `python-bindings`).
#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use numpy::PyReadonlyArray2;

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
    separable::{
        core::{data::KronData, options::DegeneratePolicy, shape::KronShape},
        errors::KronError,
    },
};

/// Accept a 2-D `numpy.ndarray`, a `pandas.DataFrame` or a nested sequence
/// of floats and copy it into an owned matrix.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix(raw_data: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }

    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence of float64",
        )
    })?;
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyValueError::new_err("all rows must have the same length"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PyValueError::new_err(format!("could not build matrix: {e}")))
}

/// Observations plus validated `(p, q)`.
#[cfg(feature = "python-bindings")]
pub fn extract_kron_data(raw_data: &Bound<'_, PyAny>, p: usize, q: usize) -> PyResult<KronData> {
    let shape = KronShape::new(p, q)?;
    let y = extract_f64_matrix(raw_data)?;
    Ok(KronData::new(y, shape)?)
}

/// Optimizer options from keyword arguments; `None` keeps the default.
#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<MLEOptions> {
    use std::str::FromStr;

    let defaults = MLEOptions::default();
    let tols = Tolerances::new(
        tol_grad.or(defaults.tols.tol_grad),
        tol_cost.or(defaults.tols.tol_cost),
        max_iter.or(defaults.tols.max_iter),
    )
    .map_err(KronError::from)?;

    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(KronError::from)?,
        None => LineSearcher::MoreThuente,
    };

    Ok(MLEOptions::new(tols, ls, lbfgs_mem).map_err(KronError::from)?)
}

#[cfg(feature = "python-bindings")]
pub fn extract_degenerate_policy(policy: Option<&str>) -> PyResult<DegeneratePolicy> {
    let name = policy.unwrap_or("freeze").to_lowercase();
    match name.as_str() {
        "freeze" => Ok(DegeneratePolicy::Freeze),
        "reinitialize" | "reinit" => Ok(DegeneratePolicy::Reinitialize),
        "drop" => Ok(DegeneratePolicy::Drop),
        "abort" => Ok(DegeneratePolicy::Abort),
        other => Err(PyValueError::new_err(format!(
            "invalid degenerate policy {:?} (expected 'freeze', 'reinitialize', 'drop', or 'abort')",
            other
        ))),
    }
}
