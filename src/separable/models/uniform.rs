//! Uniform-noise EM: partial-trace updates for the random-effects model.
//!
//! Purpose
//! -------
//! Fit `yᵢ = xᵢ + eᵢ` with `xᵢ ~ N(0, R⊗C)` and `eᵢ ~ N(0, I)` by EM, where
//! the unit noise is shared ("uniform") across observations.
//!
//! Key behaviors
//! -------------
//! - E-step: with `Σ = R⊗C` and `M = I + Σ`, the posterior moments give
//!   `K = Σ M⁻¹`, `V = Σ − K Σ` and the combined second moment
//!   `M_comb = n V + K S Kᵗ`.
//! - M-step ([`opt_rc_uniform`]): a fixed number of flip-flop sweeps
//!   `R = tr₂((I_p ⊗ C⁻¹) M_comb) / (n q)`,
//!   `C = tr₁((R⁻¹ ⊗ I_q) M_comb) / (n p)`, each computed as a single
//!   contraction without forming the Kronecker products.
//! - The marginal log-likelihood is recorded before the first iteration and
//!   after each one; under exact arithmetic it is non-decreasing.
//!
//! Invariants & assumptions
//! ------------------------
//! - `R` and `C` must stay invertible; a failed inversion aborts with
//!   `SingularMatrix` naming the factor.
use ndarray::{Array2, ArrayView2};

use crate::{
    kronecker::blocks::{check_square, contract, Factor},
    optimization::numerical_stability::{factor_inverse, symmetrize, SpdFactor},
    separable::{
        core::{
            data::KronData,
            loglik::loglik,
            options::UniformOptions,
            params::KronFactors,
            progress::ProgressSink,
            shape::KronShape,
            validation::validate_factors,
        },
        errors::{KronError, KronResult},
    },
};

/// Closed-form `(R, C)` updates from a combined second moment.
///
/// Runs `sub_iters` alternating sweeps starting from `init`.
///
/// # Errors
/// - [`KronError::InvalidDimension`] if `m_combined` or `init` do not match
///   `shape`.
/// - [`KronError::EmptyData`] if `n == 0`.
/// - [`KronError::InvalidSubIterations`] if `sub_iters == 0`.
/// - [`KronError::SingularMatrix`] if `C` or `R` cannot be inverted.
pub fn opt_rc_uniform(
    m_combined: ArrayView2<f64>, init: &KronFactors, n: usize, shape: KronShape, sub_iters: usize,
) -> KronResult<KronFactors> {
    check_square(m_combined, shape.dim(), "combined second moment")?;
    validate_factors(init, shape)?;
    if n == 0 {
        return Err(KronError::EmptyData);
    }
    if sub_iters == 0 {
        return Err(KronError::InvalidSubIterations { sub_iters });
    }
    let (p, q) = (shape.p as f64, shape.q as f64);
    let n = n as f64;
    let mut r = init.r.clone();
    let mut c = init.c.clone();
    for _ in 0..sub_iters {
        let c_inv = factor_inverse(c.view(), "C")?;
        r = contract(m_combined, c_inv.view(), shape, Factor::Row)? / (n * q);
        symmetrize(&mut r);
        let r_inv = factor_inverse(r.view(), "R")?;
        c = contract(m_combined, r_inv.view(), shape, Factor::Col)? / (n * p);
        symmetrize(&mut c);
    }
    Ok(KronFactors { r, c })
}

/// Result of [`fit_uniform_em`].
#[derive(Debug, Clone, PartialEq)]
pub struct UniformFit {
    pub factors: KronFactors,
    /// Final marginal log-likelihood.
    pub loglik: f64,
    /// Initial value, then one entry per iteration.
    pub trajectory: Vec<f64>,
    pub iterations: usize,
}

/// E-step posterior moment `n V + K S Kᵗ`.
fn combined_moment(factors: &KronFactors, scatter: &Array2<f64>, n: f64) -> KronResult<Array2<f64>> {
    let sigma = factors.kron();
    let m = factors.model_covariance();
    let m_inv = SpdFactor::new(m.view(), "model covariance I + R⊗C")?.inverse();
    let k = sigma.dot(&m_inv);
    let v = &sigma - &k.dot(&sigma);
    let mut out = v * n + k.dot(scatter).dot(&k.t());
    symmetrize(&mut out);
    Ok(out)
}

/// EM for the uniform-noise separable model.
///
/// `init` defaults to the identity pair.
///
/// # Errors
/// - [`KronError::InvalidDimension`] if `init` does not match the data.
/// - [`KronError::NonPositiveDefinite`] / [`KronError::SingularMatrix`] on
///   numerical breakdown.
pub fn fit_uniform_em(
    data: &KronData, init: Option<&KronFactors>, opts: &UniformOptions,
    progress: &mut dyn ProgressSink,
) -> KronResult<UniformFit> {
    let shape = data.shape;
    let mut factors = match init {
        Some(f) => {
            validate_factors(f, shape)?;
            f.clone()
        }
        None => KronFactors::identity(shape),
    };
    let stats = data.scatter();
    let n = data.n_obs();
    let mut current = loglik(&factors, &stats)?;
    let mut trajectory = vec![current];
    for iteration in 1..=opts.n_iter {
        let m_comb = combined_moment(&factors, &stats.scatter, n as f64)?;
        factors = opt_rc_uniform(m_comb.view(), &factors, n, shape, opts.sub_iters)?;
        current = loglik(&factors, &stats)?;
        trajectory.push(current);
        progress.on_iteration(iteration, current);
    }
    Ok(UniformFit { factors, loglik: current, trajectory, iterations: opts.n_iter })
}
