//! Estimator options — configuration for ALS, TED, uniform EM and mixture EM.
//!
//! Purpose
//! -------
//! Collect the tuning knobs of every estimator in plain, validated structs,
//! so call sites pass explicit configuration instead of positional scalars.
//!
//! Key behaviors
//! -------------
//! - Each struct has a validating `new(...)` and a `Default` carrying the
//!   documented defaults:
//!   - [`AlsOptions`]: `max_iter = 100`, `tol = 1e-12`.
//!   - [`TedOptions`]: `floor = 0`, `rank = None` (full rank).
//!   - [`UniformOptions`]: `n_iter = 50`, `sub_iters = 5`.
//!   - [`EmOptions`]: two components, `n_iter = 50`, approximate M-step,
//!     inner optimizer budget of 5 iterations, no early stopping,
//!     `min_component_weight = 1e-8`, [`DegeneratePolicy::Freeze`].
//! - [`MStep`] parses case-insensitively from `"approximate"` / `"exact"`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Options never depend on the data; checks that need the dimension
//!   (e.g. TED rank ≤ p·q) happen in the estimator.
//!
//! Testing notes
//! -------------
//! - Unit tests cover defaults, validation failures and `MStep` parsing.
use std::str::FromStr;

use crate::{
    optimization::loglik_optimizer::{MLEOptions, Tolerances},
    separable::{
        core::validation::{validate_max_iter, validate_tol},
        errors::{KronError, KronResult},
    },
};

/// Default ALS iteration cap.
pub const DEFAULT_ALS_MAX_ITER: usize = 100;
/// Default ALS relative-improvement tolerance.
pub const DEFAULT_ALS_TOL: f64 = 1e-12;
/// Default outer iteration count for the EM drivers.
pub const DEFAULT_EM_ITER: usize = 50;
/// Default partial-trace sub-iterations per uniform M-step.
pub const DEFAULT_SUB_ITERS: usize = 5;
/// Default quasi-Newton budget per exact M-step.
pub const DEFAULT_INNER_MAX_ITER: usize = 5;
/// Default degenerate-component threshold on the mixture weight.
pub const DEFAULT_MIN_COMPONENT_WEIGHT: f64 = 1e-8;

/// Frobenius ALS stopping rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlsOptions {
    pub max_iter: usize,
    pub tol: f64,
}

impl AlsOptions {
    /// # Errors
    /// [`KronError::InvalidMaxIter`] / [`KronError::InvalidTolerance`].
    pub fn new(max_iter: usize, tol: f64) -> KronResult<Self> {
        validate_max_iter(max_iter)?;
        validate_tol(tol)?;
        Ok(AlsOptions { max_iter, tol })
    }
}

impl Default for AlsOptions {
    fn default() -> Self {
        AlsOptions { max_iter: DEFAULT_ALS_MAX_ITER, tol: DEFAULT_ALS_TOL }
    }
}

/// TED eigenvalue floor and target rank.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TedOptions {
    pub floor: f64,
    pub rank: Option<usize>,
}

impl TedOptions {
    /// # Errors
    /// - [`KronError::InvalidFloor`] if `floor` is negative or not finite.
    /// - [`KronError::InvalidRank`] if `rank == Some(0)`.
    pub fn new(floor: f64, rank: Option<usize>) -> KronResult<Self> {
        if !floor.is_finite() || floor < 0.0 {
            return Err(KronError::InvalidFloor { floor });
        }
        if rank == Some(0) {
            return Err(KronError::InvalidRank { rank: 0, dim: 0 });
        }
        Ok(TedOptions { floor, rank })
    }
}

/// Uniform-noise EM configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformOptions {
    pub n_iter: usize,
    pub sub_iters: usize,
}

impl UniformOptions {
    /// # Errors
    /// [`KronError::InvalidMaxIter`] / [`KronError::InvalidSubIterations`].
    pub fn new(n_iter: usize, sub_iters: usize) -> KronResult<Self> {
        validate_max_iter(n_iter)?;
        if sub_iters == 0 {
            return Err(KronError::InvalidSubIterations { sub_iters });
        }
        Ok(UniformOptions { n_iter, sub_iters })
    }
}

impl Default for UniformOptions {
    fn default() -> Self {
        UniformOptions { n_iter: DEFAULT_EM_ITER, sub_iters: DEFAULT_SUB_ITERS }
    }
}

/// Component update used in the mixture M-step.
///
/// - `Approximate`: weighted covariance → TED → Frobenius ALS.
/// - `Exact`: weighted log-likelihood maximized over the log-Cholesky
///   parameters with a small inner iteration budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MStep {
    #[default]
    Approximate,
    Exact,
}

impl FromStr for MStep {
    type Err = KronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approximate" => Ok(MStep::Approximate),
            "exact" => Ok(MStep::Exact),
            _ => Err(KronError::InvalidMStep { name: s.to_string() }),
        }
    }
}

/// What the mixture engine does with a component whose weight falls below
/// `min_component_weight`.
///
/// - `Freeze`: keep its factors, skip its update, keep computing its weight.
/// - `Reinitialize`: reset its factors to the identity pair.
/// - `Drop`: remove it; its weight is redistributed by the next E-step.
/// - `Abort`: stop with [`KronError::EmFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    #[default]
    Freeze,
    Reinitialize,
    Drop,
    Abort,
}

/// Mixture EM configuration.
///
/// `n_components` counts every component, the null one included, so the
/// engine fits `n_components − 1` separable components.
#[derive(Debug, Clone, PartialEq)]
pub struct EmOptions {
    pub n_components: usize,
    pub n_iter: usize,
    pub m_step: MStep,
    pub inner: MLEOptions,
    pub als: AlsOptions,
    pub tol: Option<f64>,
    pub min_component_weight: f64,
    pub degenerate_policy: DegeneratePolicy,
}

impl EmOptions {
    /// Options with the given component count, iteration count and M-step;
    /// everything else at its default.
    ///
    /// # Errors
    /// - [`KronError::InvalidComponentCount`] if `n_components < 2`.
    /// - [`KronError::InvalidMaxIter`] if `n_iter == 0`.
    pub fn new(n_components: usize, n_iter: usize, m_step: MStep) -> KronResult<Self> {
        if n_components < 2 {
            return Err(KronError::InvalidComponentCount { n_components });
        }
        validate_max_iter(n_iter)?;
        Ok(EmOptions { n_components, n_iter, m_step, ..EmOptions::default() })
    }

    /// Stop early once the relative log-likelihood change drops below `tol`.
    ///
    /// # Errors
    /// [`KronError::InvalidTolerance`].
    pub fn with_tol(mut self, tol: f64) -> KronResult<Self> {
        validate_tol(tol)?;
        self.tol = Some(tol);
        Ok(self)
    }

    /// Quasi-Newton iterations per exact M-step.
    ///
    /// # Errors
    /// [`KronError::Optimization`] if `max_iter == 0`.
    pub fn with_inner_max_iter(mut self, max_iter: usize) -> KronResult<Self> {
        self.inner = self.inner.with_max_iter(max_iter)?;
        Ok(self)
    }

    pub fn with_als(mut self, als: AlsOptions) -> Self {
        self.als = als;
        self
    }

    /// # Errors
    /// [`KronError::InvalidMinWeight`] unless `0 ≤ weight < 1`.
    pub fn with_min_component_weight(mut self, weight: f64) -> KronResult<Self> {
        if !weight.is_finite() || !(0.0..1.0).contains(&weight) {
            return Err(KronError::InvalidMinWeight { value: weight });
        }
        self.min_component_weight = weight;
        Ok(self)
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }
}

impl Default for EmOptions {
    fn default() -> Self {
        let defaults = MLEOptions::default();
        let inner = MLEOptions {
            tols: Tolerances {
                tol_grad: defaults.tols.tol_grad,
                tol_cost: defaults.tols.tol_cost,
                max_iter: Some(DEFAULT_INNER_MAX_ITER),
            },
            ..defaults
        };
        EmOptions {
            n_components: 2,
            n_iter: DEFAULT_EM_ITER,
            m_step: MStep::Approximate,
            inner,
            als: AlsOptions::default(),
            tol: None,
            min_component_weight: DEFAULT_MIN_COMPONENT_WEIGHT,
            degenerate_policy: DegeneratePolicy::Freeze,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Defaults carry the documented values.
    //
    // Given
    // -----
    // - `Default` for every option struct.
    //
    // Expect
    // ------
    // - ALS (100, 1e-12); TED (0, None); uniform (50, 5); EM inner cap 5,
    //   no tolerance, Freeze policy.
    fn defaults_are_documented_values() {
        assert_eq!(AlsOptions::default(), AlsOptions { max_iter: 100, tol: 1e-12 });
        assert_eq!(TedOptions::default(), TedOptions { floor: 0.0, rank: None });
        assert_eq!(UniformOptions::default(), UniformOptions { n_iter: 50, sub_iters: 5 });
        let em = EmOptions::default();
        assert_eq!(em.inner.tols.max_iter, Some(5));
        assert_eq!(em.tol, None);
        assert_eq!(em.degenerate_policy, DegeneratePolicy::Freeze);
        assert_eq!(em.min_component_weight, 1e-8);
    }

    #[test]
    // Purpose
    // -------
    // Invalid configurations are rejected at construction.
    //
    // Given
    // -----
    // - Zero caps, a negative tolerance and floor, rank 0, one component,
    //   and a weight threshold of 1.
    //
    // Expect
    // ------
    // - The matching `KronError` variant for each.
    fn constructors_validate() {
        assert!(matches!(AlsOptions::new(0, 1e-6), Err(KronError::InvalidMaxIter { .. })));
        assert!(matches!(AlsOptions::new(10, -1.0), Err(KronError::InvalidTolerance { .. })));
        assert_eq!(TedOptions::new(-0.5, None), Err(KronError::InvalidFloor { floor: -0.5 }));
        assert!(matches!(TedOptions::new(0.0, Some(0)), Err(KronError::InvalidRank { .. })));
        assert_eq!(UniformOptions::new(5, 0), Err(KronError::InvalidSubIterations { sub_iters: 0 }));
        assert_eq!(
            EmOptions::new(1, 10, MStep::Exact),
            Err(KronError::InvalidComponentCount { n_components: 1 })
        );
        assert!(EmOptions::default().with_min_component_weight(1.0).is_err());
        assert!(EmOptions::default().with_inner_max_iter(0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // M-step names parse case-insensitively.
    //
    // Given
    // -----
    // - "Approximate", "EXACT" and "newton".
    //
    // Expect
    // ------
    // - The two strategies, then `InvalidMStep`.
    fn m_step_from_str() {
        assert_eq!("Approximate".parse::<MStep>(), Ok(MStep::Approximate));
        assert_eq!("EXACT".parse::<MStep>(), Ok(MStep::Exact));
        assert_eq!(
            "newton".parse::<MStep>(),
            Err(KronError::InvalidMStep { name: "newton".to_string() })
        );
    }
}
