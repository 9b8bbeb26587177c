//! loglik_optimizer::options — solver configuration.
//!
//! [`MLEOptions`] bundles stopping rules ([`Tolerances`]), the L-BFGS line
//! search ([`LineSearcher`]), the history size and the observer switch.
//! Constructors validate eagerly so a bad tolerance never reaches Argmin.
use std::str::FromStr;

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        types::DEFAULT_MAX_ITER,
        validation::{check_tol_cost, check_tol_grad},
    },
};

/// Line search used inside L-BFGS.
///
/// Parses from `"MoreThuente"` / `"HagerZhang"`, ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("morethuente") {
            Ok(LineSearcher::MoreThuente)
        } else if s.eq_ignore_ascii_case("hagerzhang") {
            Ok(LineSearcher::HagerZhang)
        } else {
            Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "expected 'MoreThuente' or 'HagerZhang'",
            })
        }
    }
}

/// Stopping rules for one L-BFGS run. At least one must be set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Gradient-norm threshold.
    pub tol_grad: Option<f64>,
    /// Threshold on the change of `-ℓ` between iterations.
    pub tol_cost: Option<f64>,
    /// Iteration cap.
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] when every rule is `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for a
    ///   tolerance that is not finite and positive.
    /// - [`OptError::InvalidMaxIter`] for a zero cap.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if (tol_grad, tol_cost, max_iter) == (None, None, None) {
            return Err(OptError::NoTolerancesProvided);
        }
        check_tol_grad(tol_grad)?;
        check_tol_cost(tol_cost)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter { max_iter: 0, reason: "must be at least 1" });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Configuration of the Argmin-backed maximizer.
///
/// The default is `tol_grad = 1e-6`, no cost tolerance, at most
/// `DEFAULT_MAX_ITER` iterations, More–Thuente, seven stored pairs and no
/// observer.
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    /// Print the start value and attach the slog observer (`obs_slog` only).
    pub verbose: bool,
    /// L-BFGS history size; `None` uses `DEFAULT_LBFGS_MEM`.
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// # Errors
    /// [`OptError::InvalidLBFGSMem`] when `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(OptError::InvalidLBFGSMem { mem: 0, reason: "must be at least 1" });
        }
        Ok(Self { tols, line_searcher, verbose: false, lbfgs_mem })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Copy with a different iteration cap and the same tolerances.
    ///
    /// The exact mixture EM uses this for its short per-component M-step.
    ///
    /// # Errors
    /// [`OptError::InvalidMaxIter`] when `max_iter == 0`.
    pub fn with_max_iter(&self, max_iter: usize) -> OptResult<Self> {
        let tols = Tolerances::new(self.tols.tol_grad, self.tols.tol_cost, Some(max_iter))?;
        Ok(Self { tols, ..self.clone() })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(DEFAULT_MAX_ITER) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}
