//! loglik_optimizer::types — numeric aliases and L-BFGS wiring.
//!
//! Purpose
//! -------
//! Keep the `ndarray` and Argmin generics that the optimizer is built on in
//! one place. Everything else in the optimizer (and the separable models
//! that plug into it) refers to these aliases.
//!
//! Conventions
//! -----------
//! - `Theta` is the flat log-Cholesky parameter vector of a Kronecker pair,
//!   laid out as `[vech-lower(R), log-diag(R), vech-lower(C), log-diag(C)]`.
//! - `Cost` is the minimized quantity `c(θ) = -ℓ(θ)`; the user-facing
//!   outcome always reports `ℓ`.
use argmin::solver::linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch};
use ndarray::Array1;
use std::collections::HashMap;

/// Unconstrained parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective handed to Argmin.
pub type Cost = f64;

/// Argmin function-evaluation counters (`"cost_count"`, `"gradient_count"`, ...).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Iteration cap for a stand-alone maximum-likelihood fit.
pub const DEFAULT_MAX_ITER: usize = 10_000;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;
