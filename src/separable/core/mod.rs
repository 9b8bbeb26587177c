//! core — building blocks shared by every separable estimator.
//!
//! - [`shape`]: validated `(p, q)` and derived sizes.
//! - [`data`]: observation matrix and scatter statistics.
//! - [`params`]: factor pair `(R, C)` and its log-Cholesky vector.
//! - [`loglik`]: aggregate / per-row / null log-likelihoods and gradients.
//! - [`options`]: estimator configuration.
//! - [`progress`]: per-iteration progress sink.
//! - [`validation`]: shared argument checks.

pub mod data;
pub mod loglik;
pub mod options;
pub mod params;
pub mod progress;
pub mod shape;
pub mod validation;
