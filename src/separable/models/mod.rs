//! models — separable covariance estimators.
//!
//! - [`mle`]: log-Cholesky maximum likelihood for `N(0, I + R⊗C)`.
//! - [`als`]: Frobenius nearest-Kronecker-product by alternating least squares.
//! - [`ted`]: truncated eigenvalue decomposition baseline.
//! - [`uniform`]: partial-trace EM for the uniform-noise random-effects model.
//! - [`mixture`]: mixture of separable components plus a null component.

pub mod als;
pub mod mixture;
pub mod mle;
pub mod ted;
pub mod uniform;
