//! Kronecker factor pair `(R, C)` and its log-Cholesky encoding.
//!
//! Only the product `R⊗C` is identified: `(αR, C/α)` describes the same
//! covariance for every `α > 0`. [`KronFactors::rescaled`] picks the
//! representative with `‖R‖_F = ‖C‖_F` for reporting; estimators never rely
//! on the individual scales.
use ndarray::{concatenate, s, Array1, Array2, ArrayView1, Axis};

use crate::{
    kronecker::blocks::{check_square, kron},
    optimization::numerical_stability::{log_cholesky_decode, log_cholesky_encode},
    separable::{
        core::shape::KronShape,
        errors::{KronError, KronResult},
    },
};

/// Row factor `r` (p×p) and column factor `c` (q×q).
#[derive(Debug, Clone, PartialEq)]
pub struct KronFactors {
    pub r: Array2<f64>,
    pub c: Array2<f64>,
}

impl KronFactors {
    /// Wrap a factor pair.
    ///
    /// # Errors
    /// - [`KronError::InvalidDimension`] if either factor is not square or is
    ///   empty.
    /// - [`KronError::NonFiniteData`] for a non-finite entry.
    pub fn new(r: Array2<f64>, c: Array2<f64>) -> KronResult<Self> {
        let shape = KronShape::new(r.nrows(), c.nrows())?;
        check_square(r.view(), shape.p, "row factor")?;
        check_square(c.view(), shape.q, "column factor")?;
        for m in [&r, &c] {
            if let Some(((row, col), &value)) = m.indexed_iter().find(|(_, v)| !v.is_finite()) {
                return Err(KronError::NonFiniteData { row, col, value });
            }
        }
        Ok(KronFactors { r, c })
    }

    /// `R = I_p`, `C = I_q`.
    pub fn identity(shape: KronShape) -> Self {
        KronFactors { r: Array2::eye(shape.p), c: Array2::eye(shape.q) }
    }

    pub fn shape(&self) -> KronShape {
        KronShape { p: self.r.nrows(), q: self.c.nrows() }
    }

    /// Signal covariance `R⊗C`.
    pub fn kron(&self) -> Array2<f64> {
        kron(self.r.view(), self.c.view())
    }

    /// Model covariance `I + R⊗C`.
    pub fn model_covariance(&self) -> Array2<f64> {
        let mut m = self.kron();
        m.diag_mut().mapv_inplace(|v| v + 1.0);
        m
    }

    /// Balanced representative with `‖R‖_F = ‖C‖_F`; `R⊗C` is unchanged.
    ///
    /// A pair with a zero factor is returned as is.
    pub fn rescaled(&self) -> Self {
        let r_norm = frobenius_norm(&self.r);
        let c_norm = frobenius_norm(&self.c);
        if r_norm == 0.0 || c_norm == 0.0 {
            return self.clone();
        }
        let alpha = (c_norm / r_norm).sqrt();
        KronFactors { r: &self.r * alpha, c: &self.c / alpha }
    }

    /// Decode `θ = [θ_R, θ_C]`.
    ///
    /// # Errors
    /// [`KronError::InvalidDimension`] if `θ.len() != shape.n_params()`.
    pub fn from_theta(theta: ArrayView1<f64>, shape: KronShape) -> KronResult<Self> {
        if theta.len() != shape.n_params() {
            return Err(KronError::InvalidDimension {
                what: "log-Cholesky parameter vector",
                expected: shape.n_params(),
                found: theta.len(),
            });
        }
        let split = shape.r_params();
        let r = log_cholesky_decode(theta.slice(s![..split]), shape.p)?;
        let c = log_cholesky_decode(theta.slice(s![split..]), shape.q)?;
        Ok(KronFactors { r, c })
    }

    /// Encode as `θ = [θ_R, θ_C]`.
    ///
    /// # Errors
    /// [`KronError::NonPositiveDefinite`] if a factor is not PSD.
    pub fn to_theta(&self) -> KronResult<Array1<f64>> {
        let theta_r = log_cholesky_encode(self.r.view())?;
        let theta_c = log_cholesky_encode(self.c.view())?;
        concatenate(Axis(0), &[theta_r.view(), theta_c.view()]).map_err(|_| {
            KronError::InvalidDimension {
                what: "log-Cholesky parameter vector",
                expected: self.shape().n_params(),
                found: theta_r.len() + theta_c.len(),
            }
        })
    }
}

/// `‖A‖_F`.
pub fn frobenius_norm(a: &Array2<f64>) -> f64 {
    a.iter().map(|v| v * v).sum::<f64>().sqrt()
}
