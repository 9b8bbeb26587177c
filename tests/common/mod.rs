//! Shared simulation helpers for the integration suite.
#![allow(dead_code)]

use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use separable_cov::{
    optimization::{
        loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
        numerical_stability::SpdFactor,
    },
    separable::{KronData, KronFactors, KronShape},
};

/// AR(1)-style Toeplitz factor `scale · rho^|i−j|`.
pub fn ar1(dim: usize, scale: f64, rho: f64) -> Array2<f64> {
    Array2::from_shape_fn((dim, dim), |(i, j)| scale * rho.powi((i as i32 - j as i32).abs()))
}

/// The factor pair used across recovery tests:
/// `R_ij = 2·0.5^|i−j|`, `C_ij = 1.5·0.3^|i−j|`.
pub fn reference_factors(shape: KronShape) -> KronFactors {
    KronFactors { r: ar1(shape.p, 2.0, 0.5), c: ar1(shape.q, 1.5, 0.3) }
}

/// Purpose
/// -------
/// Draw one row-major vectorized sample `vec(L_R Z L_Cᵗ) + e`.
///
/// With `Z` and `e` standard normal, the row has covariance
/// `I + R⊗C`; `lowers = None` leaves only the unit noise.
fn draw_row(
    rng: &mut StdRng, shape: KronShape, lowers: Option<&(Array2<f64>, Array2<f64>)>,
) -> Array1<f64> {
    let d = shape.dim();
    let noise: Array1<f64> = (0..d).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
    match lowers {
        Some((l_r, l_c)) => {
            let z = Array2::from_shape_fn((shape.p, shape.q), |_| rng.sample::<f64, _>(StandardNormal));
            let x = l_r.dot(&z).dot(&l_c.t());
            let flat: Array1<f64> = x.iter().copied().collect();
            flat + noise
        }
        None => noise,
    }
}

fn lowers(factors: &KronFactors) -> (Array2<f64>, Array2<f64>) {
    let l_r = SpdFactor::new(factors.r.view(), "simulation R").expect("R must be SPD").lower();
    let l_c = SpdFactor::new(factors.c.view(), "simulation C").expect("C must be SPD").lower();
    (l_r, l_c)
}

/// `n` draws from `N(0, I + R⊗C)`, or from `N(0, I)` when `signal` is
/// `None`.
pub fn simulate(shape: KronShape, signal: Option<&KronFactors>, n: usize, seed: u64) -> KronData {
    let mut rng = StdRng::seed_from_u64(seed);
    let l = signal.map(lowers);
    let mut y = Array2::<f64>::zeros((n, shape.dim()));
    for mut row in y.rows_mut() {
        row.assign(&draw_row(&mut rng, shape, l.as_ref()));
    }
    KronData::new(y, shape).expect("simulated data is finite")
}

/// Two-group sample: rows with `labels[i] == true` come from the separable
/// component, the rest from the null.
pub fn simulate_mixture(
    shape: KronShape, signal: &KronFactors, labels: &[bool], seed: u64,
) -> KronData {
    let mut rng = StdRng::seed_from_u64(seed);
    let l = lowers(signal);
    let mut y = Array2::<f64>::zeros((labels.len(), shape.dim()));
    for (mut row, &is_signal) in y.rows_mut().into_iter().zip(labels) {
        let draw = if is_signal { Some(&l) } else { None };
        row.assign(&draw_row(&mut rng, shape, draw));
    }
    KronData::new(y, shape).expect("simulated data is finite")
}

/// `‖A − B‖_F / ‖B‖_F`.
pub fn rel_frobenius(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    let diff = (a - b).mapv(|v| v * v).sum().sqrt();
    diff / b.mapv(|v| v * v).sum().sqrt()
}

/// Standard-normal θ vector of length `len`, scaled by `scale`.
pub fn random_theta(len: usize, scale: f64, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| scale * rng.sample::<f64, _>(StandardNormal)).collect()
}

/// Optimizer settings scaled for likelihoods summed over thousands of rows:
/// `tol_grad = 1e-4`, `tol_cost = 1e-9`, at most 1000 iterations.
pub fn recovery_mle_options() -> MLEOptions {
    let tols = Tolerances::new(Some(1e-4), Some(1e-9), Some(1_000))
        .expect("Tolerances::new should accept positive tolerances");
    MLEOptions::new(tols, LineSearcher::MoreThuente, None)
        .expect("MLEOptions::new should succeed with reasonable tolerances")
}
