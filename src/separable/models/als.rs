//! Frobenius alternating least squares for the nearest Kronecker product.
//!
//! Purpose
//! -------
//! Fit `B` (p×p) and `C` (q×q) minimizing `‖A − B⊗C‖_F` for a target `A`
//! of size `(p·q) × (p·q)`, typically an empirical covariance with the unit
//! noise already removed.
//!
//! Key behaviors
//! -------------
//! - Each iteration solves both blocks in closed form:
//!   `B = contract(A, C, Row) / ‖C‖²_F`, then
//!   `C = contract(A, B, Col) / ‖B‖²_F`.
//! - The objective `‖A − B⊗C‖_F` is recorded before the first update and
//!   after every accepted iteration, and reported to the progress sink.
//! - Stopping: relative improvement `(old − obj) / old < tol`, an exact fit
//!   (`obj == 0`), the iteration cap, an iteration that would increase the
//!   objective (the previous iterate is kept), or a factor whose squared norm
//!   vanishes (the zero product is returned).
//!
//! Invariants & assumptions
//! ------------------------
//! - Only `B⊗C` is meaningful; individual scales depend on the start.
//! - The recorded trajectory is non-increasing by construction.
//! - The block updates are the unconstrained least-squares solutions, so a
//!   non-symmetric `A` yields non-symmetric factors. When `A` is exactly
//!   symmetric the factors are symmetrized to drop rounding asymmetry.
//! - For symmetric PSD `A` and PSD starting factors, every iterate is PSD.
use ndarray::{Array2, ArrayView2};

use crate::{
    kronecker::blocks::{check_square, contract, kron, Factor},
    optimization::numerical_stability::symmetrize,
    separable::{
        core::{
            options::AlsOptions,
            params::{frobenius_norm, KronFactors},
            progress::ProgressSink,
            shape::KronShape,
            validation::validate_factors,
        },
        errors::{KronError, KronResult},
    },
};

/// Why the ALS loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlsTermination {
    /// Relative improvement fell below the tolerance.
    Converged,
    /// The objective reached exactly zero.
    ExactFit,
    /// `max_iter` iterations were run.
    MaxIterReached,
    /// The next iterate would have increased the objective; it was rejected.
    ObjectiveIncreased,
    /// A factor's squared Frobenius norm was zero; the product is zero.
    FactorVanished,
}

/// Result of [`frobenius_als`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlsFit {
    pub factors: KronFactors,
    /// Final `‖A − B⊗C‖_F`.
    pub objective: f64,
    /// Objective before the first update, then one entry per accepted iteration.
    pub trajectory: Vec<f64>,
    pub iterations: usize,
    pub termination: AlsTermination,
}

fn residual(a: ArrayView2<f64>, b: &Array2<f64>, c: &Array2<f64>) -> f64 {
    frobenius_norm(&(&a - &kron(b.view(), c.view())))
}

/// Nearest Kronecker product by alternating least squares.
///
/// `init` defaults to the identity pair.
///
/// # Errors
/// - [`KronError::InvalidDimension`] if `a` or `init` do not match `shape`.
/// - [`KronError::NonFiniteData`] for a non-finite entry of `a`.
pub fn frobenius_als(
    a: ArrayView2<f64>, shape: KronShape, init: Option<&KronFactors>, opts: &AlsOptions,
    progress: &mut dyn ProgressSink,
) -> KronResult<AlsFit> {
    check_square(a, shape.dim(), "ALS target")?;
    if let Some(((row, col), &value)) = a.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(KronError::NonFiniteData { row, col, value });
    }
    let start = match init {
        Some(f) => {
            validate_factors(f, shape)?;
            f.clone()
        }
        None => KronFactors::identity(shape),
    };
    let (mut b, mut c) = (start.r, start.c);
    let symmetric = a == a.t();

    let mut old = residual(a, &b, &c);
    let mut trajectory = vec![old];
    let mut iterations = 0;
    let mut termination = AlsTermination::MaxIterReached;
    if old == 0.0 {
        termination = AlsTermination::ExactFit;
    }

    while termination == AlsTermination::MaxIterReached && iterations < opts.max_iter {
        let c_norm2 = c.iter().map(|v| v * v).sum::<f64>();
        if c_norm2 == 0.0 {
            b = Array2::zeros((shape.p, shape.p));
            termination = AlsTermination::FactorVanished;
            break;
        }
        let mut next_b = contract(a, c.view(), shape, Factor::Row)? / c_norm2;
        if symmetric {
            symmetrize(&mut next_b);
        }
        let b_norm2 = next_b.iter().map(|v| v * v).sum::<f64>();
        if b_norm2 == 0.0 {
            b = next_b;
            termination = AlsTermination::FactorVanished;
            break;
        }
        let mut next_c = contract(a, next_b.view(), shape, Factor::Col)? / b_norm2;
        if symmetric {
            symmetrize(&mut next_c);
        }

        let obj = residual(a, &next_b, &next_c);
        if obj > old {
            termination = AlsTermination::ObjectiveIncreased;
            break;
        }
        iterations += 1;
        b = next_b;
        c = next_c;
        trajectory.push(obj);
        progress.on_iteration(iterations, obj);

        if obj == 0.0 {
            termination = AlsTermination::ExactFit;
        } else if (old - obj) / old < opts.tol {
            termination = AlsTermination::Converged;
        }
        old = obj;
    }

    let objective = if termination == AlsTermination::FactorVanished {
        residual(a, &b, &c)
    } else {
        old
    };
    Ok(AlsFit { factors: KronFactors { r: b, c }, objective, trajectory, iterations, termination })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::separable::core::progress::NoProgress;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Recovery of an exact Kronecker product up to scale.
    // - Non-increasing trajectory and progress events on a noisy target.
    // - Zero target (factor vanishes) and a target that is already fit.
    // - Closed-form updates on a non-symmetric target.
    // -------------------------------------------------------------------------

    fn shape23() -> KronShape {
        KronShape::new(2, 3).expect("valid")
    }

    fn b_true() -> Array2<f64> {
        array![[2.0, 0.4], [0.4, 1.0]]
    }

    fn c_true() -> Array2<f64> {
        array![[1.0, 0.3, 0.1], [0.3, 2.0, -0.2], [0.1, -0.2, 0.5]]
    }

    #[test]
    // Purpose
    // -------
    // On A = B⊗C the Kronecker product is recovered, not the individual
    // factors.
    //
    // Given
    // -----
    // - A = kron(B, C), identity start.
    //
    // Expect
    // ------
    // - kron(B̂, Ĉ) = A to 1e-9; objective ≈ 0.
    fn recovers_exact_kronecker_product() {
        // Arrange
        let a = kron(b_true().view(), c_true().view());

        // Act
        let fit = frobenius_als(a.view(), shape23(), None, &AlsOptions::default(), &mut NoProgress)
            .expect("valid input");

        // Assert
        let rebuilt = fit.factors.kron();
        for ((i, j), v) in a.indexed_iter() {
            assert_relative_eq!(rebuilt[[i, j]], *v, epsilon = 1e-9);
        }
        assert!(fit.objective < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // The objective trajectory never increases and each accepted iteration
    // is reported once.
    //
    // Given
    // -----
    // - A = B⊗C plus a small symmetric perturbation.
    //
    // Expect
    // ------
    // - trajectory[k+1] ≤ trajectory[k]; progress saw `iterations` events.
    fn trajectory_is_non_increasing_with_progress() {
        // Arrange
        let mut a = kron(b_true().view(), c_true().view());
        for i in 0..6 {
            for j in 0..6 {
                a[[i, j]] += 0.01 * ((i * 7 + j * 7) % 5) as f64;
            }
        }
        let mut seen = Vec::new();
        let mut sink = |k: usize, v: f64| seen.push((k, v));

        // Act
        let fit = frobenius_als(a.view(), shape23(), None, &AlsOptions::default(), &mut sink)
            .expect("valid input");

        // Assert
        for w in fit.trajectory.windows(2) {
            assert!(w[1] <= w[0]);
        }
        assert_eq!(seen.len(), fit.iterations);
        assert_eq!(fit.trajectory.len(), fit.iterations + 1);
        assert!(fit.objective > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // A zero target ends with a vanished factor instead of dividing by zero.
    //
    // Given
    // -----
    // - A = 0.
    //
    // Expect
    // ------
    // - `FactorVanished`, zero product, objective 0, finite entries.
    fn zero_target_vanishes_cleanly() {
        let a = Array2::<f64>::zeros((6, 6));
        let fit = frobenius_als(a.view(), shape23(), None, &AlsOptions::default(), &mut NoProgress)
            .expect("valid input");
        assert_eq!(fit.termination, AlsTermination::FactorVanished);
        assert!(fit.factors.kron().iter().all(|v| *v == 0.0));
        assert_eq!(fit.objective, 0.0);
    }

    #[test]
    // Purpose
    // -------
    // A start that already fits exactly stops immediately.
    //
    // Given
    // -----
    // - A = I⊗I and the identity start.
    //
    // Expect
    // ------
    // - `ExactFit` with zero iterations; mis-sized init is rejected.
    fn exact_start_and_bad_init() {
        let a = Array2::<f64>::eye(6);
        let fit = frobenius_als(a.view(), shape23(), None, &AlsOptions::default(), &mut NoProgress)
            .expect("valid input");
        assert_eq!(fit.termination, AlsTermination::ExactFit);
        assert_eq!(fit.iterations, 0);

        let wrong = KronFactors::identity(KronShape::new(3, 2).expect("valid"));
        assert!(matches!(
            frobenius_als(a.view(), shape23(), Some(&wrong), &AlsOptions::default(), &mut NoProgress),
            Err(KronError::InvalidDimension { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The block update is the plain least-squares solution, so a
    // non-symmetric target keeps its asymmetry.
    //
    // Given
    // -----
    // - A = B₀⊗I₂ with B₀ = [[1, 0.7], [0.15, 1.5]]; identity start, one
    //   iteration.
    //
    // Expect
    // ------
    // - B̂ = B₀ and Ĉ = I₂ to rounding; objective ≈ 0 after one iteration.
    fn non_symmetric_target_is_fit_in_one_step() {
        // Arrange
        let b0 = array![[1.0, 0.7], [0.15, 1.5]];
        let shape = KronShape::new(2, 2).expect("valid");
        let a = kron(b0.view(), Array2::<f64>::eye(2).view());
        let opts = AlsOptions::new(1, 1e-12).expect("valid");

        // Act
        let fit = frobenius_als(a.view(), shape, None, &opts, &mut NoProgress).expect("valid input");

        // Assert
        for ((i, j), v) in b0.indexed_iter() {
            assert_relative_eq!(fit.factors.r[[i, j]], *v, epsilon = 1e-12);
        }
        for ((i, j), v) in Array2::<f64>::eye(2).indexed_iter() {
            assert_relative_eq!(fit.factors.c[[i, j]], *v, epsilon = 1e-12);
        }
        assert!(fit.objective < 1e-12);
        assert_eq!(fit.iterations, 1);
    }
}
