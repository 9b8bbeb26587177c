//! Block views and contractions of `(p·q) × (p·q)` matrices.
//!
//! A matrix `A` in the `R⊗C` layout is a p×p grid of q×q blocks; block
//! `(i, j)` occupies rows `i·q..(i+1)·q` and columns `j·q..(j+1)·q`. The
//! "interleaved" sub-matrix `(a, b)` collects entry `(a, b)` of every block,
//! i.e. rows `a, a+q, a+2q, …` and columns `b, b+q, …`.
//!
//! Everything that collapses one Kronecker factor goes through
//! [`contract`]: the ALS factor updates, the likelihood gradient and the
//! partial traces of the uniform-noise update.
use ndarray::{s, Array2, ArrayView2};

use crate::separable::{
    core::shape::KronShape,
    errors::{KronError, KronResult},
};

/// Which Kronecker factor a contraction or partial trace lands on.
///
/// - `Row`: result is p×p (the `R`/`B` side); the q×q side is summed out.
/// - `Col`: result is q×q (the `C` side); the p×p side is summed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    Row,
    Col,
}

/// Kronecker product `a ⊗ b`.
pub fn kron(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    let mut out = Array2::<f64>::zeros((ar * br, ac * bc));
    for i in 0..ar {
        for j in 0..ac {
            let aij = a[[i, j]];
            if aij == 0.0 {
                continue;
            }
            out.slice_mut(s![i * br..(i + 1) * br, j * bc..(j + 1) * bc])
                .zip_mut_with(&b, |o, &bv| *o = aij * bv);
        }
    }
    out
}

pub(crate) fn check_square(a: ArrayView2<f64>, dim: usize, what: &'static str) -> KronResult<()> {
    if a.nrows() != dim {
        return Err(KronError::InvalidDimension { what, expected: dim, found: a.nrows() });
    }
    if a.ncols() != dim {
        return Err(KronError::InvalidDimension { what, expected: dim, found: a.ncols() });
    }
    Ok(())
}

/// Contract `a` against a held factor, landing on `onto`.
///
/// - `Factor::Row`: `held` is q×q and
///   `out[i,j] = Σ_ab a[i·q+a, j·q+b] · held[a,b]` (Frobenius inner product
///   of block `(i,j)` with `held`).
/// - `Factor::Col`: `held` is p×p and
///   `out[a,b] = Σ_ij a[i·q+a, j·q+b] · held[i,j]` (Frobenius inner product
///   of interleaved sub-matrix `(a,b)` with `held`).
///
/// # Errors
/// [`KronError::InvalidDimension`] if `a` is not `(p·q)²` or `held` has the
/// wrong size for `onto`.
pub fn contract(
    a: ArrayView2<f64>, held: ArrayView2<f64>, shape: KronShape, onto: Factor,
) -> KronResult<Array2<f64>> {
    let KronShape { p, q } = shape;
    check_square(a, shape.dim(), "block matrix")?;
    match onto {
        Factor::Row => {
            check_square(held, q, "column factor")?;
            Ok(Array2::from_shape_fn((p, p), |(i, j)| {
                let blk = a.slice(s![i * q..(i + 1) * q, j * q..(j + 1) * q]);
                (&blk * &held).sum()
            }))
        }
        Factor::Col => {
            check_square(held, p, "row factor")?;
            Ok(Array2::from_shape_fn((q, q), |(ai, bi)| {
                let sub = a.slice(s![ai..;q, bi..;q]);
                (&sub * &held).sum()
            }))
        }
    }
}

/// Partial trace landing on `onto`.
///
/// - `Factor::Row`: p×p matrix of per-block traces (traces out the q-side).
/// - `Factor::Col`: q×q sum of the p diagonal blocks (traces out the p-side).
///
/// # Errors
/// [`KronError::InvalidDimension`] if `a` is not `(p·q)²`.
pub fn partial_trace(a: ArrayView2<f64>, shape: KronShape, onto: Factor) -> KronResult<Array2<f64>> {
    let eye = match onto {
        Factor::Row => Array2::<f64>::eye(shape.q),
        Factor::Col => Array2::<f64>::eye(shape.p),
    };
    contract(a, eye.view(), shape, onto)
}

/// View of q×q block `(i, j)`.
///
/// # Errors
/// [`KronError::InvalidDimension`] if `a` is not `(p·q)²` or the block index
/// is out of range.
pub fn block(a: ArrayView2<'_, f64>, shape: KronShape, i: usize, j: usize) -> KronResult<ArrayView2<'_, f64>> {
    let KronShape { p, q } = shape;
    check_square(a, shape.dim(), "block matrix")?;
    let worst = i.max(j);
    if worst >= p {
        return Err(KronError::InvalidDimension { what: "block index", expected: p, found: worst });
    }
    Ok(a.slice_move(s![i * q..(i + 1) * q, j * q..(j + 1) * q]))
}

/// View of the p×p interleaved sub-matrix `(ai, bi)`.
///
/// # Errors
/// [`KronError::InvalidDimension`] if `a` is not `(p·q)²` or the index is
/// out of range.
pub fn interleaved(
    a: ArrayView2<'_, f64>, shape: KronShape, ai: usize, bi: usize,
) -> KronResult<ArrayView2<'_, f64>> {
    let q = shape.q;
    check_square(a, shape.dim(), "block matrix")?;
    let worst = ai.max(bi);
    if worst >= q {
        return Err(KronError::InvalidDimension {
            what: "interleaved index",
            expected: q,
            found: worst,
        });
    }
    Ok(a.slice_move(s![ai..;q, bi..;q]))
}

/// Re-index a matrix from the `R⊗C` layout to the `C⊗R` layout.
///
/// `swap_layout(kron(R, C)) == kron(C, R)`.
///
/// # Errors
/// [`KronError::InvalidDimension`] if `a` is not `(p·q)²`.
pub fn swap_layout(a: ArrayView2<f64>, shape: KronShape) -> KronResult<Array2<f64>> {
    let KronShape { p, q } = shape;
    check_square(a, shape.dim(), "block matrix")?;
    Ok(Array2::from_shape_fn((p * q, p * q), |(row, col)| {
        let (ai, i) = (row / p, row % p);
        let (bi, j) = (col / p, col % p);
        a[[i * q + ai, j * q + bi]]
    }))
}
