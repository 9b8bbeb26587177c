//! kronecker — block-structured operations on `(p·q) × (p·q)` matrices.
//!
//! Purpose
//! -------
//! Treat a square matrix of size `p·q` as a p×p grid of q×q blocks and
//! provide the handful of operations the separable estimators are built
//! from: the Kronecker product, block and interleaved extraction, a single
//! factor contraction and the two partial traces.
//!
//! Key behaviors
//! -------------
//! - [`contract`] is the one routine shared by Frobenius ALS, the separable
//!   likelihood gradient and the uniform-noise partial-trace update; the
//!   [`Factor`] argument says which side is held fixed.
//! - [`partial_trace`] is a contraction against the identity.
//! - [`swap_layout`] converts between the `R⊗C` and `C⊗R` orderings.
//!
//! Invariants & assumptions
//! ------------------------
//! - Shapes come from a validated [`KronShape`](crate::separable::core::shape::KronShape);
//!   mismatched matrices are reported as `InvalidDimension`.
//!
//! Testing notes
//! -------------
//! - Unit tests check every operation on exact Kronecker products, where
//!   the results have closed forms.

pub mod blocks;

pub use self::blocks::{block, contract, interleaved, kron, partial_trace, swap_layout, Factor};
