// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Weight initialisation schemes.
//!
//! Every scheme implements [`Initializer`], which produces a dense
//! `Array2<FloatX>` for a requested `(rows, cols)` shape from any
//! [`RngCore`]. Schemes are object safe so they can be nested (see
//! [`Sparse`]) or stored behind `Box<dyn Initializer>`.

pub mod base;
pub mod error;
pub mod normalized;
pub mod permutation;
pub mod sparse;

use ndarray::Array2;
use rand::RngCore;

pub use base::{Constant, Identity, IsotropicGaussian, Uniform};
pub use error::{InitError, InitResult};
pub use normalized::NormalizedInitialization;
pub use permutation::PermutationMatrix;
pub use sparse::{NumInit, Sparse};

/// Element type of generated weights.
#[cfg(not(feature = "double"))]
pub type FloatX = f32;

/// Element type of generated weights.
#[cfg(feature = "double")]
pub type FloatX = f64;

/// Floating-point precision selected at build time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatPrecision {
    Single,
    Double,
}

/// Returns the precision [`FloatX`] resolves to.
pub const fn float_precision() -> FloatPrecision {
    if cfg!(feature = "double") {
        FloatPrecision::Double
    } else {
        FloatPrecision::Single
    }
}

/// A scheme that fills weight matrices.
pub trait Initializer {
    /// Produces a fresh matrix of the requested shape.
    fn generate(&self, rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>>;

    /// Regenerates `param` in place, keeping its shape.
    fn initialize(&self, param: &mut Array2<FloatX>, rng: &mut dyn RngCore) -> InitResult<()> {
        let values = self.generate(rng, param.dim())?;
        param.assign(&values);
        Ok(())
    }
}

impl<I: Initializer + ?Sized> Initializer for Box<I> {
    fn generate(&self, rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>> {
        (**self).generate(rng, shape)
    }
}

pub(crate) fn ensure_non_empty(shape: (usize, usize)) -> InitResult<()> {
    let (rows, cols) = shape;
    if rows == 0 || cols == 0 {
        return Err(InitError::InvalidDimensions { rows, cols });
    }
    Ok(())
}
