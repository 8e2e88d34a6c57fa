// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use ndarray::Array2;
use rand::distributions::{Distribution, Uniform};
use rand::RngCore;

use crate::{ensure_non_empty, FloatX, InitResult, Initializer};

/// Glorot/Xavier style uniform initialisation.
///
/// Samples `U(-a, a)` with `a = sqrt(6 / (rows + cols))`, which gives a
/// standard deviation of `2a / sqrt(12)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NormalizedInitialization;

impl NormalizedInitialization {
    pub fn new() -> Self {
        Self
    }

    /// Half-width of the sampling interval for `shape`.
    pub fn bound(shape: (usize, usize)) -> f64 {
        (6.0 / (shape.0 + shape.1) as f64).sqrt()
    }

    /// Expected element standard deviation for `shape`.
    pub fn expected_std(shape: (usize, usize)) -> f64 {
        2.0 * Self::bound(shape) / 12f64.sqrt()
    }
}

impl Initializer for NormalizedInitialization {
    fn generate(&self, rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>> {
        ensure_non_empty(shape)?;
        let bound = Self::bound(shape) as FloatX;
        let dist = Uniform::new(-bound, bound);
        tracing::debug!(rows = shape.0, cols = shape.1, bound, "normalized initialisation");
        Ok(Array2::from_shape_simple_fn(shape, || dist.sample(&mut *rng)))
    }
}
