// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use ndarray::Array2;
use rand::distributions::Uniform as UniformDist;
use rand::RngCore;
use rand_distr::{Distribution, Normal};

use crate::{ensure_non_empty, FloatX, InitError, InitResult, Initializer};

/// Fills every entry with the same value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constant {
    value: FloatX,
}

impl Constant {
    pub fn new(value: FloatX) -> Self {
        Self { value }
    }

    pub fn value(&self) -> FloatX {
        self.value
    }
}

impl Initializer for Constant {
    fn generate(&self, _rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>> {
        ensure_non_empty(shape)?;
        Ok(Array2::from_elem(shape, self.value))
    }
}

/// Independent normal samples with a shared mean and standard deviation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsotropicGaussian {
    mean: FloatX,
    std: FloatX,
}

impl IsotropicGaussian {
    /// Rejects non-positive or non-finite standard deviations.
    pub fn new(mean: FloatX, std: FloatX) -> InitResult<Self> {
        if !(std.is_finite() && std > 0.0) {
            return Err(InitError::InvalidValue {
                label: "isotropic_gaussian_std",
            });
        }
        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> FloatX {
        self.mean
    }

    pub fn std(&self) -> FloatX {
        self.std
    }
}

impl Default for IsotropicGaussian {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std: 1.0,
        }
    }
}

impl Initializer for IsotropicGaussian {
    fn generate(&self, rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>> {
        ensure_non_empty(shape)?;
        let normal = Normal::new(self.mean, self.std).map_err(|err| InitError::Distribution {
            message: err.to_string(),
        })?;
        Ok(Array2::from_shape_simple_fn(shape, || normal.sample(&mut *rng)))
    }
}

/// Uniform samples on `[mean - width / 2, mean + width / 2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uniform {
    mean: FloatX,
    width: FloatX,
}

impl Uniform {
    /// Builds the scheme from the interval width.
    pub fn new(mean: FloatX, width: FloatX) -> InitResult<Self> {
        if !(width.is_finite() && width > 0.0) {
            return Err(InitError::InvalidValue {
                label: "uniform_width",
            });
        }
        let (low, high) = interval(mean, width);
        if !(low.is_finite() && high.is_finite() && (high - low).is_finite() && low < high) {
            return Err(InitError::InvalidValue {
                label: "uniform_interval",
            });
        }
        Ok(Self { mean, width })
    }

    /// Builds the scheme from the target standard deviation (`width = std * sqrt(12)`).
    pub fn with_std(mean: FloatX, std: FloatX) -> InitResult<Self> {
        if !(std.is_finite() && std > 0.0) {
            return Err(InitError::InvalidValue { label: "uniform_std" });
        }
        let twelve: FloatX = 12.0;
        Self::new(mean, std * twelve.sqrt())
    }

    pub fn mean(&self) -> FloatX {
        self.mean
    }

    pub fn width(&self) -> FloatX {
        self.width
    }
}

impl Initializer for Uniform {
    fn generate(&self, rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>> {
        ensure_non_empty(shape)?;
        let (low, high) = interval(self.mean, self.width);
        let dist = UniformDist::new(low, high);
        Ok(Array2::from_shape_simple_fn(shape, || dist.sample(&mut *rng)))
    }
}

fn interval(mean: FloatX, width: FloatX) -> (FloatX, FloatX) {
    let half = width / 2.0;
    (mean - half, mean + half)
}

/// Scaled identity; rectangular shapes get `mult` on the main diagonal only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Identity {
    mult: FloatX,
}

impl Identity {
    pub fn new(mult: FloatX) -> Self {
        Self { mult }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Initializer for Identity {
    fn generate(&self, _rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>> {
        ensure_non_empty(shape)?;
        let mult = self.mult;
        Ok(Array2::from_shape_fn(shape, |(r, c)| if r == c { mult } else { 0.0 }))
    }
}
