// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use ndarray::Array2;
use rand::seq::index;
use rand::RngCore;

use crate::{ensure_non_empty, FloatX, InitError, InitResult, Initializer};

/// How many entries per row receive a non-sparse value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumInit {
    /// Absolute number of columns.
    Count(usize),
    /// Fraction of the row width, rounded down.
    Fraction(f64),
}

impl NumInit {
    fn resolve(self, cols: usize) -> InitResult<usize> {
        match self {
            NumInit::Count(count) if count <= cols => Ok(count),
            NumInit::Count(_) => Err(InitError::InvalidValue {
                label: "sparse_num_init",
            }),
            NumInit::Fraction(fraction) if (0.0..=1.0).contains(&fraction) => {
                Ok((fraction * cols as f64) as usize)
            }
            NumInit::Fraction(_) => Err(InitError::InvalidValue {
                label: "sparse_num_init_fraction",
            }),
        }
    }
}

/// Sparse rows: `num_init` random columns per row come from `weights_init`,
/// everything else from `sparse_init` (zeros when unset).
pub struct Sparse {
    num_init: NumInit,
    weights_init: Box<dyn Initializer>,
    sparse_init: Option<Box<dyn Initializer>>,
}

impl core::fmt::Debug for Sparse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sparse")
            .field("num_init", &self.num_init)
            .field("has_sparse_init", &self.sparse_init.is_some())
            .finish()
    }
}

impl Sparse {
    pub fn new<I: Initializer + 'static>(num_init: NumInit, weights_init: I) -> Self {
        Self {
            num_init,
            weights_init: Box::new(weights_init),
            sparse_init: None,
        }
    }

    /// Fills the non-selected entries with `sparse_init` instead of zeros.
    pub fn with_sparse_init<I: Initializer + 'static>(mut self, sparse_init: I) -> Self {
        self.sparse_init = Some(Box::new(sparse_init));
        self
    }
}

impl Initializer for Sparse {
    fn generate(&self, rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>> {
        ensure_non_empty(shape)?;
        let (rows, cols) = shape;
        let num_init = self.num_init.resolve(cols)?;
        let mut weights = match &self.sparse_init {
            Some(init) => init.generate(rng, shape)?,
            None => Array2::zeros(shape),
        };
        if num_init == 0 {
            return Ok(weights);
        }
        let values = self.weights_init.generate(rng, (rows, num_init))?;
        for (row, row_values) in values.outer_iter().enumerate() {
            let columns = index::sample(&mut *rng, cols, num_init);
            for (column, &value) in columns.iter().zip(row_values.iter()) {
                weights[[row, column]] = value;
            }
        }
        Ok(weights)
    }
}
