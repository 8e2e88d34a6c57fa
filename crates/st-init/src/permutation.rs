// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::{ensure_non_empty, FloatX, InitError, InitResult, Initializer};

/// Square 0/1 matrices with exactly one 1 per row and per column.
///
/// Without an explicit permutation every call draws a fresh one from the
/// RNG. With one, the result is the identity with its columns reordered so
/// that column `j` is the unit vector `e_{perm[j]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermutationMatrix {
    perm: Option<Vec<usize>>,
}

impl PermutationMatrix {
    /// Draws a new permutation on every call to [`Initializer::generate`].
    pub fn new() -> Self {
        Self { perm: None }
    }

    /// Uses a fixed permutation; `perm` must contain each of `0..perm.len()` once.
    pub fn with_permutation(perm: Vec<usize>) -> InitResult<Self> {
        let len = perm.len();
        let mut seen = vec![false; len];
        for &index in &perm {
            if index >= len || std::mem::replace(&mut seen[index], true) {
                return Err(InitError::InvalidPermutation { len });
            }
        }
        Ok(Self { perm: Some(perm) })
    }

    pub fn permutation(&self) -> Option<&[usize]> {
        self.perm.as_deref()
    }
}

impl Initializer for PermutationMatrix {
    fn generate(&self, rng: &mut dyn RngCore, shape: (usize, usize)) -> InitResult<Array2<FloatX>> {
        let (rows, cols) = shape;
        if rows != cols {
            return Err(InitError::NonSquare { rows, cols });
        }
        ensure_non_empty(shape)?;
        let perm = match &self.perm {
            Some(perm) if perm.len() != rows => {
                return Err(InitError::PermutationLength {
                    expected: rows,
                    got: perm.len(),
                });
            }
            Some(perm) => perm.clone(),
            None => {
                let mut perm: Vec<usize> = (0..rows).collect();
                perm.shuffle(rng);
                perm
            }
        };
        Ok(Array2::from_shape_fn(shape, |(r, c)| {
            if perm[c] == r {
                1.0
            } else {
                0.0
            }
        }))
    }
}
