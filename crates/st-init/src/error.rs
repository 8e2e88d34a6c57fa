// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

/// Errors emitted by the initialisation schemes.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InitError {
    /// A permutation matrix was requested for a non-square shape.
    #[error("permutation matrices must be square, got ({rows} x {cols})")]
    NonSquare { rows: usize, cols: usize },
    /// The explicit permutation does not match the requested shape.
    #[error("permutation of length {got} cannot fill a {expected} x {expected} matrix")]
    PermutationLength { expected: usize, got: usize },
    /// The explicit array is not a permutation of `0..len`.
    #[error("array of length {len} is not a permutation of 0..{len}")]
    InvalidPermutation { len: usize },
    /// One of the requested axes is empty.
    #[error("invalid weight dimensions ({rows} x {cols}); both axes must be non-zero")]
    InvalidDimensions { rows: usize, cols: usize },
    /// A scheme hyper-parameter is out of range.
    #[error("invalid initialiser parameter: {label}")]
    InvalidValue { label: &'static str },
    /// The sampling distribution could not be built.
    #[error("failed to build sampling distribution: {message}")]
    Distribution { message: String },
}

impl InitError {
    /// Whether the error rejects the requested shape rather than a parameter.
    pub fn is_invalid_shape(&self) -> bool {
        matches!(
            self,
            InitError::NonSquare { .. }
                | InitError::PermutationLength { .. }
                | InitError::InvalidDimensions { .. }
        )
    }
}
