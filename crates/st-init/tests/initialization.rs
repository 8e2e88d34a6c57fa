// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use approx::assert_abs_diff_eq;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::RngCore;
use spiral_config::rng_from_optional;
use st_init::{
    float_precision, FloatPrecision, FloatX, InitError, Initializer, NormalizedInitialization,
    PermutationMatrix,
};

fn random_permutation(rng: &mut StdRng, n: usize) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(rng);
    perm
}

fn assert_unit_sums(weights: &Array2<FloatX>) {
    let n = weights.nrows();
    for sum in weights.sum_axis(Axis(0)).iter() {
        assert_abs_diff_eq!(*sum, 1.0, epsilon = 1e-6);
    }
    for sum in weights.sum_axis(Axis(1)).iter() {
        assert_abs_diff_eq!(*sum, 1.0, epsilon = 1e-6);
    }
    assert_eq!(weights.iter().filter(|&&v| v != 0.0).count(), n);
}

fn check_permutation(rng: &mut StdRng, shape: (usize, usize)) {
    let (rows, cols) = shape;
    if rows != cols {
        let err = PermutationMatrix::new().generate(rng, shape).unwrap_err();
        assert!(err.is_invalid_shape(), "unexpected error {err:?}");

        let perm = random_permutation(rng, rows);
        let err = PermutationMatrix::with_permutation(perm)
            .unwrap()
            .generate(rng, shape)
            .unwrap_err();
        assert!(err.is_invalid_shape(), "unexpected error {err:?}");
        return;
    }

    let first = PermutationMatrix::new().generate(rng, shape).unwrap();
    assert_eq!(first.dim(), shape);
    assert_unit_sums(&first);

    let second = PermutationMatrix::new().generate(rng, shape).unwrap();
    assert_unit_sums(&second);
    assert_ne!(first, second, "two draws produced the same permutation");

    let perm = random_permutation(rng, rows);
    let scheme = PermutationMatrix::with_permutation(perm.clone()).unwrap();
    let fixed = scheme.generate(rng, shape).unwrap();
    assert_unit_sums(&fixed);
    let expected = Array2::<FloatX>::eye(rows).select(Axis(1), &perm);
    assert_eq!(fixed, expected);

    let err = scheme.generate(rng, (rows + 1, rows + 1)).unwrap_err();
    assert_eq!(
        err,
        InitError::PermutationLength {
            expected: rows + 1,
            got: rows
        }
    );
}

#[test]
fn permutation_matrices_have_unit_row_and_column_sums() {
    let mut rng = rng_from_optional(Some(12345), "st-init/tests/permutation");
    for shape in [(5, 6), (6, 7), (5, 5), (3, 3), (8, 8), (200, 200)] {
        check_permutation(&mut rng, shape);
    }
}

#[test]
fn non_square_requests_fail_before_sampling() {
    let mut rng = rng_from_optional(Some(1), "st-init/tests/non-square");
    let before = rng.clone().next_u64();
    let err = PermutationMatrix::new().generate(&mut rng, (4, 3)).unwrap_err();
    assert_eq!(err, InitError::NonSquare { rows: 4, cols: 3 });
    assert_eq!(rng.next_u64(), before);
}

fn check_normalized(rng: &mut StdRng, shape: (usize, usize)) {
    let weights = NormalizedInitialization::new().generate(rng, shape).unwrap();
    assert_eq!(weights.dim(), shape);
    assert_eq!(
        std::mem::size_of_val(&weights[[0, 0]]),
        match float_precision() {
            FloatPrecision::Single => 4,
            FloatPrecision::Double => 8,
        }
    );

    let n = weights.len() as f64;
    let mean = weights.iter().map(|&v| v as f64).sum::<f64>() / n;
    let std = (weights
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-2);

    let expected = 2.0 * (6.0 / (shape.0 + shape.1) as f64).sqrt() / 12f64.sqrt();
    assert_abs_diff_eq!(expected, NormalizedInitialization::expected_std(shape), epsilon = 1e-12);
    assert_abs_diff_eq!(std, expected, epsilon = 1e-2);
}

#[test]
fn normalized_initialization_matches_glorot_statistics() {
    let mut rng = rng_from_optional(Some(1), "st-init/tests/normalized");
    check_normalized(&mut rng, (500, 600));
    check_normalized(&mut rng, (600, 500));
}

#[test]
fn normalized_samples_stay_inside_bound() {
    let mut rng = rng_from_optional(Some(2), "st-init/tests/normalized-bound");
    let shape = (30, 70);
    let bound = NormalizedInitialization::bound(shape) as FloatX;
    let weights = NormalizedInitialization::new().generate(&mut rng, shape).unwrap();
    assert!(weights.iter().all(|&v| v >= -bound && v < bound));
}
