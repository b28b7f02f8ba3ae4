//! Float comparison utilities for signal and spectrum assertions.

use std::fmt;

/// Result of comparing two sample buffers.
#[derive(Debug)]
pub struct ComparisonResult {
    pub max_abs_diff: f32,
    pub max_abs_diff_index: usize,
    pub mean_abs_diff: f32,
    pub mismatches: usize,
    pub total: usize,
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max_abs_diff={} (at index {}), mean_abs_diff={}, mismatches={}/{}",
            self.max_abs_diff,
            self.max_abs_diff_index,
            self.mean_abs_diff,
            self.mismatches,
            self.total,
        )
    }
}

/// Compare two f32 slices, returning detailed statistics.
pub fn compare_f32(actual: &[f32], expected: &[f32], tolerance: f32) -> ComparisonResult {
    assert_eq!(actual.len(), expected.len(), "Length mismatch");
    let total = actual.len();
    let mut max_abs_diff = 0.0f32;
    let mut max_abs_diff_index = 0;
    let mut sum_abs_diff = 0.0f64;
    let mut mismatches = 0;

    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        sum_abs_diff += diff as f64;
        if diff > max_abs_diff {
            max_abs_diff = diff;
            max_abs_diff_index = i;
        }
        if diff > tolerance {
            mismatches += 1;
        }
    }

    ComparisonResult {
        max_abs_diff,
        max_abs_diff_index,
        mean_abs_diff: if total > 0 {
            (sum_abs_diff / total as f64) as f32
        } else {
            0.0
        },
        mismatches,
        total,
    }
}

/// Assert two f32 slices are equal within absolute tolerance.
pub fn assert_f32_near(actual: &[f32], expected: &[f32], tolerance: f32) {
    let result = compare_f32(actual, expected, tolerance);
    assert!(
        result.mismatches == 0,
        "f32 comparison failed: {result}\n  actual[{}]={}, expected[{}]={}",
        result.max_abs_diff_index,
        actual[result.max_abs_diff_index],
        result.max_abs_diff_index,
        expected[result.max_abs_diff_index],
    );
}

/// Assert two f32 slices are equal within relative + absolute tolerance.
///
/// For each element pair, the tolerance is `max(abs_tol, |expected| * rel_tol)`.
pub fn assert_f32_relative(actual: &[f32], expected: &[f32], rel_tol: f32, abs_tol: f32) {
    assert_eq!(actual.len(), expected.len(), "Length mismatch");
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let tol = abs_tol.max(e.abs() * rel_tol);
        let diff = (a - e).abs();
        assert!(
            diff <= tol,
            "Mismatch at index {i}: actual={a}, expected={e}, diff={diff}, tol={tol}",
        );
    }
}

/// Assert every sample is a finite number.
pub fn assert_finite(samples: &[f32]) {
    for (i, &s) in samples.iter().enumerate() {
        assert!(s.is_finite(), "Non-finite sample at index {i}: {s}");
    }
}
