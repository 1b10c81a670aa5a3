//! # Test utilities for the lamina crates
//! Reference gemm, seeded inputs and guarded buffers. Not meant for use
//! outside the workspace.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod guard;

pub use guard::GuardedBuffer;

/// Relative tolerance of sgemm results against the f64 reference.
pub const EPS: f64 = 1e-4;

/// Sizes that straddle the row tiles, vector widths and band widths of every
/// kernel variant.
pub const DIMS: [usize; 15] = [1, 2, 3, 7, 8, 9, 15, 16, 17, 31, 32, 33, 127, 128, 129];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ABLayout {
    NN,
    NT,
    TN,
    TT,
}

impl ABLayout {
    pub const ALL: [ABLayout; 4] = [ABLayout::NN, ABLayout::NT, ABLayout::TN, ABLayout::TT];

    /// (trans_a, trans_b)
    pub fn transposes(self) -> (bool, bool) {
        match self {
            ABLayout::NN => (false, false),
            ABLayout::NT => (false, true),
            ABLayout::TN => (true, false),
            ABLayout::TT => (true, true),
        }
    }
}

/// Tight row-major leading dimensions `(lda, ldb, ldc)` for a layout.
pub fn layout_to_lds(layout: ABLayout, m: usize, n: usize, k: usize) -> (usize, usize, usize) {
    match layout {
        ABLayout::NN => (k, n, n),
        ABLayout::NT => (k, k, n),
        ABLayout::TN => (m, n, n),
        ABLayout::TT => (m, k, n),
    }
}

pub fn random_matrix_seeded(arr: &mut [f32], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::new(-1.0f32, 1.0);
    arr.iter_mut().for_each(|p| *p = dist.sample(&mut rng));
}

/// Fills `arr` with values uniform in [-1, 1) from a fixed seed.
pub fn random_matrix_uniform(arr: &mut [f32]) {
    random_matrix_seeded(arr, 43);
}

/// Row-major `C = alpha*op(A)*op(B) + beta*C` accumulated in f64.
///
/// `beta == 0` ignores the previous content of C, NaN included.
#[allow(clippy::too_many_arguments)]
pub fn gemm_reference(
    trans_a: bool,
    trans_b: bool,
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    beta: f32,
    c: &mut [f32],
    ldc: usize,
) {
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0f64;
            for p in 0..k {
                let a_ip = if trans_a { a[p * lda + i] } else { a[i * lda + p] };
                let b_pj = if trans_b { b[j * ldb + p] } else { b[p * ldb + j] };
                acc += a_ip as f64 * b_pj as f64;
            }
            let prev = if beta == 0.0 { 0.0 } else { beta as f64 * c[i * ldc + j] as f64 };
            c[i * ldc + j] = (alpha as f64 * acc + prev) as f32;
        }
    }
}

/// Largest `|x - y| / max(1, |y|)` over both slices; NaN counts as infinite.
pub fn max_rel_diff(c: &[f32], c_ref: &[f32]) -> f64 {
    assert_eq!(c.len(), c_ref.len());
    c.iter().zip(c_ref).fold(0f64, |acc, (&x, &y)| {
        let d = (x as f64 - y as f64).abs() / (y as f64).abs().max(1.0);
        if d.is_nan() {
            f64::INFINITY
        } else {
            acc.max(d)
        }
    })
}

/// Runs the reference on `c_ref` (holding the C the kernel started from) and
/// returns the largest relative difference to `c`.
#[allow(clippy::too_many_arguments)]
pub fn check_gemm_f32(
    trans_a: bool,
    trans_b: bool,
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    beta: f32,
    c: &[f32],
    c_ref: &mut [f32],
    ldc: usize,
) -> f64 {
    gemm_reference(trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c_ref, ldc);
    max_rel_diff(c, c_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_small() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [f32::NAN; 4];
        gemm_reference(false, false, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
        // a^T * b
        let mut c = [1.0; 4];
        gemm_reference(true, false, 2, 2, 2, 1.0, &a, 2, &b, 2, 2.0, &mut c, 2);
        assert_eq!(c, [28.0, 32.0, 40.0, 46.0]);
    }

    #[test]
    fn uniform_range() {
        let mut x = vec![0f32; 1000];
        random_matrix_uniform(&mut x);
        assert!(x.iter().all(|v| (-1.0..1.0).contains(v)));
        let mut y = vec![0f32; 1000];
        random_matrix_uniform(&mut y);
        assert_eq!(x, y);
    }

    #[test]
    fn diff_metric() {
        assert_eq!(max_rel_diff(&[1.0, 200.0], &[1.0, 100.0]), 1.0);
        assert_eq!(max_rel_diff(&[0.5], &[0.25]), 0.25);
        assert!(max_rel_diff(&[f32::NAN], &[0.0]).is_infinite());
    }
}
