//! Shared helpers: operand generation and the f64 reference GEMM.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simd_gemm::{KernelTable, SimdLevel};

pub fn random_matrix(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

/// Every level this CPU can run, widest last.
pub fn tables() -> Vec<KernelTable> {
    SimdLevel::supported_levels()
        .into_iter()
        .filter_map(KernelTable::for_level)
        .collect()
}

/// Reference `alpha * A * op(B) + beta * C` in f64, plus the magnitude
/// bound `|alpha| * sum |a||b| + |beta||c|` each entry is compared against.
#[allow(clippy::too_many_arguments)]
pub fn reference(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    trans_b: bool,
    beta: f32,
    c: &[f32],
    ldc: usize,
) -> (Vec<f64>, Vec<f64>) {
    let mut out = vec![0.0f64; m * n];
    let mut scale = vec![0.0f64; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut dot = 0.0f64;
            let mut mag = 0.0f64;
            for p in 0..k {
                let bv = if trans_b { b[j * ldb + p] } else { b[p * ldb + j] };
                let prod = a[i * lda + p] as f64 * bv as f64;
                dot += prod;
                mag += prod.abs();
            }
            let prior = if beta == 0.0 { 0.0 } else { beta as f64 * c[i * ldc + j] as f64 };
            out[i * n + j] = alpha as f64 * dot + prior;
            scale[i * n + j] = alpha.abs() as f64 * mag + prior.abs();
        }
    }
    (out, scale)
}

pub fn assert_matches(
    what: &str,
    c: &[f32],
    ldc: usize,
    n: usize,
    expected: &(Vec<f64>, Vec<f64>),
) {
    let (values, scale) = expected;
    for (idx, (want, mag)) in values.iter().zip(scale).enumerate() {
        let (i, j) = (idx / n, idx % n);
        let got = c[i * ldc + j] as f64;
        let tol = 1e-5 * mag + 1e-6;
        assert!(
            (got - want).abs() <= tol,
            "{what}: C[{i},{j}] = {got}, expected {want} (tol {tol})"
        );
    }
}
