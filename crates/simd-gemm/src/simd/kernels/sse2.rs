//! SSE2 kernels over 128-bit vectors. Baseline on every x86_64 CPU.

use wide::f32x4;

use super::{Isa, Scalar};
use crate::core::{NnKernel, NtKernel, PackBFn, ScaleCFn};
use crate::simd::detect::SimdLevel;

#[derive(Debug, Default, Clone, Copy)]
pub struct Sse2;

isa_kernels!(f32x4, #[target_feature(enable = "sse2")]);

impl Isa for Sse2 {
    type Vector = f32x4;
    type Narrower = Scalar;

    const LEVEL: SimdLevel = SimdLevel::Sse2;

    fn nn_kernel(rows: usize, vecs: usize) -> NnKernel {
        nn_lookup(rows, vecs)
    }

    fn nt_kernel(rows: usize, cols: usize) -> NtKernel {
        nt_lookup(rows, cols)
    }

    fn pack_b() -> PackBFn {
        pack_b
    }

    fn scale_c() -> ScaleCFn {
        scale_c
    }
}
