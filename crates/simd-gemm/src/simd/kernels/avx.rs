//! AVX kernels: 256-bit vectors, separate multiply and add.

use super::{Isa, Sse2};
use crate::core::{F32x8Avx, NnKernel, NtKernel, PackBFn, ScaleCFn};
use crate::simd::detect::SimdLevel;

#[derive(Debug, Default, Clone, Copy)]
pub struct Avx;

isa_kernels!(F32x8Avx, #[target_feature(enable = "avx")]);

impl Isa for Avx {
    type Vector = F32x8Avx;
    type Narrower = Sse2;

    const LEVEL: SimdLevel = SimdLevel::Avx;

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
