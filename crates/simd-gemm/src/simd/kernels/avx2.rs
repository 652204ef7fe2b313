//! AVX2 + FMA kernels over 256-bit vectors.

use super::{Avx, Isa};
use crate::core::{F32x8Fma, NnKernel, NtKernel, PackBFn, ScaleCFn};
use crate::simd::detect::SimdLevel;

#[derive(Debug, Default, Clone, Copy)]
pub struct Avx2;

isa_kernels!(F32x8Fma, #[target_feature(enable = "avx2,fma")]);

impl Isa for Avx2 {
    type Vector = F32x8Fma;
    type Narrower = Avx;

    const LEVEL: SimdLevel = SimdLevel::Avx2;

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
