//! AVX-512F kernels over zmm registers, 32 architectural registers,
//! opmask tails and fused multiply-add.

use super::{Avx2, Isa};
use crate::core::{F32x16, NnKernel, NtKernel, PackBFn, ScaleCFn};
use crate::simd::detect::SimdLevel;

#[derive(Debug, Default, Clone, Copy)]
pub struct Avx512;

isa_kernels!(F32x16, #[target_feature(enable = "avx512f,avx2,fma")]);

impl Isa for Avx512 {
    type Vector = F32x16;
    type Narrower = Avx2;

    const LEVEL: SimdLevel = SimdLevel::Avx512;

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
