//! NEON kernels over 128-bit vectors with fused multiply-add.

use super::{Isa, Scalar};
use crate::core::{F32x4Neon, NnKernel, NtKernel, PackBFn, ScaleCFn};
use crate::simd::detect::SimdLevel;

#[derive(Debug, Default, Clone, Copy)]
pub struct Neon;

isa_kernels!(F32x4Neon, #[target_feature(enable = "neon")]);

impl Isa for Neon {
    type Vector = F32x4Neon;
    type Narrower = Scalar;

    const LEVEL: SimdLevel = SimdLevel::Neon;

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
