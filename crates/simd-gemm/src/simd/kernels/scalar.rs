//! Portable fallback: one lane per "vector".

use super::Isa;
use crate::core::{NnKernel, NtKernel, PackBFn, ScaleCFn};
use crate::simd::detect::SimdLevel;

/// Plain `f32` kernels, always available.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scalar;

isa_kernels!(f32);

impl Isa for Scalar {
    type Vector = f32;
    type Narrower = Scalar;

    const LEVEL: SimdLevel = SimdLevel::Scalar;

    fn is_supported() -> bool {
        true
    }

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
