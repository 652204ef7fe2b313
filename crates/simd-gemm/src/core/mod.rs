//! Portable GEMM algorithms.
//!
//! Everything here is generic over the vector type and unchecked: the
//! kernels, packers and blocked drivers trust their callers for bounds.
//! `crate::simd` instantiates them per instruction set and the safe layer
//! at the crate root validates arguments before reaching them.

mod buffer;
mod gemm;
mod kernel;
mod mask;
mod packing;
mod scale;
mod tiling;
mod vector;

pub use buffer::PackedBuffer;
pub use gemm::{
    gemm_nn, gemm_nn_prepacked, gemm_nt, reorder_b, GemmPlan, GemmScratch, NtPlan, NtRowKernels,
    NT_MAX_ROW_KERNELS,
};
pub use kernel::{
    gemm_kernel_nn, gemm_kernel_nt, KernelSet, NnKernel, NtKernel, PackAFn, PackBFn, ScaleCFn,
};
pub use mask::{ColumnMasks, LaneMask, MAX_LANES, MAX_TILE_VECS};
pub use packing::{pack_a, pack_b, packed_a_size, packed_b_size, unpack_a, unpack_b};
pub use scale::scale_c;
pub use tiling::{align_hi, align_lo, BlockIterator, BlockSizes};
pub use vector::F32Vec;
#[cfg(target_arch = "aarch64")]
pub use vector::F32x4Neon;
#[cfg(target_arch = "x86_64")]
pub use vector::{F32x16, F32x8Avx, F32x8Fma};
