//! Instruction-set specific kernel families and the dispatch that binds
//! one of them for the process.

mod detect;
pub mod dispatch;
pub mod kernels;
pub mod select;

pub use detect::{detected_level, SimdLevel};
pub use dispatch::{gemm32f_nn, gemm32f_nt, init, kernel_table, simd_level, KernelTable};
pub use kernels::{Isa, Scalar, MAX_TILE_ROWS};
#[cfg(target_arch = "x86_64")]
pub use kernels::{Avx, Avx2, Avx512, Sse2};
#[cfg(target_arch = "aarch64")]
pub use kernels::Neon;
pub use select::{
    kernel_set, nt_row_counts, plan_nn, plan_nt, plan_prepacked, select_nn_shape,
    select_prepacked_shape, should_pack_a, PanelWidth, TileShape, PACK_A_THRESHOLD,
};
