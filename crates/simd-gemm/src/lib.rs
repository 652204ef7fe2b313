//! Cache-blocked single-precision GEMM with runtime SIMD dispatch.
//!
//! Computes `C <- alpha * A * B + beta * C` (and the `A * B^T` variant) for
//! row-major f32 matrices with arbitrary leading dimensions. The engine is
//! built BLIS style: operands are packed into panels sized for the cache
//! hierarchy, and fixed-size register-tiled microkernels, monomorphized per
//! tile shape, do the arithmetic. The kernel family is chosen once per
//! process from the most capable instruction set the CPU supports:
//!
//! | Level      | f32 lanes | Registers | FMA |
//! |------------|-----------|-----------|-----|
//! | `avx512`   | 16        | 32        | yes |
//! | `avx2`     | 8         | 16        | yes |
//! | `avx`      | 8         | 16        | no  |
//! | `sse2`     | 4         | 16        | no  |
//! | `neon`     | 4         | 32        | yes |
//! | `scalar`   | 1         | 16        | no  |
//!
//! # Quick Start
//!
//! ```
//! use simd_gemm::matmul;
//!
//! let a = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2x3
//! let b = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]; // 3x2
//!
//! let c = matmul(&a, 2, 3, &b, 2).unwrap();
//! assert_eq!(c, vec![22.0, 28.0, 49.0, 64.0]);
//! ```
//!
//! # BLAS-style API
//!
//! ```
//! use simd_gemm::{sgemm_nn, Gemm};
//!
//! let a = vec![1.0f32; 64 * 64];
//! let b = vec![1.0f32; 64 * 64];
//! let mut c = vec![0.0f32; 64 * 64];
//!
//! sgemm_nn(64, 64, 64, 1.0, &a, 64, &b, 64, 0.0, &mut c, 64).unwrap();
//! assert_eq!(c[0], 64.0);
//!
//! Gemm::new(64, 64, 64)
//!     .alpha(0.5)
//!     .beta(1.0)
//!     .execute(&a, 64, &b, 64, &mut c, 64)
//!     .unwrap();
//! assert_eq!(c[0], 96.0);
//! ```
//!
//! # Reusing a packed B
//!
//! [`PrepackedPlan`] packs B once and replays the blocked driver for many
//! A matrices; see the [`plan`] module.
//!
//! # Dispatch
//!
//! ```
//! use simd_gemm::Backend;
//!
//! println!("Using: {}", Backend::description());
//! ```
//!
//! The bound level can be forced with `SIMD_GEMM_LEVEL` or [`init`], and
//! the cache sizes that drive blocking with `SIMD_GEMM_L1/L2/L3`; see
//! [`config`].

pub mod config;
pub mod core;
pub mod error;
pub mod mat;
pub mod plan;
pub mod simd;

mod api;
mod backend;

// Public API
pub use api::{matmul, sgemm_nn, sgemm_nt, Gemm};
pub use backend::{version_info, Backend};

pub use config::CacheSizes;
pub use error::{GemmError, Result};
pub use mat::{Mat, MatMut, MatRef};
pub use plan::{
    packed_buffer_size, packed_reorder_b, packed_run, PackedB, PlanFingerprint, PrepackedPlan,
};
pub use simd::{
    gemm32f_nn, gemm32f_nt, init, kernel_table, simd_level, KernelTable, PanelWidth, SimdLevel,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::{
        matmul, sgemm_nn, sgemm_nt, Backend, Gemm, GemmError, Mat, MatMut, MatRef, PackedB,
        PanelWidth, PrepackedPlan, SimdLevel,
    };
}
