//! Per-ISA kernel families.
//!
//! Every level implements [`Isa`] the same way: the generic kernels from
//! `crate::core` are wrapped in functions compiled with the level's
//! `#[target_feature]`, and a lookup maps a runtime (rows, vectors) pair
//! to the matching monomorphized wrapper.

use super::detect::SimdLevel;
use crate::core::{F32Vec, NnKernel, NtKernel, PackBFn, ScaleCFn};

/// Largest tile height any level binds.
pub const MAX_TILE_ROWS: usize = 14;

/// One SIMD level's kernel family.
pub trait Isa {
    /// Register type the kernels are monomorphized over.
    type Vector: F32Vec;
    /// Next level down the capability chain.
    type Narrower: Isa;

    const LEVEL: SimdLevel;

    /// Whether the running CPU can execute this family.
    fn is_supported() -> bool {
        Self::LEVEL.is_supported()
    }

    /// Outer-product kernel for `rows` x `vecs` vectors.
    ///
    /// Panics for shapes outside 1..=14 rows and 1..=4 vectors.
    fn nn_kernel(rows: usize, vecs: usize) -> NnKernel;

    /// Dot-product kernel for `rows` x `cols` with rows in {1, 2, 3, 6}
    /// and cols in {1, 4}.
    fn nt_kernel(rows: usize, cols: usize) -> NtKernel;

    fn pack_b() -> PackBFn;

    fn scale_c() -> ScaleCFn;
}

/// Generates the feature-gated wrappers and the lookups an [`Isa`] impl
/// returns. Invoked once per level module.
macro_rules! isa_kernels {
    ($vector:ty $(, #[$attr:meta])*) => {
        $(#[$attr])*
        #[allow(clippy::too_many_arguments)]
        unsafe fn nn<const ROWS: usize, const VECS: usize>(
            k: usize,
            alpha: f32,
            a: *const f32,
            lda: usize,
            b: *const f32,
            sb: usize,
            c: *mut f32,
            ldc: usize,
            masks: &crate::core::ColumnMasks,
        ) {
            crate::core::gemm_kernel_nn::<$vector, ROWS, VECS>(k, alpha, a, lda, b, sb, c, ldc, masks)
        }

        $(#[$attr])*
        #[allow(clippy::too_many_arguments)]
        unsafe fn nt<const ROWS: usize, const COLS: usize>(
            k: usize,
            alpha: f32,
            a: *const f32,
            lda: usize,
            b: *const f32,
            ldb: usize,
            c: *mut f32,
            ldc: usize,
        ) {
            crate::core::gemm_kernel_nt::<$vector, ROWS, COLS>(k, alpha, a, lda, b, ldb, c, ldc)
        }

        $(#[$attr])*
        unsafe fn pack_b(
            b: *const f32,
            ldb: usize,
            k: usize,
            n: usize,
            micro_n: usize,
            dst: *mut f32,
        ) {
            crate::core::pack_b::<$vector>(b, ldb, k, n, micro_n, dst)
        }

        $(#[$attr])*
        unsafe fn scale_c(m: usize, n: usize, beta: f32, c: *mut f32, ldc: usize) {
            crate::core::scale_c::<$vector>(m, n, beta, c, ldc)
        }

        fn nn_lookup(rows: usize, vecs: usize) -> crate::core::NnKernel {
            nn_lookup!(nn, rows, vecs; 1 2 3 4 5 6 7 8 9 10 11 12 13 14)
        }

        fn nt_lookup(rows: usize, cols: usize) -> crate::core::NtKernel {
            match (rows, cols) {
                (1, 1) => nt::<1, 1> as crate::core::NtKernel,
                (1, 4) => nt::<1, 4> as crate::core::NtKernel,
                (2, 1) => nt::<2, 1> as crate::core::NtKernel,
                (2, 4) => nt::<2, 4> as crate::core::NtKernel,
                (3, 1) => nt::<3, 1> as crate::core::NtKernel,
                (3, 4) => nt::<3, 4> as crate::core::NtKernel,
                (6, 1) => nt::<6, 1> as crate::core::NtKernel,
                (6, 4) => nt::<6, 4> as crate::core::NtKernel,
                _ => panic!("no nt kernel for {rows}x{cols}"),
            }
        }
    };
}

macro_rules! nn_lookup {
    ($kernel:ident, $rows:expr, $vecs:expr; $($r:literal)*) => {
        match $rows {
            $(
                $r => match $vecs {
                    1 => $kernel::<$r, 1> as crate::core::NnKernel,
                    2 => $kernel::<$r, 2> as crate::core::NnKernel,
                    3 => $kernel::<$r, 3> as crate::core::NnKernel,
                    4 => $kernel::<$r, 4> as crate::core::NnKernel,
                    v => panic!("no nn kernel with {v} vectors"),
                },
            )*
            r => panic!("no nn kernel with {r} rows"),
        }
    };
}

// Level modules come after the macros so they are in textual scope.
mod scalar;
pub use scalar::Scalar;

#[cfg(target_arch = "x86_64")]
mod avx;
#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
mod avx512;
#[cfg(target_arch = "x86_64")]
mod sse2;
#[cfg(target_arch = "x86_64")]
pub use {avx::Avx, avx2::Avx2, avx512::Avx512, sse2::Sse2};

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "aarch64")]
pub use neon::Neon;

/// Run `f` with the [`Isa`] of `level` if it is compiled in and
/// supported here.
macro_rules! with_isa {
    ($level:expr, $isa:ident => $body:expr) => {{
        use $crate::simd::kernels::*;
        match $level {
            $crate::simd::SimdLevel::Scalar => {
                type $isa = Scalar;
                Some($body)
            }
            #[cfg(target_arch = "x86_64")]
            $crate::simd::SimdLevel::Sse2 => {
                type $isa = Sse2;
                Some($body)
            }
            #[cfg(target_arch = "x86_64")]
            $crate::simd::SimdLevel::Avx if Avx::is_supported() => {
                type $isa = Avx;
                Some($body)
            }
            #[cfg(target_arch = "x86_64")]
            $crate::simd::SimdLevel::Avx2 if Avx2::is_supported() => {
                type $isa = Avx2;
                Some($body)
            }
            #[cfg(target_arch = "x86_64")]
            $crate::simd::SimdLevel::Avx512 if Avx512::is_supported() => {
                type $isa = Avx512;
                Some($body)
            }
            #[cfg(target_arch = "aarch64")]
            $crate::simd::SimdLevel::Neon => {
                type $isa = Neon;
                Some($body)
            }
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }};
}

pub(crate) use with_isa;

#[cfg(test)]
mod tests {
    use super::*;

    fn check_family<I: Isa>() {
        assert_eq!(<I::Vector as F32Vec>::LANES, I::LEVEL.f32_width());
        for rows in 1..=MAX_TILE_ROWS {
            for vecs in 1..=4 {
                let _ = I::nn_kernel(rows, vecs);
            }
        }
        for rows in [1, 2, 3, 6] {
            for cols in [1, 4] {
                let _ = I::nt_kernel(rows, cols);
            }
        }
        assert!(I::Narrower::LEVEL <= I::LEVEL || I::LEVEL == SimdLevel::Neon);
    }

    #[test]
    fn test_families_are_complete() {
        check_family::<Scalar>();
        #[cfg(target_arch = "x86_64")]
        {
            check_family::<Sse2>();
            check_family::<Avx>();
            check_family::<Avx2>();
            check_family::<Avx512>();
        }
        #[cfg(target_arch = "aarch64")]
        check_family::<Neon>();
    }

    #[test]
    #[should_panic(expected = "no nn kernel with 15 rows")]
    fn test_nn_lookup_rejects_tall_tiles() {
        let _ = Scalar::nn_kernel(15, 1);
    }

    #[test]
    fn test_with_isa_scalar() {
        let level = with_isa!(SimdLevel::Scalar, I => <I as Isa>::LEVEL);
        assert_eq!(level, Some(SimdLevel::Scalar));
    }
}
