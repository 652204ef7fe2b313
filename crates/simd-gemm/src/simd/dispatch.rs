//! Process-wide kernel binding.
//!
//! The first GEMM call (or an explicit [`init`]) probes the CPU, picks the
//! most capable compiled level and stores its [`KernelTable`] in a
//! `OnceLock`. The table is immutable afterwards and every entry point
//! reads it without synchronization beyond the one-time barrier.

use std::cell::RefCell;
use std::fmt;
use std::sync::OnceLock;

use super::detect::{detected_level, SimdLevel};
use super::kernels::{with_isa, Isa};
use super::select::{plan_nn, plan_nt, plan_prepacked, PanelWidth};
use crate::config::{self, CacheSizes};
use crate::core::{
    gemm_nn, gemm_nt, pack_a, F32Vec, GemmPlan, GemmScratch, NtPlan, PackAFn, PackBFn, ScaleCFn,
};
use crate::error::{GemmError, Result};

type PlanNnFn = fn(usize, usize, usize, &CacheSizes) -> GemmPlan;
type PlanPrepackedFn = fn(usize, usize, usize, PanelWidth, &CacheSizes) -> GemmPlan;
type PlanNtFn = fn(usize, usize, usize, &CacheSizes) -> NtPlan;

thread_local! {
    /// Packing buffers for [`KernelTable::gemm_nn`]; they only grow, so
    /// repeated calls on one thread stop allocating once the largest
    /// panel has been seen.
    static SCRATCH: RefCell<GemmScratch> = RefCell::new(GemmScratch::new());
}

/// Entry points of one SIMD level.
///
/// Every level exposes the same functional contract; tables differ only in
/// vector width, register budget and FMA availability.
#[derive(Clone, Copy)]
pub struct KernelTable {
    pub level: SimdLevel,
    /// f32 lanes per vector.
    pub lanes: usize,
    pub registers: usize,
    pub fma: bool,
    nn_planner: PlanNnFn,
    prepacked_planner: PlanPrepackedFn,
    nt_planner: PlanNtFn,
    pub pack_a: PackAFn,
    pub pack_b: PackBFn,
    pub scale_c: ScaleCFn,
}

impl KernelTable {
    /// Table for the kernel family `I`.
    ///
    /// Building a table never executes a kernel, so this is safe even when
    /// the CPU lacks `I`'s features; [`KernelTable::for_level`] is the
    /// checked constructor.
    pub fn of<I: Isa>() -> Self {
        Self {
            level: I::LEVEL,
            lanes: <I::Vector as F32Vec>::LANES,
            registers: I::LEVEL.registers(),
            fma: I::LEVEL.has_fma(),
            nn_planner: plan_nn::<I>,
            prepacked_planner: plan_prepacked::<I>,
            nt_planner: plan_nt::<I>,
            pack_a,
            pack_b: I::pack_b(),
            scale_c: I::scale_c(),
        }
    }

    /// Table for `level` if it is compiled for this target and the CPU
    /// supports it.
    pub fn for_level(level: SimdLevel) -> Option<Self> {
        with_isa!(level, I => Self::of::<I>())
    }

    /// Table for `level`, or for the first narrower level that is
    /// available.
    pub fn at_most(mut level: SimdLevel) -> Self {
        loop {
            if let Some(table) = Self::for_level(level) {
                return table;
            }
            level = level.narrower();
        }
    }

    /// Table for the most capable level of this CPU.
    pub fn detect() -> Self {
        Self::at_most(detected_level())
    }

    pub fn plan_nn(&self, m: usize, n: usize, k: usize) -> GemmPlan {
        self.plan_nn_with(m, n, k, config::cache_sizes())
    }

    pub fn plan_nn_with(&self, m: usize, n: usize, k: usize, cache: &CacheSizes) -> GemmPlan {
        (self.nn_planner)(m, n, k, cache)
    }

    pub fn plan_prepacked(&self, m: usize, n: usize, k: usize, width: PanelWidth) -> GemmPlan {
        self.plan_prepacked_with(m, n, k, width, config::cache_sizes())
    }

    pub fn plan_prepacked_with(
        &self,
        m: usize,
        n: usize,
        k: usize,
        width: PanelWidth,
        cache: &CacheSizes,
    ) -> GemmPlan {
        (self.prepacked_planner)(m, n, k, width, cache)
    }

    pub fn plan_nt(&self, m: usize, n: usize, k: usize) -> NtPlan {
        self.plan_nt_with(m, n, k, config::cache_sizes())
    }

    pub fn plan_nt_with(&self, m: usize, n: usize, k: usize, cache: &CacheSizes) -> NtPlan {
        (self.nt_planner)(m, n, k, cache)
    }

    /// `C <- alpha * A * B + beta * C` with all operands row-major.
    ///
    /// # Safety
    /// - `a` valid for `m` rows of `k` floats at stride `lda`
    /// - `b` valid for `k` rows of `n` floats at stride `ldb`
    /// - `c` valid for `m` rows of `n` floats at stride `ldc`
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn gemm_nn(
        &self,
        m: usize,
        n: usize,
        k: usize,
        alpha: f32,
        a: *const f32,
        lda: usize,
        b: *const f32,
        ldb: usize,
        beta: f32,
        c: *mut f32,
        ldc: usize,
    ) {
        let plan = self.plan_nn(m, n, k);
        SCRATCH.with_borrow_mut(|scratch| {
            gemm_nn(&plan, alpha, a, lda, b, ldb, beta, c, ldc, scratch);
        });
    }

    /// `C <- alpha * A * B^T + beta * C`, B stored as `n` rows of `k`.
    ///
    /// # Safety
    /// - `a` valid for `m` rows of `k` floats at stride `lda`
    /// - `b` valid for `n` rows of `k` floats at stride `ldb`
    /// - `c` valid for `m` rows of `n` floats at stride `ldc`
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn gemm_nt(
        &self,
        m: usize,
        n: usize,
        k: usize,
        alpha: f32,
        a: *const f32,
        lda: usize,
        b: *const f32,
        ldb: usize,
        beta: f32,
        c: *mut f32,
        ldc: usize,
    ) {
        let plan = self.plan_nt(m, n, k);
        gemm_nt(&plan, alpha, a, lda, b, ldb, beta, c, ldc);
    }
}

impl fmt::Debug for KernelTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelTable")
            .field("level", &self.level)
            .field("lanes", &self.lanes)
            .field("registers", &self.registers)
            .field("fma", &self.fma)
            .finish_non_exhaustive()
    }
}

static BOUND: OnceLock<KernelTable> = OnceLock::new();

fn bind(level: SimdLevel) -> KernelTable {
    let table = KernelTable::at_most(level);
    log::info!(
        "simd-gemm bound to {} ({} lanes, {} registers, fma: {})",
        table.level,
        table.lanes,
        table.registers,
        table.fma
    );
    table
}

fn default_level() -> SimdLevel {
    let detected = detected_level();
    match config::level_override() {
        Some(level) if level.is_supported() => level,
        Some(level) => {
            log::warn!(
                "{} asks for {level}, which this CPU does not support; using {detected}",
                config::ENV_LEVEL
            );
            detected
        }
        None => detected,
    }
}

/// The process-wide kernel table, bound on first use.
pub fn kernel_table() -> &'static KernelTable {
    BOUND.get_or_init(|| bind(default_level()))
}

/// Bind the process-wide table to `level` explicitly.
///
/// Must run before the first GEMM call to take effect; binding the level
/// that is already bound is a no-op.
pub fn init(level: SimdLevel) -> Result<&'static KernelTable> {
    if !level.is_supported() {
        return Err(GemmError::UnsupportedLevel(level));
    }
    let table = BOUND.get_or_init(|| bind(level));
    if table.level != level {
        return Err(GemmError::AlreadyInitialized {
            bound: table.level,
            requested: level,
        });
    }
    Ok(table)
}

/// Level the process-wide table is bound to.
pub fn simd_level() -> SimdLevel {
    kernel_table().level
}

/// Unchecked NN entry point on the bound level, with the scale pair
/// passed by reference.
///
/// # Safety
/// See [`KernelTable::gemm_nn`].
#[allow(clippy::too_many_arguments)]
pub unsafe fn gemm32f_nn(
    m: usize,
    n: usize,
    k: usize,
    alpha: &f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    ldb: usize,
    beta: &f32,
    c: *mut f32,
    ldc: usize,
) {
    kernel_table().gemm_nn(m, n, k, *alpha, a, lda, b, ldb, *beta, c, ldc);
}

/// Unchecked NT entry point on the bound level.
///
/// # Safety
/// See [`KernelTable::gemm_nt`].
#[allow(clippy::too_many_arguments)]
pub unsafe fn gemm32f_nt(
    m: usize,
    n: usize,
    k: usize,
    alpha: &f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    ldb: usize,
    beta: &f32,
    c: *mut f32,
    ldc: usize,
) {
    kernel_table().gemm_nt(m, n, k, *alpha, a, lda, b, ldb, *beta, c, ldc);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_level_respects_support() {
        for level in SimdLevel::ALL {
            let table = KernelTable::for_level(level);
            assert_eq!(table.is_some(), level.is_supported(), "{level}");
            if let Some(table) = table {
                assert_eq!(table.level, level);
                assert_eq!(table.lanes, level.f32_width());
            }
        }
    }

    #[test]
    fn test_at_most_falls_back() {
        let table = KernelTable::at_most(SimdLevel::Avx512);
        assert!(table.level <= SimdLevel::Avx512 || table.level == SimdLevel::Neon);
        assert!(table.level.is_supported());
        assert_eq!(KernelTable::at_most(SimdLevel::Scalar).level, SimdLevel::Scalar);
    }

    #[test]
    fn test_detect_matches_hardware() {
        assert_eq!(KernelTable::detect().level, detected_level());
    }

    #[test]
    fn test_bound_table_is_stable() {
        let first = kernel_table().level;
        assert_eq!(simd_level(), first);
        assert!(init(first).is_ok());
    }

    #[test]
    fn test_init_rejects_rebinding() {
        let bound = kernel_table().level;
        let other = SimdLevel::supported_levels()
            .into_iter()
            .find(|level| *level != bound);
        if let Some(other) = other {
            assert_eq!(
                init(other).unwrap_err(),
                GemmError::AlreadyInitialized {
                    bound,
                    requested: other
                }
            );
        }
    }

    #[test]
    fn test_nn_scratch_is_reused_per_thread() {
        let table = KernelTable::at_most(SimdLevel::Scalar);
        let (m, n, k) = (9, 40, 33);
        let a = vec![1.0f32; m * k];
        let b = vec![0.5f32; k * n];
        let mut c = vec![f32::NAN; m * n];
        unsafe { table.gemm_nn(m, n, k, 1.0, a.as_ptr(), k, b.as_ptr(), n, 0.0, c.as_mut_ptr(), n) };
        assert!(c.iter().all(|&x| x == 16.5));

        let packed_b = || SCRATCH.with_borrow(|s| (s.b.as_ptr(), s.b.len()));
        let grown = packed_b();
        assert!(grown.1 >= table.plan_nn(m, n, k).packed_b_len());

        // A smaller call packs into the same allocation.
        let mut c = [0.0f32; 4];
        let small = [1.0f32, 2.0, 3.0, 4.0];
        unsafe {
            table.gemm_nn(2, 2, 2, 1.0, small.as_ptr(), 2, small.as_ptr(), 2, 0.0, c.as_mut_ptr(), 2)
        };
        assert_eq!(c, [7.0, 10.0, 15.0, 22.0]);
        assert_eq!(packed_b(), grown);
    }

    #[test]
    fn test_raw_entry_points() {
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let b = [5.0f32, 6.0, 7.0, 8.0];
        let mut c = [1.0f32; 4];
        unsafe { gemm32f_nn(2, 2, 2, &1.0, a.as_ptr(), 2, b.as_ptr(), 2, &1.0, c.as_mut_ptr(), 2) };
        assert_eq!(c, [20.0, 23.0, 44.0, 51.0]);

        let mut c = [0.0f32; 4];
        unsafe { gemm32f_nt(2, 2, 2, &2.0, a.as_ptr(), 2, b.as_ptr(), 2, &0.0, c.as_mut_ptr(), 2) };
        assert_eq!(c, [34.0, 46.0, 78.0, 106.0]);
    }
}
