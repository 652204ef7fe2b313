//! Prepacked-B GEMM plans.
//!
//! When the same B (a weight matrix) multiplies many different A, packing
//! it once and replaying the blocked driver against the packed copy removes
//! the per-call packing cost:
//!
//! ```
//! use simd_gemm::PrepackedPlan;
//!
//! let (m, n, k) = (3, 4, 2);
//! let b = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
//!
//! let mut plan = PrepackedPlan::new(m, n, k).unwrap();
//! let packed = plan.pack_b(&b, n).unwrap();
//!
//! let a = [1.0f32, 0.0, 0.0, 1.0, 1.0, 1.0];
//! let mut c = [0.0f32; 12];
//! plan.run(&a, &packed, &mut c).unwrap();
//! assert_eq!(&c[8..], &[6.0, 8.0, 10.0, 12.0]);
//! ```

use std::fmt;

use crate::api::check_operand;
use crate::core::{gemm_nn_prepacked, reorder_b, BlockSizes, GemmPlan, GemmScratch, PackedBuffer};
use crate::error::{GemmError, Result};
use crate::simd::{kernel_table, KernelTable, PanelWidth, SimdLevel, TileShape};

/// Everything that determines the packed B layout of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanFingerprint {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub level: SimdLevel,
    pub shape: TileShape,
    pub blocks: BlockSizes,
}

impl PlanFingerprint {
    fn of(plan: &GemmPlan) -> Self {
        Self {
            m: plan.m,
            n: plan.n,
            k: plan.k,
            level: plan.level,
            shape: plan.shape,
            blocks: plan.blocks,
        }
    }
}

impl fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{} on {} (tile {}, blocks {}/{}/{})",
            self.m,
            self.n,
            self.k,
            self.level,
            self.shape,
            self.blocks.mc,
            self.blocks.nc,
            self.blocks.kc
        )
    }
}

/// B packed for one [`PrepackedPlan`].
#[derive(Debug, Clone)]
pub struct PackedB {
    data: PackedBuffer,
    fingerprint: PlanFingerprint,
}

impl PackedB {
    pub fn fingerprint(&self) -> &PlanFingerprint {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        self.data.as_slice()
    }
}

/// A GEMM shape bound once, replayed against a persistently packed B.
///
/// The plan owns the scratch used to pack A, so replaying it needs
/// `&mut self`; share one plan across threads only behind a lock, or give
/// each thread its own plan and a clone of the [`PackedB`].
#[derive(Debug, Clone)]
pub struct PrepackedPlan {
    plan: GemmPlan,
    scratch: GemmScratch,
}

impl PrepackedPlan {
    /// Plan `C (m x n) = A (m x k) * B (k x n)` on the bound level.
    pub fn new(m: usize, n: usize, k: usize) -> Result<Self> {
        Self::with_width(m, n, k, PanelWidth::Auto)
    }

    /// Plan with an explicit panel width family.
    pub fn with_width(m: usize, n: usize, k: usize, width: PanelWidth) -> Result<Self> {
        Self::with_table(kernel_table(), m, n, k, width)
    }

    /// Plan against a specific level's kernels.
    pub fn with_table(
        table: &KernelTable,
        m: usize,
        n: usize,
        k: usize,
        width: PanelWidth,
    ) -> Result<Self> {
        if m == 0 || n == 0 || k == 0 {
            return Err(GemmError::ZeroDimension { m, n, k });
        }
        Ok(Self {
            plan: table.plan_prepacked(m, n, k, width),
            scratch: GemmScratch::new(),
        })
    }

    pub fn m(&self) -> usize {
        self.plan.m
    }

    pub fn n(&self) -> usize {
        self.plan.n
    }

    pub fn k(&self) -> usize {
        self.plan.k
    }

    pub fn level(&self) -> SimdLevel {
        self.plan.level
    }

    pub fn shape(&self) -> TileShape {
        self.plan.shape
    }

    pub fn gemm_plan(&self) -> &GemmPlan {
        &self.plan
    }

    pub fn fingerprint(&self) -> PlanFingerprint {
        PlanFingerprint::of(&self.plan)
    }

    /// Floats needed to hold B packed.
    pub fn buffer_size(&self) -> usize {
        self.plan.prepacked_b_len()
    }

    /// Pack a `k` x `n` row-major B with leading dimension `ldb`.
    pub fn pack_b(&self, b: &[f32], ldb: usize) -> Result<PackedB> {
        let mut data = PackedBuffer::with_len(self.buffer_size());
        self.reorder_b_into(b, ldb, data.as_mut_slice())?;
        Ok(PackedB {
            data,
            fingerprint: self.fingerprint(),
        })
    }

    /// Pack B into caller-owned storage of at least [`Self::buffer_size`]
    /// floats.
    pub fn reorder_b_into(&self, b: &[f32], ldb: usize, dst: &mut [f32]) -> Result<()> {
        check_operand("B", b.len(), self.plan.k, self.plan.n, ldb)?;
        check_operand("packed B", dst.len(), 1, self.buffer_size(), self.buffer_size())?;
        unsafe { reorder_b(&self.plan, b.as_ptr(), ldb, dst.as_mut_ptr()) };
        Ok(())
    }

    /// `C = A * B` with dense A (`m` x `k`) and C (`m` x `n`).
    pub fn run(&mut self, a: &[f32], packed: &PackedB, c: &mut [f32]) -> Result<()> {
        let (k, n) = (self.plan.k, self.plan.n);
        self.run_with(1.0, a, k, packed, 0.0, c, n)
    }

    /// `C <- alpha * A * B + beta * C` with arbitrary strides.
    #[allow(clippy::too_many_arguments)]
    pub fn run_with(
        &mut self,
        alpha: f32,
        a: &[f32],
        lda: usize,
        packed: &PackedB,
        beta: f32,
        c: &mut [f32],
        ldc: usize,
    ) -> Result<()> {
        let expected = self.fingerprint();
        if packed.fingerprint != expected {
            return Err(GemmError::PlanMismatch {
                expected: expected.to_string(),
                found: packed.fingerprint.to_string(),
            });
        }
        self.run_packed_slice(alpha, a, lda, packed.as_slice(), beta, c, ldc)
    }

    /// Replay against a raw packed slice, checked for length only.
    #[allow(clippy::too_many_arguments)]
    fn run_packed_slice(
        &mut self,
        alpha: f32,
        a: &[f32],
        lda: usize,
        packed: &[f32],
        beta: f32,
        c: &mut [f32],
        ldc: usize,
    ) -> Result<()> {
        let (m, n, k) = (self.plan.m, self.plan.n, self.plan.k);
        check_operand("A", a.len(), m, k, lda)?;
        check_operand("packed B", packed.len(), 1, self.buffer_size(), self.buffer_size())?;
        check_operand("C", c.len(), m, n, ldc)?;
        unsafe {
            self.run_unchecked(
                alpha,
                a.as_ptr(),
                lda,
                packed.as_ptr(),
                beta,
                c.as_mut_ptr(),
                ldc,
            );
        }
        Ok(())
    }

    /// Replay without any validation.
    ///
    /// # Safety
    /// - `a` valid for `m` rows of `k` floats at stride `lda`
    /// - `packed` produced by this plan (or one with an equal fingerprint)
    /// - `c` valid for `m` rows of `n` floats at stride `ldc`
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn run_unchecked(
        &mut self,
        alpha: f32,
        a: *const f32,
        lda: usize,
        packed: *const f32,
        beta: f32,
        c: *mut f32,
        ldc: usize,
    ) {
        gemm_nn_prepacked(&self.plan, alpha, a, lda, packed, beta, c, ldc, &mut self.scratch);
    }
}

/// Floats a packed B for an `m` x `n` x `k` product needs on the bound
/// level.
pub fn packed_buffer_size(m: usize, n: usize, k: usize) -> Result<usize> {
    Ok(PrepackedPlan::new(m, n, k)?.buffer_size())
}

/// Pack a dense `k` x `n` B into `packed`, sized by [`packed_buffer_size`].
pub fn packed_reorder_b(
    m: usize,
    n: usize,
    k: usize,
    b: &[f32],
    packed: &mut [f32],
) -> Result<()> {
    PrepackedPlan::new(m, n, k)?.reorder_b_into(b, n, packed)
}

/// `C = A * B` for dense A and C against a B packed by [`packed_reorder_b`]
/// with the same dimensions.
pub fn packed_run(
    m: usize,
    n: usize,
    k: usize,
    a: &[f32],
    packed: &[f32],
    c: &mut [f32],
) -> Result<()> {
    PrepackedPlan::new(m, n, k)?.run_packed_slice(1.0, a, k, packed, 0.0, c, n)
}
