use std::fmt;

use super::buffer::PackedBuffer;
use super::kernel::{KernelSet, NtKernel, PackAFn, PackBFn, ScaleCFn};
use super::packing::packed_b_size;
use super::tiling::{align_hi, align_lo, BlockIterator, BlockSizes};
use crate::simd::{SimdLevel, TileShape};

/// A bound NN GEMM: dimensions, tile shape, panel sizes and the kernel
/// entry points of one SIMD level.
///
/// Plans are pure data and can be rebuilt or cached freely; a plan built
/// for one (M, N, K, level) must not be replayed for another.
#[derive(Clone, Copy)]
pub struct GemmPlan {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub level: SimdLevel,
    pub shape: TileShape,
    pub blocks: BlockSizes,
    pub kernels: KernelSet,
    /// Set when packing A pays off for this problem size.
    pub pack_a: Option<PackAFn>,
    pub pack_b: PackBFn,
    pub scale_c: ScaleCFn,
}

impl GemmPlan {
    /// Scratch floats needed for one packed A panel.
    pub fn packed_a_len(&self) -> usize {
        if self.pack_a.is_some() {
            self.blocks.mc * self.blocks.kc
        } else {
            0
        }
    }

    /// Scratch floats needed for one packed B panel.
    pub fn packed_b_len(&self) -> usize {
        self.blocks.nc * self.blocks.kc
    }

    /// Floats needed to hold all of B packed ahead of time.
    pub fn prepacked_b_len(&self) -> usize {
        packed_b_size(self.k, self.n, self.shape.cols())
    }

    /// Offset of the (N panel at `j0` of width `nc`, K panel at `p0`)
    /// block inside a fully prepacked B.
    ///
    /// Blocks are laid out N panel by N panel, and within one N panel K
    /// panel by K panel; every N panel but the last is exactly
    /// `blocks.nc` wide.
    pub fn prepacked_offset(&self, j0: usize, p0: usize, nc: usize) -> usize {
        j0 * self.k + p0 * align_hi(nc, self.shape.cols())
    }
}

impl fmt::Debug for GemmPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GemmPlan")
            .field("m", &self.m)
            .field("n", &self.n)
            .field("k", &self.k)
            .field("level", &self.level)
            .field("shape", &self.shape)
            .field("blocks", &self.blocks)
            .field("pack_a", &self.pack_a.is_some())
            .field("kernels", &self.kernels)
            .finish()
    }
}

/// Dot-product kernels for one row count: four output columns and one.
#[derive(Clone, Copy)]
pub struct NtRowKernels {
    pub rows: usize,
    pub x4: NtKernel,
    pub x1: NtKernel,
}

/// Most distinct row counts an NT plan carries.
pub const NT_MAX_ROW_KERNELS: usize = 4;

/// A bound NT GEMM.
///
/// Rows are consumed greedily by the largest row kernel that still fits,
/// so `kernels` is ordered by descending row count and always ends with
/// a single-row entry.
#[derive(Clone, Copy)]
pub struct NtPlan {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub level: SimdLevel,
    pub blocks: BlockSizes,
    pub kernels: [Option<NtRowKernels>; NT_MAX_ROW_KERNELS],
    pub scale_c: ScaleCFn,
}

impl NtPlan {
    /// Largest row count, the panel alignment for M.
    pub fn micro_m(&self) -> usize {
        self.kernels
            .iter()
            .flatten()
            .map(|k| k.rows)
            .max()
            .unwrap_or(1)
    }
}

impl fmt::Debug for NtPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<usize> = self.kernels.iter().flatten().map(|k| k.rows).collect();
        f.debug_struct("NtPlan")
            .field("m", &self.m)
            .field("n", &self.n)
            .field("k", &self.k)
            .field("level", &self.level)
            .field("blocks", &self.blocks)
            .field("rows", &rows)
            .finish()
    }
}

/// Packing scratch reused across calls by one caller.
#[derive(Debug, Default, Clone)]
pub struct GemmScratch {
    pub a: PackedBuffer,
    pub b: PackedBuffer,
}

impl GemmScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone, Copy)]
enum BSource {
    Pack { b: *const f32, ldb: usize },
    Prepacked(*const f32),
}

/// Blocked NN GEMM: `C <- alpha * A * B + beta * C`.
///
/// Loops run N panels outermost, K panels next and M panels innermost.
/// B is packed once per (N, K) panel, A once per (K, M) panel when the
/// plan asks for it, and C is scaled by beta only while the first K panel
/// is processed.
///
/// # Safety
/// - `a` valid for `plan.m` rows of `plan.k` floats at stride `lda`
/// - `b` valid for `plan.k` rows of `plan.n` floats at stride `ldb`
/// - `c` valid for `plan.m` rows of `plan.n` floats at stride `ldc`
#[allow(clippy::too_many_arguments)]
pub unsafe fn gemm_nn(
    plan: &GemmPlan,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    ldb: usize,
    beta: f32,
    c: *mut f32,
    ldc: usize,
    scratch: &mut GemmScratch,
) {
    run_nn(
        plan,
        alpha,
        a,
        lda,
        BSource::Pack { b, ldb },
        beta,
        c,
        ldc,
        scratch,
    );
}

/// Blocked NN GEMM against a B already laid out by [`reorder_b`].
///
/// # Safety
/// As [`gemm_nn`], and `packed_b` must come from `reorder_b` with a plan
/// of identical dimensions, level and tile shape.
#[allow(clippy::too_many_arguments)]
pub unsafe fn gemm_nn_prepacked(
    plan: &GemmPlan,
    alpha: f32,
    a: *const f32,
    lda: usize,
    packed_b: *const f32,
    beta: f32,
    c: *mut f32,
    ldc: usize,
    scratch: &mut GemmScratch,
) {
    run_nn(
        plan,
        alpha,
        a,
        lda,
        BSource::Prepacked(packed_b),
        beta,
        c,
        ldc,
        scratch,
    );
}

/// Pack all of B in the block order [`gemm_nn_prepacked`] replays.
///
/// # Safety
/// - `b` valid for `plan.k` rows of `plan.n` floats at stride `ldb`
/// - `dst` valid for writing `plan.prepacked_b_len()` floats
pub unsafe fn reorder_b(plan: &GemmPlan, b: *const f32, ldb: usize, dst: *mut f32) {
    let cols = plan.shape.cols();
    for (j0, nc) in BlockIterator::new(plan.n, plan.blocks.nc) {
        for (p0, kc) in BlockIterator::new(plan.k, plan.blocks.kc) {
            let offset = plan.prepacked_offset(j0, p0, nc);
            (plan.pack_b)(b.add(p0 * ldb + j0), ldb, kc, nc, cols, dst.add(offset));
        }
    }
}

#[allow(clippy::too_many_arguments)]
unsafe fn run_nn(
    plan: &GemmPlan,
    alpha: f32,
    a: *const f32,
    lda: usize,
    source: BSource,
    beta: f32,
    c: *mut f32,
    ldc: usize,
    scratch: &mut GemmScratch,
) {
    let (m, n, k) = (plan.m, plan.n, plan.k);
    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        (plan.scale_c)(m, n, beta, c, ldc);
        return;
    }

    let rows = plan.shape.rows;
    let cols = plan.shape.cols();
    scratch.a.reserve(plan.packed_a_len());
    if let BSource::Pack { .. } = source {
        scratch.b.reserve(plan.packed_b_len());
    }

    for (j0, nc) in BlockIterator::new(n, plan.blocks.nc) {
        for (p0, kc) in BlockIterator::new(k, plan.blocks.kc) {
            let pb = match source {
                BSource::Pack { b, ldb } => {
                    let dst = scratch.b.as_mut_ptr();
                    (plan.pack_b)(b.add(p0 * ldb + j0), ldb, kc, nc, cols, dst);
                    dst as *const f32
                }
                BSource::Prepacked(packed) => packed.add(plan.prepacked_offset(j0, p0, nc)),
            };

            for (i0, mc) in BlockIterator::new(m, plan.blocks.mc) {
                let pc = c.add(i0 * ldc + j0);
                if p0 == 0 {
                    (plan.scale_c)(mc, nc, beta, pc, ldc);
                }

                let (pa, plda) = match plan.pack_a {
                    Some(pack) => {
                        let dst = scratch.a.as_mut_ptr();
                        pack(a.add(i0 * lda + p0), lda, mc, kc, rows, dst);
                        (dst as *const f32, 1)
                    }
                    None => (a.add(i0 * lda + p0), lda),
                };

                macro_kernel_nn(plan, mc, nc, kc, alpha, pa, plda, pb, pc, ldc);
            }
        }
    }
}

/// One (mc x nc x kc) block: full tiles, then the ragged column panel,
/// each with the ragged row group last.
#[allow(clippy::too_many_arguments)]
unsafe fn macro_kernel_nn(
    plan: &GemmPlan,
    mc: usize,
    nc: usize,
    kc: usize,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    c: *mut f32,
    ldc: usize,
) {
    let rows = plan.shape.rows;
    let cols = plan.shape.cols();
    let ks = &plan.kernels;
    let ma = align_lo(mc, rows);
    let na = align_lo(nc, cols);
    // Packed A groups are `rows * kc` apart; strided rows are `lda` apart.
    let a_step = if lda == 1 { kc } else { lda };

    let mut j = 0;
    while j < nc {
        let pb = b.add(j * kc);
        let pc = c.add(j);
        let (main, tail, masks) = if j < na {
            (ks.main_main, ks.tail_main, &ks.main_masks)
        } else {
            (ks.main_tail, ks.tail_tail, &ks.tail_masks)
        };

        let mut i = 0;
        while i < ma {
            main(kc, alpha, a.add(i * a_step), lda, pb, cols, pc.add(i * ldc), ldc, masks);
            i += rows;
        }
        if i < mc {
            debug_assert!(tail.is_some(), "plan has no kernel for ragged rows");
            if let Some(tail) = tail {
                tail(kc, alpha, a.add(i * a_step), lda, pb, cols, pc.add(i * ldc), ldc, masks);
            }
        }

        j += cols;
    }
}

/// Blocked NT GEMM: `C <- alpha * A * B^T + beta * C` where B is stored
/// as `plan.n` rows of length `plan.k`.
///
/// # Safety
/// - `a` valid for `plan.m` rows of `plan.k` floats at stride `lda`
/// - `b` valid for `plan.n` rows of `plan.k` floats at stride `ldb`
/// - `c` valid for `plan.m` rows of `plan.n` floats at stride `ldc`
#[allow(clippy::too_many_arguments)]
pub unsafe fn gemm_nt(
    plan: &NtPlan,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    ldb: usize,
    beta: f32,
    c: *mut f32,
    ldc: usize,
) {
    let (m, n, k) = (plan.m, plan.n, plan.k);
    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        (plan.scale_c)(m, n, beta, c, ldc);
        return;
    }

    for (j0, nc) in BlockIterator::new(n, plan.blocks.nc) {
        for (p0, kc) in BlockIterator::new(k, plan.blocks.kc) {
            for (i0, mc) in BlockIterator::new(m, plan.blocks.mc) {
                let pc = c.add(i0 * ldc + j0);
                if p0 == 0 {
                    (plan.scale_c)(mc, nc, beta, pc, ldc);
                }
                macro_kernel_nt(
                    plan,
                    mc,
                    nc,
                    kc,
                    alpha,
                    a.add(i0 * lda + p0),
                    lda,
                    b.add(j0 * ldb + p0),
                    ldb,
                    pc,
                    ldc,
                );
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
unsafe fn macro_kernel_nt(
    plan: &NtPlan,
    mc: usize,
    nc: usize,
    kc: usize,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    ldb: usize,
    c: *mut f32,
    ldc: usize,
) {
    let na = align_lo(nc, 4);
    let mut i = 0;
    for group in plan.kernels.iter().flatten() {
        while mc - i >= group.rows {
            let pa = a.add(i * lda);
            let pc = c.add(i * ldc);
            let mut j = 0;
            while j < na {
                (group.x4)(kc, alpha, pa, lda, b.add(j * ldb), ldb, pc.add(j), ldc);
                j += 4;
            }
            while j < nc {
                (group.x1)(kc, alpha, pa, lda, b.add(j * ldb), ldb, pc.add(j), ldc);
                j += 1;
            }
            i += group.rows;
        }
    }
    debug_assert_eq!(i, mc, "NT plan lacks a single-row kernel");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSizes;
    use crate::simd::{KernelTable, PanelWidth};

    fn reference_nn(m: usize, n: usize, k: usize, a: &[f32], b: &[f32]) -> Vec<f32> {
        let mut c = vec![0.0f32; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0f64;
                for p in 0..k {
                    sum += a[i * k + p] as f64 * b[p * n + j] as f64;
                }
                c[i * n + j] = sum as f32;
            }
        }
        c
    }

    fn assert_close(actual: &[f32], expected: &[f32], k: usize) {
        assert_eq!(actual.len(), expected.len());
        let tol = 1e-5 * (k as f32 + 1.0);
        for (i, (x, y)) in actual.iter().zip(expected).enumerate() {
            assert!((x - y).abs() <= tol * y.abs().max(1.0), "index {i}: {x} vs {y}");
        }
    }

    fn data(len: usize, seed: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (((i * 7 + seed * 13) % 17) as f32 - 8.0) / 8.0)
            .collect()
    }

    fn scalar() -> KernelTable {
        KernelTable::for_level(SimdLevel::Scalar).unwrap()
    }

    #[test]
    fn test_gemm_nn_multiple_blocks() {
        // Tiny caches force several N, K and M panels.
        let cache = CacheSizes::new(256, 1024, 1024);
        let (m, n, k) = (23, 19, 37);
        let a = data(m * k, 1);
        let b = data(k * n, 2);
        let mut c = vec![0.0f32; m * n];

        let table = scalar();
        let plan = table.plan_nn_with(m, n, k, &cache);
        assert!(plan.blocks.kc < k && plan.blocks.mc < m && plan.blocks.nc < n);

        let mut scratch = GemmScratch::new();
        unsafe {
            gemm_nn(
                &plan,
                1.0,
                a.as_ptr(),
                k,
                b.as_ptr(),
                n,
                0.0,
                c.as_mut_ptr(),
                n,
                &mut scratch,
            );
        }
        assert_close(&c, &reference_nn(m, n, k, &a, &b), k);
    }

    #[test]
    fn test_gemm_nn_k_zero_scales_only() {
        let table = scalar();
        let plan = table.plan_nn_with(2, 3, 0, &CacheSizes::default());
        let mut c = vec![2.0f32; 6];
        let mut scratch = GemmScratch::new();
        unsafe {
            gemm_nn(
                &plan,
                1.0,
                std::ptr::null(),
                1,
                std::ptr::null(),
                3,
                0.5,
                c.as_mut_ptr(),
                3,
                &mut scratch,
            );
        }
        assert_eq!(c, vec![1.0; 6]);
    }

    #[test]
    fn test_prepacked_offsets_cover_buffer() {
        let cache = CacheSizes::new(256, 1024, 4096);
        let table = scalar();
        let plan = table.plan_prepacked_with(9, 29, 41, PanelWidth::Auto, &cache);
        let cols = plan.shape.cols();

        let mut end = 0;
        for (j0, nc) in BlockIterator::new(plan.n, plan.blocks.nc) {
            for (p0, kc) in BlockIterator::new(plan.k, plan.blocks.kc) {
                let offset = plan.prepacked_offset(j0, p0, nc);
                assert_eq!(offset, end);
                end += kc * align_hi(nc, cols);
            }
        }
        assert_eq!(end, plan.prepacked_b_len());
    }

    #[test]
    fn test_gemm_nn_prepacked_matches_repack() {
        let cache = CacheSizes::new(512, 2048, 8192);
        let (m, n, k) = (11, 26, 30);
        let a = data(m * k, 3);
        let b = data(k * n, 4);

        let table = scalar();
        let plan = table.plan_prepacked_with(m, n, k, PanelWidth::Auto, &cache);
        let mut packed = vec![0.0f32; plan.prepacked_b_len()];
        unsafe { reorder_b(&plan, b.as_ptr(), n, packed.as_mut_ptr()) };

        let mut scratch = GemmScratch::new();
        let mut prepacked = vec![0.0f32; m * n];
        let mut repacked = vec![0.0f32; m * n];
        unsafe {
            gemm_nn_prepacked(
                &plan,
                1.0,
                a.as_ptr(),
                k,
                packed.as_ptr(),
                0.0,
                prepacked.as_mut_ptr(),
                n,
                &mut scratch,
            );
            gemm_nn(
                &plan,
                1.0,
                a.as_ptr(),
                k,
                b.as_ptr(),
                n,
                0.0,
                repacked.as_mut_ptr(),
                n,
                &mut scratch,
            );
        }
        assert_eq!(prepacked, repacked);
    }

    #[test]
    fn test_gemm_nt_multiple_blocks() {
        let cache = CacheSizes::new(128, 512, 2048);
        let (m, n, k) = (10, 9, 45);
        let a = data(m * k, 5);
        let bt = data(n * k, 6);

        let table = scalar();
        let plan = table.plan_nt_with(m, n, k, &cache);
        let mut c = vec![1.0f32; m * n];
        unsafe {
            gemm_nt(
                &plan,
                2.0,
                a.as_ptr(),
                k,
                bt.as_ptr(),
                k,
                1.0,
                c.as_mut_ptr(),
                n,
            );
        }

        let mut expected = vec![0.0f32; m * n];
        for i in 0..m {
            for j in 0..n {
                let dot: f64 = (0..k)
                    .map(|p| a[i * k + p] as f64 * bt[j * k + p] as f64)
                    .sum();
                expected[i * n + j] = 1.0 + 2.0 * dot as f32;
            }
        }
        assert_close(&c, &expected, k);
    }
}
