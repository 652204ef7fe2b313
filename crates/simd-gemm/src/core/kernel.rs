use std::fmt;

use super::mask::{ColumnMasks, LaneMask};
use super::vector::F32Vec;

/// Outer-product microkernel entry point.
///
/// Computes `C[r, c] += alpha * sum_p A[r, p] * B[p, c]` for one tile.
/// Row `r` of A starts at `a + r * lda`; per K step A advances by one
/// float, or by the tile height when `lda == 1` (A packed). B is a packed
/// panel advancing `sb` floats per K step. Stores go through `masks`.
pub type NnKernel = unsafe fn(
    k: usize,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    sb: usize,
    c: *mut f32,
    ldc: usize,
    masks: &ColumnMasks,
);

/// Dot-product microkernel entry point.
///
/// A holds `ROWS` rows and B holds `COLS` rows, both reduced along their
/// length `k`; `C[r, c] += alpha * dot(A[r], B[c])`.
pub type NtKernel = unsafe fn(
    k: usize,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    ldb: usize,
    c: *mut f32,
    ldc: usize,
);

/// `C <- beta * C` over an `m` x `n` block.
pub type ScaleCFn = unsafe fn(m: usize, n: usize, beta: f32, c: *mut f32, ldc: usize);

/// Pack `m` x `k` of A into `cell`-row groups.
pub type PackAFn =
    unsafe fn(a: *const f32, lda: usize, m: usize, k: usize, cell: usize, dst: *mut f32);

/// Pack `k` x `n` of B into `micro_n`-wide zero-padded panels.
pub type PackBFn =
    unsafe fn(b: *const f32, ldb: usize, k: usize, n: usize, micro_n: usize, dst: *mut f32);

/// The four NN kernels bound for one (M, N) and tile shape.
///
/// `main_tail` and `tail_tail` cover the ragged column panel with
/// `tail_masks`; the `tail_*` entries exist only when M is not a
/// multiple of the tile height.
#[derive(Clone, Copy)]
pub struct KernelSet {
    pub main_main: NnKernel,
    pub main_tail: NnKernel,
    pub tail_main: Option<NnKernel>,
    pub tail_tail: Option<NnKernel>,
    pub main_masks: ColumnMasks,
    pub tail_masks: ColumnMasks,
}

impl fmt::Debug for KernelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelSet")
            .field("tail_rows", &self.tail_main.is_some())
            .field("tail_cols", &self.tail_masks.width())
            .finish()
    }
}

/// Outer-product microkernel over a `ROWS` x `VECS * V::LANES` tile.
///
/// The accumulators live in `[[V; VECS]; ROWS]`, which the compiler keeps
/// in registers for the tile shapes the selector hands out.
///
/// # Safety
/// - `a` valid for `ROWS` rows of `k` floats (strided or packed, see [`NnKernel`])
/// - `b` valid for `k` steps of `VECS * V::LANES` floats at stride `sb`
/// - `c` valid for `ROWS` rows at stride `ldc` wherever `masks` is set
#[inline(always)]
#[allow(clippy::too_many_arguments)]
pub unsafe fn gemm_kernel_nn<V: F32Vec, const ROWS: usize, const VECS: usize>(
    k: usize,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    sb: usize,
    c: *mut f32,
    ldc: usize,
    masks: &ColumnMasks,
) {
    let mut acc = [[V::zero(); VECS]; ROWS];
    let sa = if lda == 1 { ROWS } else { 1 };

    let mut a = a;
    let mut b = b;
    for _ in 0..k {
        let mut bv = [V::zero(); VECS];
        for (v, slot) in bv.iter_mut().enumerate() {
            *slot = V::load(b.add(v * V::LANES));
        }
        for (r, row) in acc.iter_mut().enumerate() {
            let av = V::splat(*a.add(r * lda));
            for (cell, bv) in row.iter_mut().zip(bv.iter()) {
                *cell = av.mul_add(*bv, *cell);
            }
        }
        a = a.add(sa);
        b = b.add(sb);
    }

    let alpha = V::splat(alpha);
    for (r, row) in acc.iter().enumerate() {
        let pc = c.add(r * ldc);
        for (v, cell) in row.iter().enumerate() {
            add_product(pc.add(v * V::LANES), *cell, alpha, masks.get(v));
        }
    }
}

#[inline(always)]
unsafe fn add_product<V: F32Vec>(dst: *mut f32, value: V, alpha: V, mask: LaneMask) {
    if mask.is_full() {
        value.mul_add(alpha, V::load(dst)).store(dst);
    } else if !mask.is_empty() {
        value
            .mul_add(alpha, V::load_masked(dst, mask))
            .store_masked(dst, mask);
    }
}

/// Dot-product microkernel over a `ROWS` x `COLS` tile.
///
/// Full vectors are reduced first; a remainder shorter than one vector is
/// read with a tail mask ending exactly at `k` (re-reading already
/// consumed floats as masked-off lanes), or with a nose mask when `k`
/// itself is shorter than a vector. Each accumulator is collapsed with a
/// horizontal sum before being added into C.
///
/// # Safety
/// - `a` valid for `ROWS` rows of `k` floats at stride `lda`
/// - `b` valid for `COLS` rows of `k` floats at stride `ldb`
/// - `c` valid for `ROWS` rows of `COLS` floats at stride `ldc`
#[inline(always)]
#[allow(clippy::too_many_arguments)]
pub unsafe fn gemm_kernel_nt<V: F32Vec, const ROWS: usize, const COLS: usize>(
    k: usize,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    ldb: usize,
    c: *mut f32,
    ldc: usize,
) {
    let lanes = V::LANES;
    let mut acc = [[V::zero(); COLS]; ROWS];

    let ka = k - k % lanes;
    let mut p = 0;
    while p < ka {
        let mut av = [V::zero(); ROWS];
        for (r, slot) in av.iter_mut().enumerate() {
            *slot = V::load(a.add(r * lda + p));
        }
        for j in 0..COLS {
            let bv = V::load(b.add(j * ldb + p));
            for (row, ar) in acc.iter_mut().zip(av.iter()) {
                row[j] = ar.mul_add(bv, row[j]);
            }
        }
        p += lanes;
    }

    if ka < k {
        let rest = k - ka;
        let (offset, mask) = if k >= lanes {
            (k - lanes, LaneMask::tail(lanes, rest))
        } else {
            (ka, LaneMask::nose(lanes, rest))
        };
        let mut av = [V::zero(); ROWS];
        for (r, slot) in av.iter_mut().enumerate() {
            *slot = V::load_masked(a.add(r * lda + offset), mask);
        }
        for j in 0..COLS {
            let bv = V::load_masked(b.add(j * ldb + offset), mask);
            for (row, ar) in acc.iter_mut().zip(av.iter()) {
                row[j] = ar.mul_add(bv, row[j]);
            }
        }
    }

    for (r, row) in acc.iter().enumerate() {
        let pc = c.add(r * ldc);
        for (j, sum) in row.iter().enumerate() {
            *pc.add(j) += alpha * sum.reduce_add();
        }
    }
}
