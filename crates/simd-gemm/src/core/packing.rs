use super::mask::LaneMask;
use super::tiling::align_hi;
use super::vector::F32Vec;

/// Pack a panel of row-major A into `cell`-row groups.
///
/// Within a group the values of one K column are contiguous across the
/// group's rows, which is the order the outer-product microkernel
/// consumes them in. A trailing group with fewer than `cell` rows keeps
/// its true height, so group `g` always starts at `g * cell * k`.
///
/// # Layout
/// ```text
/// Original A (row-major, m=5, k=3, cell=2):
/// [ a00 a01 a02 ]
/// [ a10 a11 a12 ]
/// [ a20 a21 a22 ]
/// [ a30 a31 a32 ]
/// [ a40 a41 a42 ]
///
/// Packed:
/// Group 0 (rows 0-1): a00 a10 | a01 a11 | a02 a12
/// Group 1 (rows 2-3): a20 a30 | a21 a31 | a22 a32
/// Group 2 (row 4):    a40     | a41     | a42
/// ```
///
/// # Safety
/// - `a` must be valid for reading `m` rows of `k` floats at stride `lda`
/// - `dst` must be valid for writing [`packed_a_size`] floats
pub unsafe fn pack_a(
    a: *const f32,
    lda: usize,
    m: usize,
    k: usize,
    cell: usize,
    dst: *mut f32,
) {
    let mut dst = dst;
    for i in (0..m).step_by(cell) {
        let rows = cell.min(m - i);
        let src = a.add(i * lda);
        for p in 0..k {
            for r in 0..rows {
                *dst.add(r) = *src.add(r * lda + p);
            }
            dst = dst.add(rows);
        }
    }
}

/// Inverse of [`pack_a`]: scatter a packed panel back to row-major.
///
/// # Safety
/// - `packed` must hold a panel produced by `pack_a` with the same shape
/// - `dst` must be valid for writing `m` rows of `k` floats at stride `ldd`
pub unsafe fn unpack_a(
    packed: *const f32,
    m: usize,
    k: usize,
    cell: usize,
    dst: *mut f32,
    ldd: usize,
) {
    let mut src = packed;
    for i in (0..m).step_by(cell) {
        let rows = cell.min(m - i);
        let out = dst.add(i * ldd);
        for p in 0..k {
            for r in 0..rows {
                *out.add(r * ldd + p) = *src.add(r);
            }
            src = src.add(rows);
        }
    }
}

/// Pack a block of row-major B into `micro_n`-wide column panels.
///
/// Each panel holds `k` rows of `micro_n` floats; columns past the right
/// edge are zero-filled so the microkernel never branches on width.
/// Panel `j` starts at `j * micro_n * k`.
///
/// ```text
/// Original B (k=2, n=5, micro_n=4):
/// [ b00 b01 b02 b03 b04 ]
/// [ b10 b11 b12 b13 b14 ]
///
/// Packed:
/// Panel 0: b00 b01 b02 b03 | b10 b11 b12 b13
/// Panel 1: b04 0   0   0   | b14 0   0   0
/// ```
///
/// # Safety
/// - `b` must be valid for reading `k` rows of `n` floats at stride `ldb`
/// - `dst` must be valid for writing [`packed_b_size`] floats
/// - `micro_n` must be a multiple of `V::LANES`
#[inline(always)]
pub unsafe fn pack_b<V: F32Vec>(
    b: *const f32,
    ldb: usize,
    k: usize,
    n: usize,
    micro_n: usize,
    dst: *mut f32,
) {
    debug_assert!(micro_n.is_multiple_of(V::LANES));

    let mut dst = dst;
    for j in (0..n).step_by(micro_n) {
        let cols = micro_n.min(n - j);
        let src = b.add(j);
        if cols == micro_n {
            for p in 0..k {
                let row = src.add(p * ldb);
                for v in (0..micro_n).step_by(V::LANES) {
                    V::load(row.add(v)).store(dst.add(v));
                }
                dst = dst.add(micro_n);
            }
        } else {
            for p in 0..k {
                let row = src.add(p * ldb);
                for v in (0..micro_n).step_by(V::LANES) {
                    let mask = LaneMask::nose(V::LANES, cols.saturating_sub(v));
                    V::load_masked(row.add(v), mask).store(dst.add(v));
                }
                dst = dst.add(micro_n);
            }
        }
    }
}

/// Inverse of [`pack_b`], dropping the zero padding.
///
/// # Safety
/// - `packed` must hold panels produced by `pack_b` with the same shape
/// - `dst` must be valid for writing `k` rows of `n` floats at stride `ldd`
pub unsafe fn unpack_b(
    packed: *const f32,
    k: usize,
    n: usize,
    micro_n: usize,
    dst: *mut f32,
    ldd: usize,
) {
    let mut src = packed;
    for j in (0..n).step_by(micro_n) {
        let cols = micro_n.min(n - j);
        for p in 0..k {
            std::ptr::copy_nonoverlapping(src, dst.add(p * ldd + j), cols);
            src = src.add(micro_n);
        }
    }
}

/// Floats needed to pack an `m` x `k` panel of A.
pub fn packed_a_size(m: usize, k: usize) -> usize {
    m * k
}

/// Floats needed to pack a `k` x `n` block of B into `micro_n` panels.
pub fn packed_b_size(k: usize, n: usize, micro_n: usize) -> usize {
    align_hi(n, micro_n) * k
}
