//! Kernel selection: tile shapes, packing heuristics and plan binding.
//!
//! Selection depends only on (M, N, K), the vector width and the register
//! count of the level, never on matrix contents.

use std::fmt;

use super::detect::SimdLevel;
use super::kernels::Isa;
use crate::config::CacheSizes;
use crate::core::{
    pack_a, BlockSizes, ColumnMasks, F32Vec, GemmPlan, KernelSet, NtPlan, NtRowKernels,
    NT_MAX_ROW_KERNELS,
};

/// `M * N * K` above which packing A is worth its cost.
pub const PACK_A_THRESHOLD: u128 = 700 * 700 * 700;

/// Register tile of an outer-product microkernel: `rows` x `vecs` vectors
/// of `lanes` floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileShape {
    pub rows: usize,
    pub vecs: usize,
    pub lanes: usize,
}

impl TileShape {
    pub const fn new(rows: usize, vecs: usize, lanes: usize) -> Self {
        Self { rows, vecs, lanes }
    }

    /// Tile width in floats.
    #[inline]
    pub const fn cols(&self) -> usize {
        self.vecs * self.lanes
    }

    /// Accumulators plus one row of B operands.
    pub const fn registers_needed(&self) -> usize {
        self.rows * self.vecs + self.vecs
    }

    pub const fn fits(&self, registers: usize) -> bool {
        self.registers_needed() <= registers
    }
}

impl fmt::Display for TileShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols())
    }
}

/// Panel width family for prepacked plans, in vectors per tile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PanelWidth {
    /// Let the selector decide from (M, N, K).
    #[default]
    Auto,
    V1,
    V2,
    V3,
    V4,
}

/// Tile for the always-repack NN path.
///
/// Tall tiles (two vectors wide) win when K dominates N or when N dwarfs
/// M; otherwise wide tiles (three vectors) cut the per-call packing of B.
pub fn select_nn_shape(m: usize, n: usize, k: usize, registers: usize, lanes: usize) -> TileShape {
    let large_file = registers >= 32;

    if m == 4 {
        return TileShape::new(4, 3, lanes);
    }
    if large_file && m == 16 {
        return TileShape::new(8, 3, lanes);
    }

    let tall = n < k || m.saturating_mul(8) < n;
    match (tall, large_file) {
        (true, true) => TileShape::new(14, 2, lanes),
        (true, false) => TileShape::new(6, 2, lanes),
        (false, true) => TileShape::new(9, 3, lanes),
        (false, false) => TileShape::new(4, 3, lanes),
    }
}

/// Tile and resolved width for the prepacked path.
///
/// A requested width is honored unless the level cannot hold it, in
/// which case the next narrower family is used.
pub fn select_prepacked_shape(
    m: usize,
    n: usize,
    width: PanelWidth,
    registers: usize,
    lanes: usize,
) -> (TileShape, PanelWidth) {
    let large_file = registers >= 32;
    let l = lanes;

    let v4 = large_file
        && (width == PanelWidth::V4 || (width == PanelWidth::Auto && (m == 6 || n == 4 * l)));
    if v4 {
        return (TileShape::new(6, 4, lanes), PanelWidth::V4);
    }

    let auto_v3 = width == PanelWidth::Auto
        && n > 2 * l
        && (matches!(m, 4 | 8 | 9 | 16 | 18 | 32)
            || n == 3 * l
            || n == 6 * l
            || (m < 14 && m != 6 && m != 12));
    if width == PanelWidth::V3 || width == PanelWidth::V4 || auto_v3 {
        let rows = if !large_file || m == 4 {
            4
        } else if matches!(m, 8 | 16 | 32) {
            8
        } else {
            9
        };
        return (TileShape::new(rows, 3, lanes), PanelWidth::V3);
    }

    if width == PanelWidth::V2 || (width == PanelWidth::Auto && n > l) {
        let rows = if !large_file || m <= 6 {
            6
        } else if m <= 12 || m == 24 {
            12
        } else {
            14
        };
        return (TileShape::new(rows, 2, lanes), PanelWidth::V2);
    }

    let rows = if large_file { 14 } else { 6 };
    (TileShape::new(rows, 1, lanes), PanelWidth::V1)
}

/// Whether packing A amortizes for this tile and problem size.
pub fn should_pack_a(shape: TileShape, m: usize, n: usize, k: usize) -> bool {
    shape.rows > 6 && (m as u128) * (n as u128) * (k as u128) > PACK_A_THRESHOLD
}

/// Row counts of the NT kernel family, largest first.
pub fn nt_row_counts(registers: usize) -> &'static [usize] {
    if registers >= 32 {
        &[6, 3, 2, 1]
    } else {
        &[3, 2, 1]
    }
}

/// Bind the four NN kernels for `shape` against an `m` x `n` output.
pub fn kernel_set<I: Isa>(shape: TileShape, m: usize, n: usize) -> KernelSet {
    let lanes = shape.lanes;
    let cols = shape.cols();
    let tail_cols = n % cols;
    let tail_vecs = if tail_cols == 0 {
        shape.vecs
    } else {
        tail_cols.div_ceil(lanes)
    };
    let tail_rows = m % shape.rows;

    KernelSet {
        main_main: I::nn_kernel(shape.rows, shape.vecs),
        main_tail: I::nn_kernel(shape.rows, tail_vecs),
        tail_main: (tail_rows > 0).then(|| I::nn_kernel(tail_rows, shape.vecs)),
        tail_tail: (tail_rows > 0).then(|| I::nn_kernel(tail_rows, tail_vecs)),
        main_masks: ColumnMasks::full(lanes),
        tail_masks: if tail_cols == 0 {
            ColumnMasks::full(lanes)
        } else {
            ColumnMasks::for_width(lanes, tail_cols)
        },
    }
}

fn bind_plan<I: Isa>(
    m: usize,
    n: usize,
    k: usize,
    shape: TileShape,
    cache: &CacheSizes,
) -> GemmPlan {
    debug_assert!(shape.fits(I::LEVEL.registers()), "{shape} spills on {}", I::LEVEL);

    let blocks = BlockSizes::for_nn(m, n, k, shape, cache);
    debug_assert!(
        blocks.validate(shape.rows, shape.cols()).is_ok(),
        "{blocks:?} misaligned with tile {shape}"
    );
    let plan = GemmPlan {
        m,
        n,
        k,
        level: I::LEVEL,
        shape,
        blocks,
        kernels: kernel_set::<I>(shape, m, n),
        pack_a: should_pack_a(shape, m, n, k).then_some(pack_a as crate::core::PackAFn),
        pack_b: I::pack_b(),
        scale_c: I::scale_c(),
    };
    log::debug!(
        "gemm plan {m}x{n}x{k} on {}: tile {shape}, blocks {:?}, pack A {}",
        I::LEVEL,
        blocks,
        plan.pack_a.is_some()
    );
    plan
}

/// Plan an NN GEMM on level `I`, or on a narrower level when N is too
/// small to fill half a vector.
pub fn plan_nn<I: Isa>(m: usize, n: usize, k: usize, cache: &CacheSizes) -> GemmPlan {
    let lanes = <I::Vector as F32Vec>::LANES;
    if 2 * n <= lanes && I::LEVEL != SimdLevel::Scalar {
        log::debug!("n={n} too narrow for {}, using {}", I::LEVEL, I::LEVEL.narrower());
        return plan_nn::<I::Narrower>(m, n, k, cache);
    }

    let shape = select_nn_shape(m, n, k, I::LEVEL.registers(), lanes);
    bind_plan::<I>(m, n, k, shape, cache)
}

/// Plan a prepacked NN GEMM on level `I`, with the same narrow fallback
/// as [`plan_nn`].
pub fn plan_prepacked<I: Isa>(
    m: usize,
    n: usize,
    k: usize,
    width: PanelWidth,
    cache: &CacheSizes,
) -> GemmPlan {
    let lanes = <I::Vector as F32Vec>::LANES;
    if 2 * n <= lanes && I::LEVEL != SimdLevel::Scalar {
        log::debug!("n={n} too narrow for {}, using {}", I::LEVEL, I::LEVEL.narrower());
        return plan_prepacked::<I::Narrower>(m, n, k, width, cache);
    }

    let (shape, _) = select_prepacked_shape(m, n, width, I::LEVEL.registers(), lanes);
    bind_plan::<I>(m, n, k, shape, cache)
}

/// Plan an NT GEMM on level `I`, or on a narrower level when K is shorter
/// than one vector.
pub fn plan_nt<I: Isa>(m: usize, n: usize, k: usize, cache: &CacheSizes) -> NtPlan {
    let lanes = <I::Vector as F32Vec>::LANES;
    if k < lanes && I::LEVEL != SimdLevel::Scalar {
        log::debug!("k={k} shorter than one {} vector, using {}", I::LEVEL, I::LEVEL.narrower());
        return plan_nt::<I::Narrower>(m, n, k, cache);
    }

    let counts = nt_row_counts(I::LEVEL.registers());
    let mut kernels = [None; NT_MAX_ROW_KERNELS];
    for (slot, &rows) in kernels.iter_mut().zip(counts) {
        *slot = Some(NtRowKernels {
            rows,
            x4: I::nt_kernel(rows, 4),
            x1: I::nt_kernel(rows, 1),
        });
    }

    let blocks = BlockSizes::for_nt(m, n, k, counts[0], lanes, cache);
    debug_assert!(
        blocks.validate(counts[0], 4).is_ok(),
        "{blocks:?} misaligned with {} NT rows",
        counts[0]
    );
    log::debug!("gemm nt plan {m}x{n}x{k} on {}: blocks {:?}", I::LEVEL, blocks);
    NtPlan {
        m,
        n,
        k,
        level: I::LEVEL,
        blocks,
        kernels,
        scale_c: I::scale_c(),
    }
}
