use crate::config::CacheSizes;
use crate::simd::TileShape;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Rounds `value` down to a multiple of `align`.
#[inline]
pub const fn align_lo(value: usize, align: usize) -> usize {
    value / align * align
}

/// Rounds `value` up to a multiple of `align`.
#[inline]
pub const fn align_hi(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// Cache-blocking panel sizes for one GEMM call.
///
/// `kc` is sized against the innermost cache, `mc` against the middle one
/// and `nc` against the outer one. `mc` is always a multiple of the tile
/// rows and `nc` a multiple of the tile columns, so ragged tiles only occur
/// in the last panel of each dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSizes {
    /// Panel height along M.
    pub mc: usize,
    /// Panel width along N.
    pub nc: usize,
    /// Panel depth along K.
    pub kc: usize,
}

impl BlockSizes {
    /// Create block sizes directly.
    pub const fn new(mc: usize, nc: usize, kc: usize) -> Self {
        Self { mc, nc, kc }
    }

    /// Block sizes for the outer-product (NN) driver.
    pub fn for_nn(m: usize, n: usize, k: usize, shape: TileShape, cache: &CacheSizes) -> Self {
        let (l1, l2, l3) = if n > 4096 {
            (cache.l2, cache.l3, cache.l3)
        } else {
            (cache.l1, cache.l2, cache.l3)
        };
        let rows = shape.rows;
        let cols = shape.cols();

        let kc = (l1 / F32_BYTES / cols).max(1).min(k.max(1));
        let mc = align_lo(l2 / F32_BYTES / kc, rows)
            .max(rows)
            .min(align_hi(m.max(1), rows));
        let nc = align_lo(l3 / F32_BYTES / kc, cols)
            .max(cols)
            .min(align_hi(n.max(1), cols));

        Self { mc, nc, kc }
    }

    /// Block sizes for the dot-product (NT) driver.
    ///
    /// `kc` stays a multiple of the vector width so that only the last K
    /// panel needs a masked remainder.
    pub fn for_nt(
        m: usize,
        n: usize,
        k: usize,
        rows: usize,
        lanes: usize,
        cache: &CacheSizes,
    ) -> Self {
        const COLS: usize = 4;

        let kc = align_lo(cache.l1 / F32_BYTES / (rows + COLS), lanes)
            .max(lanes)
            .min(k.max(1));
        let mc = align_lo(cache.l2 / F32_BYTES / kc, rows)
            .max(rows)
            .min(align_hi(m.max(1), rows));
        let nc = align_lo(cache.l3 / F32_BYTES / kc, COLS)
            .max(COLS)
            .min(align_hi(n.max(1), COLS));

        Self { mc, nc, kc }
    }

    /// Check that the panel sizes line up with a tile of `rows` x `cols`.
    pub fn validate(&self, rows: usize, cols: usize) -> Result<(), &'static str> {
        if rows == 0 || cols == 0 {
            return Err("tile rows and cols must be non-zero");
        }
        if self.mc == 0 || self.nc == 0 || self.kc == 0 {
            return Err("mc, nc, and kc must be non-zero");
        }
        if !self.mc.is_multiple_of(rows) {
            return Err("mc must be divisible by tile rows");
        }
        if !self.nc.is_multiple_of(cols) {
            return Err("nc must be divisible by tile cols");
        }
        Ok(())
    }
}

/// Iterator over blocks for the outer loops.
pub struct BlockIterator {
    total: usize,
    block_size: usize,
    current: usize,
}

impl BlockIterator {
    pub fn new(total: usize, block_size: usize) -> Self {
        debug_assert!(block_size > 0);
        Self {
            total,
            block_size,
            current: 0,
        }
    }
}

impl Iterator for BlockIterator {
    /// (start, length) of each block
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.total {
            return None;
        }

        let start = self.current;
        let len = (self.total - start).min(self.block_size);
        self.current += len;

        Some((start, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x86_caches() -> CacheSizes {
        CacheSizes::new(32 * 1024, 256 * 1024, 2 * 1024 * 1024)
    }

    #[test]
    fn test_align() {
        assert_eq!(align_lo(17, 8), 16);
        assert_eq!(align_lo(16, 8), 16);
        assert_eq!(align_hi(17, 8), 24);
        assert_eq!(align_hi(16, 8), 16);
        assert_eq!(align_hi(0, 6), 0);
        assert_eq!(align_lo(13, 6), 12);
    }

    #[test]
    fn test_block_iterator() {
        let blocks: Vec<_> = BlockIterator::new(10, 3).collect();
        assert_eq!(blocks, vec![(0, 3), (3, 3), (6, 3), (9, 1)]);
    }

    #[test]
    fn test_block_iterator_exact() {
        let blocks: Vec<_> = BlockIterator::new(9, 3).collect();
        assert_eq!(blocks, vec![(0, 3), (3, 3), (6, 3)]);
    }

    #[test]
    fn test_block_iterator_empty() {
        assert!(BlockIterator::new(0, 3).next().is_none());
    }

    #[test]
    fn test_nn_blocks_large_problem() {
        // 9x48 tile on a 32K/256K/2M hierarchy.
        let shape = TileShape::new(9, 3, 16);
        let blocks = BlockSizes::for_nn(4096, 4096, 4096, shape, &x86_caches());
        assert_eq!(blocks.kc, 170);
        assert_eq!(blocks.mc, 378);
        assert_eq!(blocks.nc, 3072);
        assert!(blocks.validate(shape.rows, shape.cols()).is_ok());
    }

    #[test]
    fn test_nn_blocks_clamped_to_problem() {
        let shape = TileShape::new(4, 3, 4);
        let blocks = BlockSizes::for_nn(5, 13, 3, shape, &x86_caches());
        assert_eq!(blocks.kc, 3);
        assert_eq!(blocks.mc, 8);
        assert_eq!(blocks.nc, 24);
        assert!(blocks.validate(4, 12).is_ok());
    }

    #[test]
    fn test_nn_blocks_wide_n_uses_outer_caches() {
        let shape = TileShape::new(6, 2, 8);
        let narrow = BlockSizes::for_nn(64, 4096, 4096, shape, &x86_caches());
        let wide = BlockSizes::for_nn(64, 4097, 4096, shape, &x86_caches());
        assert!(wide.kc > narrow.kc);
    }

    #[test]
    fn test_nn_blocks_tiny_caches_still_hold_a_tile() {
        let shape = TileShape::new(14, 2, 16);
        let blocks = BlockSizes::for_nn(100, 100, 100, shape, &CacheSizes::new(64, 64, 64));
        assert_eq!(blocks.kc, 1);
        assert_eq!(blocks.mc, 14);
        assert_eq!(blocks.nc, 32);
    }

    #[test]
    fn test_nt_blocks_kc_multiple_of_lanes() {
        let blocks = BlockSizes::for_nt(100, 100, 1000, 3, 8, &x86_caches());
        assert_eq!(blocks.kc % 8, 0);
        assert!(blocks.validate(3, 4).is_ok());

        let short = BlockSizes::for_nt(10, 10, 5, 3, 8, &x86_caches());
        assert_eq!(short.kc, 5);
    }

    #[test]
    fn test_validate_errors() {
        assert_eq!(
            BlockSizes::new(10, 24, 8).validate(4, 12),
            Err("mc must be divisible by tile rows")
        );
        assert_eq!(
            BlockSizes::new(8, 20, 8).validate(4, 12),
            Err("nc must be divisible by tile cols")
        );
        assert_eq!(
            BlockSizes::new(0, 24, 8).validate(4, 12),
            Err("mc, nc, and kc must be non-zero")
        );
        assert_eq!(
            BlockSizes::new(8, 24, 8).validate(0, 12),
            Err("tile rows and cols must be non-zero")
        );
    }
}
