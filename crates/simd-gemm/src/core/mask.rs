//! Partial-width lane masks for ragged column groups.
//!
//! A full-width vector access at the right edge of a matrix would touch
//! memory past the last valid column. The masks here let the kernels load
//! and store only the valid lanes: a "nose" mask keeps the leading lanes,
//! a "tail" mask keeps the trailing ones.

/// Maximum number of f32 lanes in any supported vector type.
pub const MAX_LANES: usize = 16;

/// Maximum number of vectors spanned by one microkernel tile row.
pub const MAX_TILE_VECS: usize = 4;

/// Per-lane validity mask for one vector of `lanes` f32 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneMask {
    bits: u32,
    lanes: u8,
}

impl LaneMask {
    /// All `lanes` lanes valid.
    pub const fn full(lanes: usize) -> Self {
        debug_assert!(lanes >= 1 && lanes <= MAX_LANES);
        Self {
            bits: low_bits(lanes),
            lanes: lanes as u8,
        }
    }

    /// No lane valid.
    pub const fn empty(lanes: usize) -> Self {
        Self {
            bits: 0,
            lanes: lanes as u8,
        }
    }

    /// Leading `valid` lanes set; saturates at a full mask.
    pub const fn nose(lanes: usize, valid: usize) -> Self {
        let valid = if valid > lanes { lanes } else { valid };
        Self {
            bits: low_bits(valid),
            lanes: lanes as u8,
        }
    }

    /// Trailing `valid` lanes set; saturates at a full mask.
    pub const fn tail(lanes: usize, valid: usize) -> Self {
        let valid = if valid > lanes { lanes } else { valid };
        Self {
            bits: low_bits(lanes) & !low_bits(lanes - valid),
            lanes: lanes as u8,
        }
    }

    /// Mask from raw lane bits; bit `i` is lane `i`.
    #[inline(always)]
    pub const fn from_bits(lanes: usize, bits: u32) -> Self {
        Self {
            bits: bits & low_bits(lanes),
            lanes: lanes as u8,
        }
    }

    #[inline(always)]
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    #[inline(always)]
    pub const fn lanes(&self) -> usize {
        self.lanes as usize
    }

    #[inline(always)]
    pub const fn is_full(&self) -> bool {
        self.bits == low_bits(self.lanes as usize)
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Whether lane `i` is valid.
    #[inline(always)]
    pub const fn lane(&self, i: usize) -> bool {
        (self.bits >> i) & 1 == 1
    }

    /// Number of valid lanes.
    pub const fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }
}

#[inline(always)]
const fn low_bits(n: usize) -> u32 {
    if n >= 32 {
        u32::MAX
    } else {
        (1u32 << n) - 1
    }
}

/// Store masks for each vector of one tile row.
///
/// For a tile whose last column group holds only `tail` valid columns,
/// vector `v` gets a nose mask covering `tail - v * lanes` lanes; vectors
/// that lie entirely past the edge get an empty mask and are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMasks {
    masks: [LaneMask; MAX_TILE_VECS],
}

impl ColumnMasks {
    /// Every vector fully valid.
    pub const fn full(lanes: usize) -> Self {
        Self {
            masks: [LaneMask::full(lanes); MAX_TILE_VECS],
        }
    }

    /// Masks for a tile row whose valid width is `cols`.
    pub fn for_width(lanes: usize, cols: usize) -> Self {
        let mut masks = [LaneMask::empty(lanes); MAX_TILE_VECS];
        for (v, mask) in masks.iter_mut().enumerate() {
            *mask = LaneMask::nose(lanes, cols.saturating_sub(v * lanes));
        }
        Self { masks }
    }

    #[inline(always)]
    pub fn get(&self, vector: usize) -> LaneMask {
        self.masks[vector]
    }

    /// Total valid columns covered.
    pub fn width(&self) -> usize {
        self.masks.iter().map(LaneMask::count).sum()
    }
}
