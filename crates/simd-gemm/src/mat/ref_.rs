//! Immutable matrix view.

use crate::api::check_operand;
use crate::error::{GemmError, Result};

use super::Mat;

/// Immutable view over row-major f32 data with a leading dimension.
///
/// This is a lightweight view type that can be copied freely.
///
/// ```
/// use simd_gemm::MatRef;
///
/// let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let a = MatRef::from_slice(&data, 2, 3);
///
/// assert_eq!(a.nrows(), 2);
/// assert_eq!(a.ncols(), 3);
/// assert_eq!(a.get(1, 0), 4.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MatRef<'a> {
    data: &'a [f32],
    nrows: usize,
    ncols: usize,
    stride: usize,
}

impl<'a> MatRef<'a> {
    /// View a dense slice of exactly `nrows * ncols` floats.
    ///
    /// # Panics
    ///
    /// Panics if the length does not match.
    pub fn from_slice(data: &'a [f32], nrows: usize, ncols: usize) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "data length {} != nrows {} * ncols {}",
            data.len(),
            nrows,
            ncols
        );
        Self {
            data,
            nrows,
            ncols,
            stride: ncols,
        }
    }

    /// View `nrows` rows of `ncols` floats spaced `stride` apart.
    pub fn with_stride(
        data: &'a [f32],
        nrows: usize,
        ncols: usize,
        stride: usize,
    ) -> Result<Self> {
        check_operand("view", data.len(), nrows, ncols, stride)?;
        Ok(Self {
            data,
            nrows,
            ncols,
            stride,
        })
    }

    /// Parts already checked by the caller.
    pub(super) fn from_parts(data: &'a [f32], nrows: usize, ncols: usize, stride: usize) -> Self {
        Self {
            data,
            nrows,
            ncols,
            stride,
        }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Leading dimension.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The backing slice, including any padding between rows.
    #[inline]
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    #[inline]
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        debug_assert!(i < self.nrows, "row index {} out of bounds {}", i, self.nrows);
        debug_assert!(j < self.ncols, "col index {} out of bounds {}", j, self.ncols);
        self.data[i * self.stride + j]
    }

    /// Row `i` without its padding.
    #[inline]
    pub fn row(&self, i: usize) -> &'a [f32] {
        debug_assert!(i < self.nrows, "row index {} out of bounds {}", i, self.nrows);
        let start = i * self.stride;
        &self.data[start..start + self.ncols]
    }

    /// Sub-view of `nrows` x `ncols` starting at (`row`, `col`).
    ///
    /// # Panics
    ///
    /// Panics if the block does not fit inside the view.
    pub fn submatrix(&self, row: usize, col: usize, nrows: usize, ncols: usize) -> Self {
        assert!(
            row + nrows <= self.nrows && col + ncols <= self.ncols,
            "block {}x{} at ({}, {}) exceeds {}x{}",
            nrows,
            ncols,
            row,
            col,
            self.nrows,
            self.ncols
        );
        let start = (row * self.stride + col).min(self.data.len());
        Self {
            data: &self.data[start..],
            nrows,
            ncols,
            stride: self.stride,
        }
    }

    /// Copy into a dense owned matrix.
    pub fn to_owned(&self) -> Mat {
        Mat::from_fn(self.nrows, self.ncols, |i, j| self.get(i, j))
    }

    /// `self * b`.
    pub fn matmul(&self, b: &MatRef<'_>) -> Result<Mat> {
        let mut c = Mat::zeros(self.nrows, b.ncols);
        c.as_mut().gemm_into(1.0, self, b, 0.0)?;
        Ok(c)
    }

    /// `self * bt^T`, with `bt` stored as `n` rows of `k`.
    pub fn matmul_nt(&self, bt: &MatRef<'_>) -> Result<Mat> {
        let mut c = Mat::zeros(self.nrows, bt.nrows);
        c.as_mut().gemm_nt_into(1.0, self, bt, 0.0)?;
        Ok(c)
    }
}

pub(super) fn inner_dim(a: &MatRef<'_>, b_rows: usize, b_cols: usize) -> Result<usize> {
    if a.ncols != b_rows {
        return Err(GemmError::DimensionMismatch(format!(
            "A is {}x{}, B is {}x{}",
            a.nrows, a.ncols, b_rows, b_cols
        )));
    }
    Ok(a.ncols)
}
