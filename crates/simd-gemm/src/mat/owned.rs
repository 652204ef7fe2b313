//! Owned matrix type.

use std::ops::{Index, IndexMut};

use super::{MatMut, MatRef};

/// Owned dense row-major matrix.
///
/// ```
/// use simd_gemm::Mat;
///
/// let zeros = Mat::zeros(3, 4);
/// let identity = Mat::identity(3);
/// let custom = Mat::from_fn(2, 2, |i, j| (i + j) as f32);
/// assert_eq!(custom[(1, 1)], 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Mat {
    data: Vec<f32>,
    nrows: usize,
    ncols: usize,
}

impl Mat {
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut mat = Self::zeros(n, n);
        for i in 0..n {
            mat.data[i * n + i] = 1.0;
        }
        mat
    }

    /// Create a matrix from a function of (row, col).
    pub fn from_fn<F>(nrows: usize, ncols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let data = (0..nrows * ncols)
            .map(|idx| f(idx / ncols, idx % ncols))
            .collect();
        Self { data, nrows, ncols }
    }

    /// Take ownership of dense row-major data.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != nrows * ncols`.
    pub fn from_vec(data: Vec<f32>, nrows: usize, ncols: usize) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "data length {} != nrows {} * ncols {}",
            data.len(),
            nrows,
            ncols
        );
        Self { data, nrows, ncols }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    pub fn as_ref(&self) -> MatRef<'_> {
        MatRef::from_slice(&self.data, self.nrows, self.ncols)
    }

    pub fn as_mut(&mut self) -> MatMut<'_> {
        MatMut::from_slice(&mut self.data, self.nrows, self.ncols)
    }
}

impl Index<(usize, usize)> for Mat {
    type Output = f32;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f32 {
        debug_assert!(i < self.nrows, "row index {} out of bounds {}", i, self.nrows);
        debug_assert!(j < self.ncols, "col index {} out of bounds {}", j, self.ncols);
        &self.data[i * self.ncols + j]
    }
}

impl IndexMut<(usize, usize)> for Mat {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f32 {
        debug_assert!(i < self.nrows, "row index {} out of bounds {}", i, self.nrows);
        debug_assert!(j < self.ncols, "col index {} out of bounds {}", j, self.ncols);
        &mut self.data[i * self.ncols + j]
    }
}
