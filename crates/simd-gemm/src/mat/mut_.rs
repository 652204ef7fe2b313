//! Mutable matrix view and the GEMM methods that write through it.

use crate::api::check_operand;
use crate::error::{GemmError, Result};
use crate::simd::kernel_table;

use super::ref_::inner_dim;
use super::MatRef;

/// Mutable view over row-major f32 data with a leading dimension.
#[derive(Debug)]
pub struct MatMut<'a> {
    data: &'a mut [f32],
    nrows: usize,
    ncols: usize,
    stride: usize,
}

impl<'a> MatMut<'a> {
    /// View a dense slice of exactly `nrows * ncols` floats.
    ///
    /// # Panics
    ///
    /// Panics if the length does not match.
    pub fn from_slice(data: &'a mut [f32], nrows: usize, ncols: usize) -> Self {
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
        data: &'a mut [f32],
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

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.data
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut f32 {
        self.data.as_mut_ptr()
    }

    /// Reborrow as an immutable view.
    pub fn rb(&self) -> MatRef<'_> {
        MatRef::from_parts(self.data, self.nrows, self.ncols, self.stride)
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        debug_assert!(i < self.nrows, "row index {} out of bounds {}", i, self.nrows);
        debug_assert!(j < self.ncols, "col index {} out of bounds {}", j, self.ncols);
        self.data[i * self.stride + j]
    }

    #[inline]
    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut f32 {
        debug_assert!(i < self.nrows, "row index {} out of bounds {}", i, self.nrows);
        debug_assert!(j < self.ncols, "col index {} out of bounds {}", j, self.ncols);
        &mut self.data[i * self.stride + j]
    }

    fn check_output(&self, rows: usize, cols: usize) -> Result<()> {
        if self.nrows != rows || self.ncols != cols {
            return Err(GemmError::DimensionMismatch(format!(
                "C is {}x{}, product is {}x{}",
                self.nrows, self.ncols, rows, cols
            )));
        }
        Ok(())
    }

    /// `self <- alpha * a * b + beta * self`.
    pub fn gemm_into(
        &mut self,
        alpha: f32,
        a: &MatRef<'_>,
        b: &MatRef<'_>,
        beta: f32,
    ) -> Result<()> {
        let k = inner_dim(a, b.nrows(), b.ncols())?;
        let (m, n) = (a.nrows(), b.ncols());
        self.check_output(m, n)?;

        unsafe {
            kernel_table().gemm_nn(
                m,
                n,
                k,
                alpha,
                a.as_ptr(),
                a.stride(),
                b.as_ptr(),
                b.stride(),
                beta,
                self.data.as_mut_ptr(),
                self.stride,
            );
        }
        Ok(())
    }

    /// `self <- alpha * a * bt^T + beta * self`, `bt` stored `n` x `k`.
    pub fn gemm_nt_into(
        &mut self,
        alpha: f32,
        a: &MatRef<'_>,
        bt: &MatRef<'_>,
        beta: f32,
    ) -> Result<()> {
        let k = inner_dim(a, bt.ncols(), bt.nrows())?;
        let (m, n) = (a.nrows(), bt.nrows());
        self.check_output(m, n)?;

        unsafe {
            kernel_table().gemm_nt(
                m,
                n,
                k,
                alpha,
                a.as_ptr(),
                a.stride(),
                bt.as_ptr(),
                bt.stride(),
                beta,
                self.data.as_mut_ptr(),
                self.stride,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmut_get_mut() {
        let mut data = vec![1.0f32, 2.0, 3.0, 4.0];
        let mut m = MatMut::from_slice(&mut data, 2, 2);
        *m.get_mut(1, 0) = 10.0;
        assert_eq!(m.get(1, 0), 10.0);
        assert_eq!(data[2], 10.0);
    }

    #[test]
    #[should_panic(expected = "data length")]
    fn test_matmut_size_mismatch() {
        let mut data = vec![1.0f32, 2.0];
        let _ = MatMut::from_slice(&mut data, 2, 2);
    }

    #[test]
    fn test_gemm_into_strided_output() {
        let a_data = [1.0f32, 2.0, 3.0, 4.0];
        let b_data = [5.0f32, 6.0, 7.0, 8.0];
        let a = MatRef::from_slice(&a_data, 2, 2);
        let b = MatRef::from_slice(&b_data, 2, 2);

        let mut out = [1.0f32, 1.0, -7.0, 1.0, 1.0];
        let mut c = MatMut::with_stride(&mut out, 2, 2, 3).unwrap();
        c.gemm_into(1.0, &a, &b, 1.0).unwrap();
        assert_eq!(c.rb().to_owned().as_slice(), &[20.0, 23.0, 44.0, 51.0]);
        assert_eq!(out[2], -7.0);
    }

    #[test]
    fn test_gemm_into_submatrix_operands() {
        let big: Vec<f32> = (0..16).map(|x| x as f32).collect();
        let full = MatRef::from_slice(&big, 4, 4);
        let a = full.submatrix(0, 0, 2, 2); // [[0, 1], [4, 5]]
        let b = full.submatrix(2, 2, 2, 2); // [[10, 11], [14, 15]]

        let mut out = [0.0f32; 4];
        MatMut::from_slice(&mut out, 2, 2)
            .gemm_into(1.0, &a, &b, 0.0)
            .unwrap();
        assert_eq!(out, [14.0, 15.0, 110.0, 119.0]);
    }

    #[test]
    fn test_gemm_into_rejects_wrong_output_shape() {
        let data = [1.0f32; 6];
        let a = MatRef::from_slice(&data, 2, 3);
        let b = MatRef::from_slice(&data, 3, 2);
        let mut out = [0.0f32; 6];
        let mut c = MatMut::from_slice(&mut out, 2, 3);
        assert!(matches!(
            c.gemm_into(1.0, &a, &b, 0.0),
            Err(GemmError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_gemm_nt_into() {
        let a_data = [1.0f32, 2.0, 3.0];
        let bt_data = [1.0f32, 1.0, 1.0, 0.0, 1.0, 0.0];
        let a = MatRef::from_slice(&a_data, 1, 3);
        let bt = MatRef::from_slice(&bt_data, 2, 3);
        let mut out = [0.0f32; 2];
        MatMut::from_slice(&mut out, 1, 2)
            .gemm_nt_into(1.0, &a, &bt, 0.0)
            .unwrap();
        assert_eq!(out, [6.0, 2.0]);
    }
}
