//! Matrix views over row-major f32 storage.
//!
//! - [`MatRef<'a>`]: immutable strided view
//! - [`MatMut<'a>`]: mutable strided view, the output of [`MatMut::gemm_into`]
//! - [`Mat`]: owned dense matrix
//!
//! Views carry (slice, rows, cols, stride). Their constructors check that
//! the slice covers the view, so the GEMM methods only need to check that
//! shapes agree. Element accessors bound-check in debug builds only.
//!
//! # Example
//!
//! ```
//! use simd_gemm::{Mat, MatRef};
//!
//! let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let a = MatRef::from_slice(&data, 2, 3);
//! let b = MatRef::from_slice(&data, 3, 2);
//!
//! let c = a.matmul(&b).unwrap();
//! assert_eq!(c[(0, 0)], 22.0);
//!
//! let mut acc = Mat::zeros(2, 2);
//! acc.as_mut().gemm_into(2.0, &a, &b, 0.0).unwrap();
//! assert_eq!(acc[(1, 1)], 128.0);
//! ```

mod mut_;
mod owned;
mod ref_;

pub use mut_::MatMut;
pub use owned::Mat;
pub use ref_::MatRef;
