//! Vector abstraction the generic kernels are written against.
//!
//! Each supported register width implements [`F32Vec`]; the kernels are
//! monomorphized per width and wrapped with the matching
//! `#[target_feature]` in `simd::kernels`. Register-level operations are
//! `unsafe` because the intrinsic-backed types are only valid on CPUs
//! with the matching instruction set.
//!
//! Rounding follows the type, not the build: [`F32Vec::mul_add`] fuses on
//! [`F32x8Fma`], [`F32x16`] and `F32x4Neon`, and rounds the product
//! separately everywhere else.

use wide::f32x4;

use super::mask::LaneMask;

#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "x86_64")]
mod x86;

#[cfg(target_arch = "aarch64")]
pub use neon::F32x4Neon;
#[cfg(target_arch = "x86_64")]
pub use x86::{F32x16, F32x8Avx, F32x8Fma};

/// A vector of f32 lanes with unaligned and masked memory access.
///
/// # Safety
/// Every method may execute instructions outside the baseline target.
/// Callers must have checked that the CPU supports the instruction set
/// the implementing type is built on.
pub trait F32Vec: Copy {
    /// Number of f32 lanes.
    const LANES: usize;

    unsafe fn zero() -> Self;

    unsafe fn splat(value: f32) -> Self;

    /// # Safety
    /// `ptr` must be valid for reading `LANES` floats.
    unsafe fn load(ptr: *const f32) -> Self;

    /// # Safety
    /// `ptr` must be valid for writing `LANES` floats.
    unsafe fn store(self, ptr: *mut f32);

    /// Load only the lanes set in `mask`; the others read as zero.
    ///
    /// # Safety
    /// `ptr.add(i)` must be readable for every set lane `i`.
    unsafe fn load_masked(ptr: *const f32, mask: LaneMask) -> Self;

    /// Store only the lanes set in `mask`.
    ///
    /// # Safety
    /// `ptr.add(i)` must be writable for every set lane `i`.
    unsafe fn store_masked(self, ptr: *mut f32, mask: LaneMask);

    unsafe fn mul(self, b: Self) -> Self;

    /// `self * b + c`. Fused (one rounding) exactly on the FMA types.
    unsafe fn mul_add(self, b: Self, c: Self) -> Self;

    /// Horizontal sum of all lanes.
    unsafe fn reduce_add(self) -> f32;
}

impl F32Vec for f32 {
    const LANES: usize = 1;

    #[inline(always)]
    unsafe fn zero() -> Self {
        0.0
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        value
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        *ptr
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        *ptr = self;
    }

    #[inline(always)]
    unsafe fn load_masked(ptr: *const f32, mask: LaneMask) -> Self {
        if mask.lane(0) {
            *ptr
        } else {
            0.0
        }
    }

    #[inline(always)]
    unsafe fn store_masked(self, ptr: *mut f32, mask: LaneMask) {
        if mask.lane(0) {
            *ptr = self;
        }
    }

    #[inline(always)]
    unsafe fn mul(self, b: Self) -> Self {
        self * b
    }

    #[inline(always)]
    unsafe fn mul_add(self, b: Self, c: Self) -> Self {
        self * b + c
    }

    #[inline(always)]
    unsafe fn reduce_add(self) -> f32 {
        self
    }
}

// SSE2 is part of the x86-64 baseline, so `wide` already lowers f32x4 to
// xmm operations there. `wide::f32x4::mul_add` is not used: its choice
// between fused and unfused is made by the build flags, not the level.
impl F32Vec for f32x4 {
    const LANES: usize = 4;

    #[inline(always)]
    unsafe fn zero() -> Self {
        f32x4::splat(0.0)
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        f32x4::splat(value)
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        f32x4::from(ptr.cast::<[f32; 4]>().read_unaligned())
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        let lanes: [f32; 4] = self.into();
        ptr.cast::<[f32; 4]>().write_unaligned(lanes);
    }

    #[inline(always)]
    unsafe fn load_masked(ptr: *const f32, mask: LaneMask) -> Self {
        f32x4::from(read_lanes::<4>(ptr, mask))
    }

    #[inline(always)]
    unsafe fn store_masked(self, ptr: *mut f32, mask: LaneMask) {
        write_lanes::<4>(self.into(), ptr, mask);
    }

    #[inline(always)]
    unsafe fn mul(self, b: Self) -> Self {
        self * b
    }

    #[inline(always)]
    unsafe fn mul_add(self, b: Self, c: Self) -> Self {
        self * b + c
    }

    #[inline(always)]
    unsafe fn reduce_add(self) -> f32 {
        let lanes: [f32; 4] = self.into();
        lanes.iter().sum()
    }
}

/// Gather the lanes set in `mask` into an array, zeroing the rest.
#[inline(always)]
pub(crate) unsafe fn read_lanes<const N: usize>(ptr: *const f32, mask: LaneMask) -> [f32; N] {
    let mut lanes = [0.0f32; N];
    for (i, lane) in lanes.iter_mut().enumerate() {
        if mask.lane(i) {
            *lane = *ptr.add(i);
        }
    }
    lanes
}

#[inline(always)]
pub(crate) unsafe fn write_lanes<const N: usize>(lanes: [f32; N], ptr: *mut f32, mask: LaneMask) {
    for (i, lane) in lanes.iter().enumerate() {
        if mask.lane(i) {
            *ptr.add(i) = *lane;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn roundtrip_masked<V: F32Vec>() {
        let src: Vec<f32> = (1..=V::LANES).map(|i| i as f32).collect();
        for valid in 0..=V::LANES {
            let nose = LaneMask::nose(V::LANES, valid);
            let mut dst = vec![-1.0f32; V::LANES];
            unsafe { V::load_masked(src.as_ptr(), nose).store(dst.as_mut_ptr()) };
            for i in 0..V::LANES {
                let expected = if i < valid { src[i] } else { 0.0 };
                assert_eq!(dst[i], expected, "nose {valid} lane {i}");
            }

            let tail = LaneMask::tail(V::LANES, valid);
            let mut dst = vec![-1.0f32; V::LANES];
            unsafe { V::splat(7.0).store_masked(dst.as_mut_ptr(), tail) };
            for i in 0..V::LANES {
                let expected = if i >= V::LANES - valid { 7.0 } else { -1.0 };
                assert_eq!(dst[i], expected, "tail {valid} lane {i}");
            }
        }
    }

    pub(crate) fn arithmetic<V: F32Vec>() {
        let src: Vec<f32> = (0..V::LANES).map(|i| i as f32).collect();
        let mut out = vec![0.0f32; V::LANES];
        let n = V::LANES as f32;
        unsafe {
            let v = V::load(src.as_ptr());
            v.mul_add(V::splat(2.0), V::splat(1.0))
                .store(out.as_mut_ptr());
            assert_eq!(v.reduce_add(), n * (n - 1.0) / 2.0);
            assert_eq!(v.mul(V::zero()).reduce_add(), 0.0);
        }
        for (i, x) in out.iter().enumerate() {
            assert_eq!(*x, 2.0 * i as f32 + 1.0);
        }
    }

    /// `(1 + 2^-12)^2 - (1 + 2^-11)` is exactly `2^-24`, which a separately
    /// rounded product loses to round-to-even.
    pub(crate) fn cancellation<V: F32Vec>() -> f32 {
        let e = 2f32.powi(-12);
        let x = 1.0 + e;
        let mut out = vec![f32::NAN; V::LANES];
        unsafe {
            V::splat(x)
                .mul_add(V::splat(x), V::splat(-(1.0 + 2.0 * e)))
                .store(out.as_mut_ptr());
        }
        assert!(out.iter().all(|&v| v == out[0]));
        out[0]
    }

    #[test]
    fn test_scalar() {
        roundtrip_masked::<f32>();
        arithmetic::<f32>();
        assert_eq!(cancellation::<f32>(), 0.0);
    }

    #[test]
    fn test_f32x4() {
        roundtrip_masked::<f32x4>();
        arithmetic::<f32x4>();
        assert_eq!(cancellation::<f32x4>(), 0.0);
    }

    #[test]
    fn test_masked_load_does_not_read_invalid_lanes() {
        // Only three floats exist; the masked load must stay inside them.
        let src = [1.0f32, 2.0, 3.0];
        let sum = unsafe {
            let v = <f32x4 as F32Vec>::load_masked(src.as_ptr(), LaneMask::nose(4, 3));
            F32Vec::reduce_add(v)
        };
        assert_eq!(sum, 6.0);
    }
}
