//! x86-64 register types for the AVX, AVX2+FMA and AVX-512 kernels.
//!
//! Every method is `#[inline(always)]` so the intrinsics land inside the
//! `#[target_feature]` kernel wrappers and compile to ymm/zmm code there.

use std::arch::x86_64::*;

use super::F32Vec;
use crate::core::mask::LaneMask;

/// All-ones in every lane whose mask bit is set, the form
/// `vmaskmovps` expects.
#[inline(always)]
unsafe fn lane_select(mask: LaneMask) -> __m256i {
    let bits = mask.bits() as i32;
    let lane = |i: i32| -((bits >> i) & 1);
    _mm256_setr_epi32(
        lane(0),
        lane(1),
        lane(2),
        lane(3),
        lane(4),
        lane(5),
        lane(6),
        lane(7),
    )
}

#[inline(always)]
unsafe fn hsum256(v: __m256) -> f32 {
    let s = _mm_add_ps(_mm256_castps256_ps128(v), _mm256_extractf128_ps::<1>(v));
    let s = _mm_add_ps(s, _mm_movehl_ps(s, s));
    let s = _mm_add_ss(s, _mm_shuffle_ps::<0b01>(s, s));
    _mm_cvtss_f32(s)
}

#[inline(always)]
unsafe fn mul_then_add(a: __m256, b: __m256, c: __m256) -> __m256 {
    _mm256_add_ps(_mm256_mul_ps(a, b), c)
}

macro_rules! ymm_vec {
    ($(#[$doc:meta])* $name:ident, $mul_add:path) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        #[repr(transparent)]
        pub struct $name(__m256);

        impl F32Vec for $name {
            const LANES: usize = 8;

            #[inline(always)]
            unsafe fn zero() -> Self {
                Self(_mm256_setzero_ps())
            }

            #[inline(always)]
            unsafe fn splat(value: f32) -> Self {
                Self(_mm256_set1_ps(value))
            }

            #[inline(always)]
            unsafe fn load(ptr: *const f32) -> Self {
                Self(_mm256_loadu_ps(ptr))
            }

            #[inline(always)]
            unsafe fn store(self, ptr: *mut f32) {
                _mm256_storeu_ps(ptr, self.0)
            }

            #[inline(always)]
            unsafe fn load_masked(ptr: *const f32, mask: LaneMask) -> Self {
                Self(_mm256_maskload_ps(ptr, lane_select(mask)))
            }

            #[inline(always)]
            unsafe fn store_masked(self, ptr: *mut f32, mask: LaneMask) {
                _mm256_maskstore_ps(ptr, lane_select(mask), self.0)
            }

            #[inline(always)]
            unsafe fn mul(self, b: Self) -> Self {
                Self(_mm256_mul_ps(self.0, b.0))
            }

            #[inline(always)]
            unsafe fn mul_add(self, b: Self, c: Self) -> Self {
                Self($mul_add(self.0, b.0, c.0))
            }

            #[inline(always)]
            unsafe fn reduce_add(self) -> f32 {
                hsum256(self.0)
            }
        }
    };
}

ymm_vec!(
    /// Eight lanes in a ymm register; multiply and add round separately.
    F32x8Avx,
    mul_then_add
);

ymm_vec!(
    /// Eight lanes in a ymm register with fused multiply-add.
    F32x8Fma,
    _mm256_fmadd_ps
);

/// Sixteen lanes in a zmm register with fused multiply-add.
///
/// Tail loads and stores use the AVX-512 opmask forms, so masked-off
/// lanes are neither read nor written.
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct F32x16(__m512);

impl F32Vec for F32x16 {
    const LANES: usize = 16;

    #[inline(always)]
    unsafe fn zero() -> Self {
        Self(_mm512_setzero_ps())
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        Self(_mm512_set1_ps(value))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Self(_mm512_loadu_ps(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        _mm512_storeu_ps(ptr, self.0)
    }

    #[inline(always)]
    unsafe fn load_masked(ptr: *const f32, mask: LaneMask) -> Self {
        Self(_mm512_maskz_loadu_ps(mask.bits() as __mmask16, ptr))
    }

    #[inline(always)]
    unsafe fn store_masked(self, ptr: *mut f32, mask: LaneMask) {
        _mm512_mask_storeu_ps(ptr, mask.bits() as __mmask16, self.0)
    }

    #[inline(always)]
    unsafe fn mul(self, b: Self) -> Self {
        Self(_mm512_mul_ps(self.0, b.0))
    }

    #[inline(always)]
    unsafe fn mul_add(self, b: Self, c: Self) -> Self {
        Self(_mm512_fmadd_ps(self.0, b.0, c.0))
    }

    #[inline(always)]
    unsafe fn reduce_add(self) -> f32 {
        _mm512_reduce_add_ps(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{arithmetic, cancellation, roundtrip_masked};
    use super::*;

    unsafe fn lanes_of<V: F32Vec, const N: usize>(v: V) -> [f32; N] {
        let mut out = [0.0f32; N];
        v.store(out.as_mut_ptr());
        out
    }

    fn has_avx512() -> bool {
        is_x86_feature_detected!("avx512f")
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
    }

    #[test]
    fn test_f32x8_avx() {
        if !is_x86_feature_detected!("avx") {
            return;
        }
        roundtrip_masked::<F32x8Avx>();
        arithmetic::<F32x8Avx>();
        assert_eq!(cancellation::<F32x8Avx>(), 0.0);
    }

    #[test]
    fn test_f32x8_fma() {
        if !(is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")) {
            return;
        }
        roundtrip_masked::<F32x8Fma>();
        arithmetic::<F32x8Fma>();
        assert_eq!(cancellation::<F32x8Fma>(), 2f32.powi(-24));
    }

    #[test]
    fn test_f32x16() {
        if !has_avx512() {
            return;
        }
        roundtrip_masked::<F32x16>();
        arithmetic::<F32x16>();
        assert_eq!(cancellation::<F32x16>(), 2f32.powi(-24));
    }

    #[test]
    fn test_ymm_masks_select_scattered_lanes() {
        if !is_x86_feature_detected!("avx") {
            return;
        }
        let src: Vec<f32> = (1..=8).map(|x| x as f32).collect();
        let mask = LaneMask::from_bits(8, 0b1010_0101);
        let got: [f32; 8] = unsafe { lanes_of(F32x8Avx::load_masked(src.as_ptr(), mask)) };
        assert_eq!(got, [1.0, 0.0, 3.0, 0.0, 0.0, 6.0, 0.0, 8.0]);
    }

    #[test]
    fn test_zmm_masked_load_stays_in_bounds() {
        if !has_avx512() {
            return;
        }
        // Five floats exist; lanes 5..16 must not be touched.
        let src = [1.0f32, 2.0, 3.0, 4.0, 5.0];
        let sum =
            unsafe { F32x16::load_masked(src.as_ptr(), LaneMask::nose(16, 5)).reduce_add() };
        assert_eq!(sum, 15.0);

        let mut dst = [-1.0f32; 5];
        unsafe { F32x16::splat(2.0).store_masked(dst.as_mut_ptr(), LaneMask::nose(16, 5)) };
        assert_eq!(dst, [2.0; 5]);
    }
}
