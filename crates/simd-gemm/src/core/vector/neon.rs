use std::arch::aarch64::*;

use super::{read_lanes, write_lanes, F32Vec};
use crate::core::mask::LaneMask;

/// Four lanes in a q register with fused multiply-add.
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct F32x4Neon(float32x4_t);

impl F32Vec for F32x4Neon {
    const LANES: usize = 4;

    #[inline(always)]
    unsafe fn zero() -> Self {
        Self(vdupq_n_f32(0.0))
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        Self(vdupq_n_f32(value))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Self(vld1q_f32(ptr))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        vst1q_f32(ptr, self.0)
    }

    #[inline(always)]
    unsafe fn load_masked(ptr: *const f32, mask: LaneMask) -> Self {
        Self(vld1q_f32(read_lanes::<4>(ptr, mask).as_ptr()))
    }

    #[inline(always)]
    unsafe fn store_masked(self, ptr: *mut f32, mask: LaneMask) {
        let mut lanes = [0.0f32; 4];
        vst1q_f32(lanes.as_mut_ptr(), self.0);
        write_lanes::<4>(lanes, ptr, mask);
    }

    #[inline(always)]
    unsafe fn mul(self, b: Self) -> Self {
        Self(vmulq_f32(self.0, b.0))
    }

    #[inline(always)]
    unsafe fn mul_add(self, b: Self, c: Self) -> Self {
        // vfmaq_f32(acc, x, y) = acc + x * y
        Self(vfmaq_f32(c.0, self.0, b.0))
    }

    #[inline(always)]
    unsafe fn reduce_add(self) -> f32 {
        vaddvq_f32(self.0)
    }
}
