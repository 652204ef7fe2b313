use super::vector::F32Vec;

/// Apply `C <- beta * C` to an `m` x `n` block.
///
/// `beta == 1` leaves C untouched and `beta == 0` overwrites it with zeros
/// without reading, so NaN or Inf already in C cannot leak into the
/// result. Any other value multiplies in place.
///
/// # Safety
/// `c` must be valid for reading and writing `m` rows of `n` floats at
/// stride `ldc`.
#[inline(always)]
pub unsafe fn scale_c<V: F32Vec>(m: usize, n: usize, beta: f32, c: *mut f32, ldc: usize) {
    if beta == 1.0 {
        return;
    }

    if beta == 0.0 {
        for i in 0..m {
            std::ptr::write_bytes(c.add(i * ldc), 0, n);
        }
        return;
    }

    let na = n - n % V::LANES;
    let scale = V::splat(beta);
    for i in 0..m {
        let row = c.add(i * ldc);
        let mut j = 0;
        while j < na {
            V::load(row.add(j)).mul(scale).store(row.add(j));
            j += V::LANES;
        }
        while j < n {
            *row.add(j) *= beta;
            j += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wide::f32x4;

    #[test]
    fn test_beta_one_is_noop() {
        let mut c = vec![f32::NAN, 2.0, 3.0, 4.0];
        unsafe { scale_c::<f32x4>(2, 2, 1.0, c.as_mut_ptr(), 2) };
        assert!(c[0].is_nan());
        assert_eq!(&c[1..], &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_beta_zero_overwrites_nan() {
        let mut c = vec![f32::NAN; 3 * 11];
        unsafe { scale_c::<f32x4>(3, 11, 0.0, c.as_mut_ptr(), 11) };
        assert!(c.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_scale_respects_stride() {
        // 2x9 block inside rows of 10; column 9 must stay.
        let mut c: Vec<f32> = (0..20).map(|x| x as f32).collect();
        unsafe { scale_c::<f32x4>(2, 9, 0.5, c.as_mut_ptr(), 10) };
        for i in 0..2 {
            for j in 0..9 {
                assert_eq!(c[i * 10 + j], (i * 10 + j) as f32 * 0.5);
            }
            assert_eq!(c[i * 10 + 9], (i * 10 + 9) as f32);
        }
    }

    #[test]
    fn test_scalar_width() {
        let mut c = vec![1.0f32, -2.0, 4.0];
        unsafe { scale_c::<f32>(1, 3, -3.0, c.as_mut_ptr(), 3) };
        assert_eq!(c, vec![-3.0, 6.0, -12.0]);
    }
}
