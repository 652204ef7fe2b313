use crate::error::{GemmError, Result};
use crate::simd::kernel_table;

/// Floats a row-major `rows` x `cols` view at `stride` spans.
pub(crate) fn required_len(rows: usize, cols: usize, stride: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (rows - 1).saturating_mul(stride).saturating_add(cols)
    }
}

/// Check that `len` floats at `stride` hold a `rows` x `cols` operand.
pub(crate) fn check_operand(
    operand: &'static str,
    len: usize,
    rows: usize,
    cols: usize,
    stride: usize,
) -> Result<()> {
    if stride < cols {
        return Err(GemmError::StrideTooSmall {
            operand,
            stride,
            cols,
        });
    }
    let required = required_len(rows, cols, stride);
    if len < required {
        return Err(GemmError::BufferTooSmall {
            operand,
            len,
            required,
        });
    }
    Ok(())
}

/// Checked GEMM: `C <- alpha * A * B + beta * C`.
///
/// `A` is `m` x `k`, `B` is `k` x `n` and `C` is `m` x `n`, all row-major
/// with the given leading dimensions. An empty output is a no-op and
/// `k == 0` only scales C by beta.
///
/// # Example
///
/// ```
/// use simd_gemm::sgemm_nn;
///
/// let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2x3
/// let b = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]; // 3x2
/// let mut c = [0.0f32; 4];
///
/// sgemm_nn(2, 2, 3, 1.0, &a, 3, &b, 2, 0.0, &mut c, 2).unwrap();
/// assert_eq!(c, [22.0, 28.0, 49.0, 64.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn sgemm_nn(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    beta: f32,
    c: &mut [f32],
    ldc: usize,
) -> Result<()> {
    check_operand("A", a.len(), m, k, lda)?;
    check_operand("B", b.len(), k, n, ldb)?;
    check_operand("C", c.len(), m, n, ldc)?;

    unsafe {
        kernel_table().gemm_nn(
            m,
            n,
            k,
            alpha,
            a.as_ptr(),
            lda,
            b.as_ptr(),
            ldb,
            beta,
            c.as_mut_ptr(),
            ldc,
        );
    }
    Ok(())
}

/// Checked GEMM against a transposed B: `C <- alpha * A * B^T + beta * C`.
///
/// `B` is stored as `n` rows of `k` floats, so every output element is a
/// dot product of two contiguous rows.
#[allow(clippy::too_many_arguments)]
pub fn sgemm_nt(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    lda: usize,
    b: &[f32],
    ldb: usize,
    beta: f32,
    c: &mut [f32],
    ldc: usize,
) -> Result<()> {
    check_operand("A", a.len(), m, k, lda)?;
    check_operand("B", b.len(), n, k, ldb)?;
    check_operand("C", c.len(), m, n, ldc)?;

    unsafe {
        kernel_table().gemm_nt(
            m,
            n,
            k,
            alpha,
            a.as_ptr(),
            lda,
            b.as_ptr(),
            ldb,
            beta,
            c.as_mut_ptr(),
            ldc,
        );
    }
    Ok(())
}

/// Simple matrix multiplication: `C = A * B` for dense row-major operands.
///
/// # Example
///
/// ```
/// use simd_gemm::matmul;
///
/// let a = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]; // 2x3
/// let b = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]; // 3x2
///
/// let c = matmul(&a, 2, 3, &b, 2).unwrap();
/// assert_eq!(c, vec![22.0, 28.0, 49.0, 64.0]);
/// ```
pub fn matmul(a: &[f32], m: usize, k: usize, b: &[f32], n: usize) -> Result<Vec<f32>> {
    if a.len() != m * k {
        return Err(GemmError::DimensionMismatch(format!(
            "A holds {} elements, expected {m}x{k}",
            a.len()
        )));
    }
    if b.len() != k * n {
        return Err(GemmError::DimensionMismatch(format!(
            "B holds {} elements, expected {k}x{n}",
            b.len()
        )));
    }

    let mut c = vec![0.0f32; m * n];
    sgemm_nn(m, n, k, 1.0, a, k, b, n, 0.0, &mut c, n)?;
    Ok(c)
}

/// Builder for configuring GEMM calls.
///
/// Defaults to `alpha = 1`, `beta = 0` and an untransposed B.
///
/// # Example
///
/// ```
/// use simd_gemm::Gemm;
///
/// let a = vec![1.0f32; 6]; // 2x3
/// let b = vec![1.0f32; 6]; // 3x2
/// let mut c = vec![1.0f32; 4];
///
/// Gemm::new(2, 2, 3)
///     .alpha(2.0)
///     .beta(1.0)
///     .execute(&a, 3, &b, 2, &mut c, 2)
///     .unwrap();
/// assert_eq!(c, vec![7.0; 4]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Gemm {
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    beta: f32,
    trans_b: bool,
}

impl Gemm {
    pub fn new(m: usize, n: usize, k: usize) -> Self {
        Self {
            m,
            n,
            k,
            alpha: 1.0,
            beta: 0.0,
            trans_b: false,
        }
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Scale applied to the existing C. Zero overwrites C without reading it.
    pub fn beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    /// Treat B as stored `n` x `k` (dot-product path).
    pub fn trans_b(mut self) -> Self {
        self.trans_b = true;
        self
    }

    /// Execute the GEMM.
    ///
    /// # Arguments
    /// - `a`: matrix A, `m` rows at stride `lda`
    /// - `b`: matrix B, `k` rows (or `n` rows when transposed) at stride `ldb`
    /// - `c`: output, `m` rows at stride `ldc`
    pub fn execute(
        self,
        a: &[f32],
        lda: usize,
        b: &[f32],
        ldb: usize,
        c: &mut [f32],
        ldc: usize,
    ) -> Result<()> {
        let gemm = if self.trans_b { sgemm_nt } else { sgemm_nn };
        gemm(
            self.m, self.n, self.k, self.alpha, a, lda, b, ldb, self.beta, c, ldc,
        )
    }
}
