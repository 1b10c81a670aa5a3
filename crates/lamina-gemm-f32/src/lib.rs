//! Single precision gemm with kernels chosen at runtime.
//!
//! All matrices are row-major. The kernel variant (baseline, avx, avx2/fma3 or
//! avx512f) is picked once per process from the cpu features, see
//! [`lamina_base::detect_capability`], or explicitly with [`Sgemm::with_isa`].
//!
//! ```
//! use lamina_gemm_f32::{sgemm, Transpose};
//!
//! let a = [1.0, 2.0, 3.0, 4.0];
//! let b = [1.0, 0.0, 0.0, 1.0];
//! let mut c = [0.0; 4];
//! sgemm(Transpose::NoTrans, Transpose::NoTrans, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2).unwrap();
//! assert_eq!(c, a);
//! ```

pub(crate) mod baseline;
pub(crate) mod dispatch;
pub(crate) mod driver;
pub mod pack;
pub(crate) mod ukernel;
#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_64_arch;

pub use dispatch::KernelVariant;
pub use lamina_base::{detect_capability, GemmError, IsaVariant, MatrixMut, MatrixRef, Result, Transpose};
pub use pack::{pack_a_panel, pack_b_panel, PackedBuffer};

pub(crate) type TA = f32;
pub(crate) type TB = f32;
pub(crate) type TC = f32;

/// Row-major `C = alpha * op(A) * op(B) + beta * C` for an `m x n` C.
///
/// `op(A)` is `m x k` and `op(B)` is `k x n`; with [`Transpose::Trans`] the
/// operand is stored transposed (`k x m` for A, `n x k` for B). Leading
/// dimensions and slice lengths are checked before anything is written, a
/// rejected call leaves `c` untouched. `beta == 0` ignores the previous content
/// of C, NaN included.
#[allow(clippy::too_many_arguments)]
pub fn sgemm(
    trans_a: Transpose,
    trans_b: Transpose,
    m: usize,
    n: usize,
    k: usize,
    alpha: TA,
    a: &[TA],
    lda: usize,
    b: &[TB],
    ldb: usize,
    beta: TC,
    c: &mut [TC],
    ldc: usize,
) -> Result<()> {
    Sgemm::new().gemm(trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc)
}

/// `C = A * B` with tightly packed row-major operands.
pub fn matmul(m: usize, n: usize, k: usize, a: &[TA], b: &[TB], c: &mut [TC]) -> Result<()> {
    sgemm(Transpose::NoTrans, Transpose::NoTrans, m, n, k, 1.0, a, k.max(1), b, n.max(1), 0.0, c, n.max(1))
}

/// Strided batch of independent gemms sharing shapes and scalars. Entry `i`
/// reads A at `a[i * stride_a..]`, B at `b[i * stride_b..]` and writes C at
/// `c[i * stride_c..]`. A and B strides may be zero to broadcast one operand;
/// C entries must not overlap.
#[allow(clippy::too_many_arguments)]
pub fn sgemm_batched(
    batch: usize,
    trans_a: Transpose,
    trans_b: Transpose,
    m: usize,
    n: usize,
    k: usize,
    alpha: TA,
    a: &[TA],
    lda: usize,
    stride_a: usize,
    b: &[TB],
    ldb: usize,
    stride_b: usize,
    beta: TC,
    c: &mut [TC],
    ldc: usize,
    stride_c: usize,
) -> Result<()> {
    Sgemm::new().gemm_batched(
        batch, trans_a, trans_b, m, n, k, alpha, a, lda, stride_a, b, ldb, stride_b, beta, c, ldc, stride_c,
    )
}

/// Raw pointer entry point with the same contract as [`sgemm`], using the
/// active kernel variant.
///
/// # Safety
/// `a`, `b` and `c` must be valid for the views described by the dimensions
/// and leading dimensions, and C must not overlap A or B. Only debug builds
/// check the leading dimensions.
#[allow(clippy::too_many_arguments)]
pub unsafe fn lamina_sgemm(
    trans_a: Transpose,
    trans_b: Transpose,
    m: usize,
    n: usize,
    k: usize,
    alpha: TA,
    a: *const TA,
    lda: usize,
    b: *const TB,
    ldb: usize,
    beta: TC,
    c: *mut TC,
    ldc: usize,
) -> Result<()> {
    debug_assert!(lda >= trans_a.stored_dims(m, k).1.max(1));
    debug_assert!(ldb >= trans_b.stored_dims(k, n).1.max(1));
    debug_assert!(ldc >= n.max(1));
    driver::gemm(
        KernelVariant::active(),
        trans_a.is_trans(),
        trans_b.is_trans(),
        m,
        n,
        k,
        alpha,
        a,
        lda,
        b,
        ldb,
        beta,
        c,
        ldc,
    )
}

/// Gemm bound to one kernel variant.
#[derive(Copy, Clone, Debug)]
pub struct Sgemm {
    variant: &'static KernelVariant,
}

impl Default for Sgemm {
    fn default() -> Self {
        Self::new()
    }
}

impl Sgemm {
    /// Uses the process-wide kernel variant.
    pub fn new() -> Self {
        Self { variant: KernelVariant::active() }
    }

    /// Forces a variant; fails with [`GemmError::UnsupportedIsa`] when the cpu
    /// lacks the required extensions.
    pub fn with_isa(isa: IsaVariant) -> Result<Self> {
        Ok(Self { variant: KernelVariant::supported(isa)? })
    }

    pub fn isa(&self) -> IsaVariant {
        self.variant.isa
    }

    pub fn variant(&self) -> &'static KernelVariant {
        self.variant
    }

    /// See [`sgemm`].
    #[allow(clippy::too_many_arguments)]
    pub fn gemm(
        &self,
        trans_a: Transpose,
        trans_b: Transpose,
        m: usize,
        n: usize,
        k: usize,
        alpha: TA,
        a: &[TA],
        lda: usize,
        b: &[TB],
        ldb: usize,
        beta: TC,
        c: &mut [TC],
        ldc: usize,
    ) -> Result<()> {
        let (a_rows, a_cols) = trans_a.stored_dims(m, k);
        let a = MatrixRef::for_operand("A", a, a_rows, a_cols, lda)?;
        let (b_rows, b_cols) = trans_b.stored_dims(k, n);
        let b = MatrixRef::for_operand("B", b, b_rows, b_cols, ldb)?;
        let mut c = MatrixMut::for_operand("C", c, m, n, ldc)?;
        unsafe {
            driver::gemm(
                self.variant,
                trans_a.is_trans(),
                trans_b.is_trans(),
                m,
                n,
                k,
                alpha,
                a.as_ptr(),
                a.ld(),
                b.as_ptr(),
                b.ld(),
                beta,
                c.as_mut_ptr(),
                c.ld(),
            )
        }
    }

    /// See [`sgemm_batched`].
    #[allow(clippy::too_many_arguments)]
    pub fn gemm_batched(
        &self,
        batch: usize,
        trans_a: Transpose,
        trans_b: Transpose,
        m: usize,
        n: usize,
        k: usize,
        alpha: TA,
        a: &[TA],
        lda: usize,
        stride_a: usize,
        b: &[TB],
        ldb: usize,
        stride_b: usize,
        beta: TC,
        c: &mut [TC],
        ldc: usize,
        stride_c: usize,
    ) -> Result<()> {
        if batch == 0 {
            return Ok(());
        }
        let (a_rows, a_cols) = trans_a.stored_dims(m, k);
        let (b_rows, b_cols) = trans_b.stored_dims(k, n);
        let a_span = batch_span("A", a.len(), batch, stride_a, a_rows, a_cols, lda)?;
        let b_span = batch_span("B", b.len(), batch, stride_b, b_rows, b_cols, ldb)?;
        let c_span = batch_span("C", c.len(), batch, stride_c, m, n, ldc)?;
        if batch > 1 && stride_c < c_span {
            return Err(GemmError::InvalidBatchStride { operand: "C", stride: stride_c, min: c_span });
        }
        for i in 0..batch {
            let a_i = &a[i * stride_a..i * stride_a + a_span];
            let b_i = &b[i * stride_b..i * stride_b + b_span];
            let c_i = &mut c[i * stride_c..i * stride_c + c_span];
            self.gemm(trans_a, trans_b, m, n, k, alpha, a_i, lda, b_i, ldb, beta, c_i, ldc)?;
        }
        Ok(())
    }
}

// Checks one operand of a batch and returns the span of a single entry.
fn batch_span(
    operand: &'static str,
    len: usize,
    batch: usize,
    stride: usize,
    rows: usize,
    cols: usize,
    ld: usize,
) -> Result<usize> {
    let min = cols.max(1);
    if ld < min {
        return Err(GemmError::InvalidLeadingDimension { operand, ld, min });
    }
    let required = lamina_base::required_len(rows, cols, ld)
        .and_then(|span| Some((span, (batch - 1).checked_mul(stride)?.checked_add(span)?)));
    let (span, required) = required.ok_or(GemmError::SizeOverflow { operand })?;
    if len < required {
        return Err(GemmError::BufferTooSmall { operand, len, required });
    }
    Ok(span)
}
