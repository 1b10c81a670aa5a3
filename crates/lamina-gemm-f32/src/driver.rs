use lamina_base::{round_up, Result};

use crate::dispatch::KernelVariant;
use crate::pack::{pack_a, pack_b, PackedBuffer};

/// `C[i][j] = beta * C[i][j]` over an `m x n` block; `beta == 0` stores zeros
/// so NaN in C does not survive.
pub(crate) unsafe fn scale_c(c: *mut f32, m: usize, n: usize, ldc: usize, beta: f32) {
    for i in 0..m {
        let row = core::slice::from_raw_parts_mut(c.add(i * ldc), n);
        if beta == 0.0 {
            row.fill(0.0);
        } else {
            row.iter_mut().for_each(|x| *x *= beta);
        }
    }
}

/// Block sizes `(kc, nc)` for a problem of depth `k`. When the whole depth fits
/// one K-block the N-block grows so the packed B panel keeps its size.
pub(crate) fn block_sizes(variant: &KernelVariant, k: usize) -> (usize, usize) {
    if k >= variant.kc {
        return (variant.kc, variant.nc);
    }
    let kc = k.max(1);
    let nc = (variant.nc * variant.kc / kc) / variant.band_width * variant.band_width;
    (kc, nc.max(variant.nc))
}

/// Blocked row-major gemm over raw pointers. Operands must be valid for the
/// given dimensions and leading dimensions.
///
/// Scratch is allocated before C is touched, so an allocation failure leaves
/// C unchanged.
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn gemm(
    variant: &KernelVariant,
    trans_a: bool,
    trans_b: bool,
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: *const f32,
    lda: usize,
    b: *const f32,
    ldb: usize,
    beta: f32,
    c: *mut f32,
    ldc: usize,
) -> Result<()> {
    if m == 0 || n == 0 {
        return Ok(());
    }
    if k == 0 {
        if beta != 1.0 {
            scale_c(c, m, n, ldc, beta);
        }
        return Ok(());
    }

    let band = variant.band_width;
    let row_tile = variant.max_rows();
    let (kc, nc) = block_sizes(variant, k);
    let nc = nc.min(round_up(n, band));
    let mc = variant.mc.min(m);
    tracing::trace!(isa = %variant.isa, m, n, k, trans_a, trans_b, kc, nc, mc, "sgemm");

    let mut bp = PackedBuffer::zeroed(kc * round_up(nc, band))?;
    let mut ap = if trans_a { Some(PackedBuffer::zeroed(round_up(mc, row_tile) * kc)?) } else { None };

    if beta != 0.0 && beta != 1.0 {
        scale_c(c, m, n, ldc, beta);
    }

    let use_avx = variant.has_avx();
    let mut jc = 0;
    while jc < n {
        let nb = nc.min(n - jc);
        let mut pc = 0;
        while pc < k {
            let kb = kc.min(k - pc);
            let b_blk = if trans_b { b.add(jc * ldb + pc) } else { b.add(pc * ldb + jc) };
            pack_b(b_blk, ldb, trans_b, kb, nb, band, bp.as_mut_ptr(), use_avx);
            // later K-blocks always accumulate onto the first one
            let zero_mode = pc == 0 && beta == 0.0;
            let mut ic = 0;
            while ic < m {
                let mb = mc.min(m - ic);
                let (a_blk, a_ld) = match ap.as_mut() {
                    Some(ap) => {
                        pack_a(a.add(pc * lda + ic), lda, true, mb, kb, row_tile, ap.as_mut_ptr(), use_avx);
                        (ap.as_mut_ptr() as *const f32, kb)
                    }
                    None => (a.add(ic * lda + pc), lda),
                };
                let c_blk = c.add(ic * ldc + jc);
                let mut i = 0;
                while i < mb {
                    let rows = (variant.kernel)(
                        a_blk.add(i * a_ld),
                        bp.as_mut_ptr(),
                        c_blk.add(i * ldc),
                        kb,
                        mb - i,
                        nb,
                        a_ld,
                        ldc,
                        alpha,
                        zero_mode,
                    );
                    debug_assert!(rows > 0);
                    i += rows;
                }
                ic += mb;
            }
            pc += kb;
        }
        jc += nb;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_base::IsaVariant;

    #[test]
    fn n_block_widens_for_shallow_k() {
        let v = KernelVariant::for_isa(IsaVariant::Baseline).unwrap();
        assert_eq!(block_sizes(v, 1000), (v.kc, v.nc));
        assert_eq!(block_sizes(v, v.kc), (v.kc, v.nc));
        let (kc, nc) = block_sizes(v, v.kc / 4);
        assert_eq!(kc, v.kc / 4);
        assert_eq!(nc, v.nc * 4);
        // packed panel never outgrows the nominal one
        for k in [1, 3, 17, 100, 255] {
            let (kc, nc) = block_sizes(v, k);
            assert!(kc * nc <= v.kc * v.nc);
            assert_eq!(nc % v.band_width, 0);
        }
    }

    #[test]
    fn scale_rows() {
        let mut c = [1.0, 2.0, 9.0, f32::NAN, 4.0, 9.0];
        unsafe { scale_c(c.as_mut_ptr(), 2, 2, 3, 0.5) };
        assert_eq!(&c[..3], &[0.5, 1.0, 9.0]);
        assert!(c[3].is_nan());
        unsafe { scale_c(c.as_mut_ptr(), 2, 2, 3, 0.0) };
        assert_eq!(c, [0.0, 0.0, 9.0, 0.0, 0.0, 9.0]);
    }
}
