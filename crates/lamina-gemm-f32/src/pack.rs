//! Panel packing.
//!
//! B is packed in bands of `band_width` columns: the `k` rows of one band are
//! consecutive and each holds `band_width` floats, the last band is padded
//! with zeros. A is only packed when stored transposed, into `round_up(m,
//! row_tile)` row-major rows of `k` floats.

use core::ptr::{copy_nonoverlapping, write_bytes};

use lamina_base::{detect_capability, round_up, GemmError, IsaVariant, MatrixRef, Result, Transpose};
use seq_macro::seq;

const PACK_ALIGN: usize = 64;

/// Library-owned, 64-byte aligned scratch holding one packed panel.
pub struct PackedBuffer {
    storage: Vec<f32>,
    offset: usize,
    len: usize,
}

impl PackedBuffer {
    /// Zero-filled buffer of `len` floats. Allocation failure is reported, not
    /// retried.
    pub(crate) fn zeroed(len: usize) -> Result<Self> {
        let pad = PACK_ALIGN / core::mem::size_of::<f32>();
        // an overflowing capacity is rejected by try_reserve_exact
        let cap = len.checked_add(pad).unwrap_or(usize::MAX);
        let mut storage = Vec::new();
        storage.try_reserve_exact(cap).map_err(|source| GemmError::Allocation { elems: len, source })?;
        storage.resize(cap, 0.0);
        let offset = storage.as_ptr().align_offset(PACK_ALIGN).min(pad);
        Ok(Self { storage, offset, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.storage[self.offset..self.offset + self.len]
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut f32 {
        self.storage[self.offset..].as_mut_ptr()
    }
}

// Copies `rows` rows of `cols` floats and zeroes the `dst_ld - cols` tail of
// every destination row.
unsafe fn copy_rows(src: *const f32, src_ld: usize, rows: usize, cols: usize, dst: *mut f32, dst_ld: usize) {
    let pad = dst_ld - cols;
    let rows8 = rows / 8 * 8;
    let mut i = 0;
    while i < rows8 {
        seq!(r in 0..8 {
            copy_nonoverlapping(src.add((i + r) * src_ld), dst.add((i + r) * dst_ld), cols);
            write_bytes(dst.add((i + r) * dst_ld + cols), 0, pad);
        });
        i += 8;
    }
    while i < rows {
        copy_nonoverlapping(src.add(i * src_ld), dst.add(i * dst_ld), cols);
        write_bytes(dst.add(i * dst_ld + cols), 0, pad);
        i += 1;
    }
}

// dst[j * dst_ld + i] = src[i * src_ld + j] for i < rows, j < cols
unsafe fn transpose_into(
    src: *const f32,
    src_ld: usize,
    rows: usize,
    cols: usize,
    dst: *mut f32,
    dst_ld: usize,
    use_avx: bool,
) {
    const B: usize = 8;
    let rows_b = rows / B * B;
    let cols_b = cols / B * B;
    for i0 in (0..rows_b).step_by(B) {
        for j0 in (0..cols_b).step_by(B) {
            let s = src.add(i0 * src_ld + j0);
            let d = dst.add(j0 * dst_ld + i0);
            #[cfg(target_arch = "x86_64")]
            if use_avx {
                crate::x86_64_arch::pack_avx::transpose_8x8(s, src_ld, d, dst_ld);
                continue;
            }
            #[cfg(not(target_arch = "x86_64"))]
            let _ = use_avx;
            for i in 0..B {
                for j in 0..B {
                    *d.add(j * dst_ld + i) = *s.add(i * src_ld + j);
                }
            }
        }
    }
    // ragged right columns, then ragged bottom rows
    for i in 0..rows_b {
        for j in cols_b..cols {
            *dst.add(j * dst_ld + i) = *src.add(i * src_ld + j);
        }
    }
    for i in rows_b..rows {
        for j in 0..cols {
            *dst.add(j * dst_ld + i) = *src.add(i * src_ld + j);
        }
    }
}

/// Packs the logical `k x n` block of B into `dst`, which must hold
/// `k * round_up(n, band)` floats. With `trans` the block is stored `n x k`.
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn pack_b(
    b: *const f32,
    ldb: usize,
    trans: bool,
    k: usize,
    n: usize,
    band: usize,
    dst: *mut f32,
    use_avx: bool,
) {
    let mut j = 0;
    let mut dst = dst;
    while j < n {
        let w = band.min(n - j);
        if trans {
            transpose_into(b.add(j * ldb), ldb, w, k, dst, band, use_avx);
            if w < band {
                for p in 0..k {
                    write_bytes(dst.add(p * band + w), 0, band - w);
                }
            }
        } else {
            copy_rows(b.add(j), ldb, k, w, dst, band);
        }
        dst = dst.add(k * band);
        j += band;
    }
}

/// Packs the logical `m x k` block of A into `round_up(m, row_tile)` rows of
/// `k` floats. With `trans` the block is stored `k x m`.
#[allow(clippy::too_many_arguments)]
pub(crate) unsafe fn pack_a(
    a: *const f32,
    lda: usize,
    trans: bool,
    m: usize,
    k: usize,
    row_tile: usize,
    dst: *mut f32,
    use_avx: bool,
) {
    if trans {
        transpose_into(a, lda, k, m, dst, k, use_avx);
    } else {
        copy_rows(a, lda, m, k, dst, k);
    }
    let padded = round_up(m, row_tile);
    write_bytes(dst.add(m * k), 0, (padded - m) * k);
}

// round_up(dim, tile) * depth, None on overflow
fn padded_len(dim: usize, tile: usize, depth: usize) -> Option<usize> {
    dim.div_ceil(tile).checked_mul(tile)?.checked_mul(depth)
}

// logical (rows, cols) of the operand a stored view represents
fn logical_dims(source: &MatrixRef<'_>, transpose: Transpose) -> (usize, usize) {
    transpose.stored_dims(source.rows(), source.cols())
}

/// Packs a whole B operand. `source` is the stored matrix: `k x n`, or `n x k`
/// when `transpose` is [`Transpose::Trans`]. `band_width` must be nonzero.
pub fn pack_b_panel(source: MatrixRef<'_>, transpose: Transpose, band_width: usize) -> Result<PackedBuffer> {
    let (k, n) = logical_dims(&source, transpose);
    if k == 0 || n == 0 {
        return Err(GemmError::EmptyPanel { rows: k, cols: n });
    }
    if band_width == 0 {
        return Err(GemmError::ZeroPanelWidth { param: "band width" });
    }
    let band = band_width;
    let len = padded_len(n, band, k).ok_or(GemmError::SizeOverflow { operand: "packed B" })?;
    let mut buf = PackedBuffer::zeroed(len)?;
    let use_avx = detect_capability() >= IsaVariant::Avx;
    unsafe { pack_b(source.as_ptr(), source.ld(), transpose.is_trans(), k, n, band, buf.as_mut_ptr(), use_avx) };
    Ok(buf)
}

/// Packs a whole A operand. `source` is the stored matrix: `m x k`, or `k x m`
/// when `transpose` is [`Transpose::Trans`]. `row_tile` must be nonzero.
pub fn pack_a_panel(source: MatrixRef<'_>, transpose: Transpose, row_tile: usize) -> Result<PackedBuffer> {
    let (m, k) = logical_dims(&source, transpose);
    if m == 0 || k == 0 {
        return Err(GemmError::EmptyPanel { rows: m, cols: k });
    }
    if row_tile == 0 {
        return Err(GemmError::ZeroPanelWidth { param: "row tile" });
    }
    let tile = row_tile;
    let len = padded_len(m, tile, k).ok_or(GemmError::SizeOverflow { operand: "packed A" })?;
    let mut buf = PackedBuffer::zeroed(len)?;
    let use_avx = detect_capability() >= IsaVariant::Avx;
    unsafe { pack_a(source.as_ptr(), source.ld(), transpose.is_trans(), m, k, tile, buf.as_mut_ptr(), use_avx) };
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_matrix(rows: usize, cols: usize, ld: usize) -> Vec<f32> {
        let mut v = vec![f32::NAN; lamina_base::required_len(rows, cols, ld).unwrap()];
        for i in 0..rows {
            for j in 0..cols {
                v[i * ld + j] = (i * 100 + j) as f32;
            }
        }
        v
    }

    #[test]
    fn b_band_layout() {
        // k = 3, n = 5, band = 4: two bands, the second holds one column
        let b = seq_matrix(3, 5, 7);
        let view = MatrixRef::new(&b, 3, 5, 7).unwrap();
        let packed = pack_b_panel(view, Transpose::NoTrans, 4).unwrap();
        let p = packed.as_slice();
        assert_eq!(p.len(), 3 * 8);
        assert_eq!(&p[0..4], &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(&p[8..12], &[200.0, 201.0, 202.0, 203.0]);
        assert_eq!(&p[12..16], &[4.0, 0.0, 0.0, 0.0]);
        assert_eq!(&p[20..24], &[204.0, 0.0, 0.0, 0.0]);
        assert_eq!(p.as_ptr() as usize % PACK_ALIGN, 0);
    }

    #[test]
    fn b_transposed_matches_plain() {
        // logical k x n = 19 x 21, so both 8x8 blocks and ragged edges occur
        let (k, n) = (19, 21);
        let b = seq_matrix(k, n, n);
        let mut bt = vec![0.0; n * k];
        for p in 0..k {
            for j in 0..n {
                bt[j * k + p] = b[p * n + j];
            }
        }
        for band in [16, 32] {
            let plain = pack_b_panel(MatrixRef::new(&b, k, n, n).unwrap(), Transpose::NoTrans, band).unwrap();
            let trans = pack_b_panel(MatrixRef::new(&bt, n, k, k).unwrap(), Transpose::Trans, band).unwrap();
            assert_eq!(plain.len(), k * round_up(n, band));
            assert_eq!(plain.as_slice(), trans.as_slice());
        }
    }

    #[test]
    fn a_transposed_rows() {
        // stored k x m = 10 x 9 with ld 12, packed to round_up(9, 6) = 12 rows
        let (m, k) = (9, 10);
        let at = seq_matrix(k, m, 12);
        let packed = pack_a_panel(MatrixRef::new(&at, k, m, 12).unwrap(), Transpose::Trans, 6).unwrap();
        let p = packed.as_slice();
        assert_eq!(p.len(), 12 * k);
        for i in 0..m {
            for q in 0..k {
                assert_eq!(p[i * k + q], (q * 100 + i) as f32);
            }
        }
        assert!(p[m * k..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn scalar_and_avx_transpose_agree() {
        let (rows, cols) = (17, 11);
        let src = seq_matrix(rows, cols, 13);
        let mut d0 = vec![0.0; cols * rows];
        let mut d1 = vec![0.0; cols * rows];
        let use_avx = detect_capability() >= IsaVariant::Avx;
        unsafe {
            transpose_into(src.as_ptr(), 13, rows, cols, d0.as_mut_ptr(), rows, false);
            transpose_into(src.as_ptr(), 13, rows, cols, d1.as_mut_ptr(), rows, use_avx);
        }
        assert_eq!(d0, d1);
        assert_eq!(d0[3 * rows + 16], 1603.0);
    }

    #[test]
    fn empty_panels_rejected() {
        let data = [0.0f32; 4];
        let view = MatrixRef::new(&data, 0, 4, 4).unwrap();
        assert!(matches!(pack_b_panel(view, Transpose::NoTrans, 16), Err(GemmError::EmptyPanel { rows: 0, cols: 4 })));
        assert!(matches!(pack_a_panel(view, Transpose::Trans, 4), Err(GemmError::EmptyPanel { rows: 4, cols: 0 })));

        let view = MatrixRef::new(&data, 2, 2, 2).unwrap();
        assert!(matches!(pack_b_panel(view, Transpose::NoTrans, 0), Err(GemmError::ZeroPanelWidth { .. })));
        assert!(matches!(pack_a_panel(view, Transpose::Trans, 0), Err(GemmError::ZeroPanelWidth { .. })));
        assert!(matches!(
            pack_b_panel(view, Transpose::NoTrans, usize::MAX),
            Err(GemmError::SizeOverflow { operand: "packed B" })
        ));
    }

    #[test]
    fn oversized_buffer_reports_allocation_failure() {
        // usize::MAX / 8 floats exceed isize::MAX bytes
        assert!(matches!(PackedBuffer::zeroed(usize::MAX / 8), Err(GemmError::Allocation { .. })));
        assert!(matches!(PackedBuffer::zeroed(usize::MAX), Err(GemmError::Allocation { elems: usize::MAX, .. })));
        let buf = PackedBuffer::zeroed(3).unwrap();
        assert_eq!(buf.as_slice(), &[0.0; 3]);
        assert_eq!(buf.as_slice().as_ptr().align_offset(PACK_ALIGN), 0);
    }
}
