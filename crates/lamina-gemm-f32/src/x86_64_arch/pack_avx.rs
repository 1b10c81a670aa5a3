use std::arch::x86_64::*;

/// Transposes the 8x8 block at `src` (row stride `src_ld`) into `dst` (row
/// stride `dst_ld`): row `j` of `dst` receives column `j` of `src`.
#[target_feature(enable = "avx")]
pub(crate) unsafe fn transpose_8x8(src: *const f32, src_ld: usize, dst: *mut f32, dst_ld: usize) {
    let r0 = _mm256_loadu_ps(src);
    let r1 = _mm256_loadu_ps(src.add(src_ld));
    let r2 = _mm256_loadu_ps(src.add(src_ld * 2));
    let r3 = _mm256_loadu_ps(src.add(src_ld * 3));

    let t0 = _mm256_castps_pd(_mm256_unpacklo_ps(r0, r1));
    let t1 = _mm256_castps_pd(_mm256_unpackhi_ps(r0, r1));
    let t2 = _mm256_castps_pd(_mm256_unpacklo_ps(r2, r3));
    let t3 = _mm256_castps_pd(_mm256_unpackhi_ps(r2, r3));

    // columns {0,4}, {1,5}, {2,6}, {3,7} of the upper four rows
    let lo0 = _mm256_castpd_ps(_mm256_unpacklo_pd(t0, t2));
    let lo1 = _mm256_castpd_ps(_mm256_unpackhi_pd(t0, t2));
    let lo2 = _mm256_castpd_ps(_mm256_unpacklo_pd(t1, t3));
    let lo3 = _mm256_castpd_ps(_mm256_unpackhi_pd(t1, t3));

    let r4 = _mm256_loadu_ps(src.add(src_ld * 4));
    let r5 = _mm256_loadu_ps(src.add(src_ld * 5));
    let r6 = _mm256_loadu_ps(src.add(src_ld * 6));
    let r7 = _mm256_loadu_ps(src.add(src_ld * 7));

    let t0 = _mm256_castps_pd(_mm256_unpacklo_ps(r4, r5));
    let t1 = _mm256_castps_pd(_mm256_unpackhi_ps(r4, r5));
    let t2 = _mm256_castps_pd(_mm256_unpacklo_ps(r6, r7));
    let t3 = _mm256_castps_pd(_mm256_unpackhi_ps(r6, r7));

    let hi0 = _mm256_castpd_ps(_mm256_unpacklo_pd(t0, t2));
    let hi1 = _mm256_castpd_ps(_mm256_unpackhi_pd(t0, t2));
    let hi2 = _mm256_castpd_ps(_mm256_unpacklo_pd(t1, t3));
    let hi3 = _mm256_castpd_ps(_mm256_unpackhi_pd(t1, t3));

    // join the 128-bit halves of matching columns
    _mm256_storeu_ps(dst, _mm256_permute2f128_ps(lo0, hi0, 0b0010_0000));
    _mm256_storeu_ps(dst.add(dst_ld), _mm256_permute2f128_ps(lo1, hi1, 0b0010_0000));
    _mm256_storeu_ps(dst.add(dst_ld * 2), _mm256_permute2f128_ps(lo2, hi2, 0b0010_0000));
    _mm256_storeu_ps(dst.add(dst_ld * 3), _mm256_permute2f128_ps(lo3, hi3, 0b0010_0000));
    _mm256_storeu_ps(dst.add(dst_ld * 4), _mm256_permute2f128_ps(lo0, hi0, 0b0011_0001));
    _mm256_storeu_ps(dst.add(dst_ld * 5), _mm256_permute2f128_ps(lo1, hi1, 0b0011_0001));
    _mm256_storeu_ps(dst.add(dst_ld * 6), _mm256_permute2f128_ps(lo2, hi2, 0b0011_0001));
    _mm256_storeu_ps(dst.add(dst_ld * 7), _mm256_permute2f128_ps(lo3, hi3, 0b0011_0001));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_block() {
        if !is_x86_feature_detected!("avx") {
            return;
        }
        // 8x8 block inside a 8x11 matrix, written into a 8x9 matrix
        let src: Vec<f32> = (0..88).map(|x| x as f32).collect();
        let mut dst = vec![-1.0f32; 72];
        unsafe { transpose_8x8(src.as_ptr().add(2), 11, dst.as_mut_ptr(), 9) };
        for i in 0..8 {
            for j in 0..8 {
                assert_eq!(dst[j * 9 + i], src[i * 11 + j + 2]);
            }
            assert_eq!(dst[i * 9 + 8], -1.0);
        }
    }
}
