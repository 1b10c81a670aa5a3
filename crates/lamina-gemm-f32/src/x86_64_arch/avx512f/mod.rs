use std::arch::x86_64::*;

use crate::ukernel::def_sgemm_kernel;

const VS: usize = 16;

type V = __m512;

#[inline(always)]
fn mask(n: usize) -> __mmask16 {
    ((1u32 << n) - 1) as __mmask16
}

#[inline(always)]
unsafe fn v_zero() -> V {
    _mm512_setzero_ps()
}

#[inline(always)]
unsafe fn v_splat(x: f32) -> V {
    _mm512_set1_ps(x)
}

#[inline(always)]
unsafe fn v_loadu(p: *const f32) -> V {
    _mm512_loadu_ps(p)
}

#[inline(always)]
unsafe fn v_storeu(p: *mut f32, v: V) {
    _mm512_storeu_ps(p, v)
}

#[inline(always)]
unsafe fn v_mul(a: V, b: V) -> V {
    _mm512_mul_ps(a, b)
}

#[inline(always)]
unsafe fn v_fmadd(a: V, b: V, c: V) -> V {
    _mm512_fmadd_ps(a, b, c)
}

// masked lanes are neither read nor written, so no fault past the end of C
#[inline(always)]
unsafe fn v_load_partial(p: *const f32, n: usize) -> V {
    _mm512_maskz_loadu_ps(mask(n), p)
}

#[inline(always)]
unsafe fn v_store_partial(p: *mut f32, v: V, n: usize) {
    _mm512_mask_storeu_ps(p, mask(n), v)
}

def_sgemm_kernel!(#[target_feature(enable = "avx512f")] rows: 12, 6, 3, 2, 1);
