use std::arch::x86_64::*;

use crate::ukernel::def_sgemm_kernel;

const VS: usize = 8;

type V = __m256;

static MASK: [i32; 16] = [-1, -1, -1, -1, -1, -1, -1, -1, 0, 0, 0, 0, 0, 0, 0, 0];

#[inline(always)]
unsafe fn mask(n: usize) -> __m256i {
    _mm256_loadu_si256(MASK.as_ptr().add(VS - n) as *const __m256i)
}

#[inline(always)]
unsafe fn v_zero() -> V {
    _mm256_setzero_ps()
}

#[inline(always)]
unsafe fn v_splat(x: f32) -> V {
    _mm256_set1_ps(x)
}

#[inline(always)]
unsafe fn v_loadu(p: *const f32) -> V {
    _mm256_loadu_ps(p)
}

#[inline(always)]
unsafe fn v_storeu(p: *mut f32, v: V) {
    _mm256_storeu_ps(p, v)
}

#[inline(always)]
unsafe fn v_mul(a: V, b: V) -> V {
    _mm256_mul_ps(a, b)
}

#[inline(always)]
unsafe fn v_fmadd(a: V, b: V, c: V) -> V {
    _mm256_fmadd_ps(a, b, c)
}

#[inline(always)]
unsafe fn v_load_partial(p: *const f32, n: usize) -> V {
    _mm256_maskload_ps(p, mask(n))
}

#[inline(always)]
unsafe fn v_store_partial(p: *mut f32, v: V, n: usize) {
    _mm256_maskstore_ps(p, mask(n), v)
}

def_sgemm_kernel!(#[target_feature(enable = "avx,avx2,fma")] rows: 6, 3, 2, 1);
