//! Portable kernels on plain `[f32; 8]` lanes, left to the compiler to
//! vectorize. Ragged columns go through a scalar cleanup loop.

use crate::ukernel::def_sgemm_kernel;

const VS: usize = 8;

type V = [f32; VS];

#[inline(always)]
fn v_zero() -> V {
    [0.0; VS]
}

#[inline(always)]
fn v_splat(x: f32) -> V {
    [x; VS]
}

#[inline(always)]
unsafe fn v_loadu(p: *const f32) -> V {
    core::ptr::read_unaligned(p as *const V)
}

#[inline(always)]
unsafe fn v_storeu(p: *mut f32, v: V) {
    core::ptr::write_unaligned(p as *mut V, v)
}

#[inline(always)]
fn v_mul(a: V, b: V) -> V {
    let mut out = a;
    for i in 0..VS {
        out[i] *= b[i];
    }
    out
}

#[inline(always)]
fn v_fmadd(a: V, b: V, c: V) -> V {
    let mut out = c;
    for i in 0..VS {
        out[i] += a[i] * b[i];
    }
    out
}

#[inline(always)]
unsafe fn v_load_partial(p: *const f32, n: usize) -> V {
    let mut out = v_zero();
    for (i, x) in out.iter_mut().enumerate().take(n) {
        *x = *p.add(i);
    }
    out
}

#[inline(always)]
unsafe fn v_store_partial(p: *mut f32, v: V, n: usize) {
    for (i, x) in v.iter().enumerate().take(n) {
        *p.add(i) = *x;
    }
}

def_sgemm_kernel!(#[inline(never)] rows: 4, 2, 1);
