/// Generates the micro-kernel of one isa variant.
///
/// Expects at the call site: the vector type `V`, the lane count `VS` and the
/// vector helpers `v_zero`, `v_splat`, `v_loadu`, `v_storeu`, `v_mul`,
/// `v_fmadd` (`a*b + c`), `v_load_partial`, `v_store_partial`. The attribute
/// is applied to every row-tile entry point, row tiles are listed in
/// descending order.
///
/// B must be packed in bands of `2 * VS` columns (see [`crate::pack`]). A is
/// read row-major with leading dimension `lda`.
macro_rules! def_sgemm_kernel {
    (#$attr:tt rows: $($rows:tt),+) => {
        pub(crate) const BAND: usize = 2 * VS;
        pub(crate) const ROW_TILES: &[usize] = &[$($rows),+];

        #[inline(always)]
        unsafe fn accumulate<const ROWS: usize, const NV: usize>(
            a: *const f32,
            lda: usize,
            b: *const f32,
            k: usize,
        ) -> [[V; NV]; ROWS] {
            let mut acc = [[v_zero(); NV]; ROWS];
            let mut bv = [v_zero(); NV];
            for p in 0..k {
                let bp = b.add(p * BAND);
                for v in 0..NV {
                    bv[v] = v_loadu(bp.add(v * VS));
                }
                for r in 0..ROWS {
                    let av = v_splat(*a.add(r * lda + p));
                    for v in 0..NV {
                        acc[r][v] = v_fmadd(av, bv[v], acc[r][v]);
                    }
                }
            }
            acc
        }

        // `n_last` is the number of valid lanes of the last vector in each row
        #[inline(always)]
        unsafe fn store<const ROWS: usize, const NV: usize>(
            acc: &[[V; NV]; ROWS],
            c: *mut f32,
            ldc: usize,
            n_last: usize,
            alpha: f32,
            zero_mode: bool,
        ) {
            let alpha_v = v_splat(alpha);
            for r in 0..ROWS {
                let c_row = c.add(r * ldc);
                for v in 0..NV {
                    let cv = c_row.add(v * VS);
                    let lanes = if v + 1 == NV { n_last } else { VS };
                    if lanes == VS {
                        let out = if zero_mode {
                            v_mul(acc[r][v], alpha_v)
                        } else {
                            v_fmadd(acc[r][v], alpha_v, v_loadu(cv))
                        };
                        v_storeu(cv, out);
                    } else {
                        let out = if zero_mode {
                            v_mul(acc[r][v], alpha_v)
                        } else {
                            v_fmadd(acc[r][v], alpha_v, v_load_partial(cv, lanes))
                        };
                        v_store_partial(cv, out, lanes);
                    }
                }
            }
        }

        #[inline(always)]
        unsafe fn kernel_rows<const ROWS: usize>(
            a: *const f32,
            b: *const f32,
            c: *mut f32,
            k: usize,
            n: usize,
            lda: usize,
            ldc: usize,
            alpha: f32,
            zero_mode: bool,
        ) {
            let mut b = b;
            let mut c = c;
            let mut n_left = n;
            while n_left >= BAND {
                let acc = accumulate::<ROWS, 2>(a, lda, b, k);
                store::<ROWS, 2>(&acc, c, ldc, VS, alpha, zero_mode);
                b = b.add(k * BAND);
                c = c.add(BAND);
                n_left -= BAND;
            }
            if n_left > VS {
                let acc = accumulate::<ROWS, 2>(a, lda, b, k);
                store::<ROWS, 2>(&acc, c, ldc, n_left - VS, alpha, zero_mode);
            } else if n_left > 0 {
                // half band: a single, possibly partial, vector
                let acc = accumulate::<ROWS, 1>(a, lda, b, k);
                store::<ROWS, 1>(&acc, c, ldc, n_left, alpha, zero_mode);
            }
        }

        paste::paste! {
            $(
                #$attr
                unsafe fn [<ukernel_ $rows xn>](
                    a: *const f32,
                    b: *const f32,
                    c: *mut f32,
                    k: usize,
                    n: usize,
                    lda: usize,
                    ldc: usize,
                    alpha: f32,
                    zero_mode: bool,
                ) {
                    kernel_rows::<$rows>(a, b, c, k, n, lda, ldc, alpha, zero_mode);
                }
            )+

            /// Computes the largest row tile that fits in `m` over all `n`
            /// columns and returns its height.
            #[allow(clippy::too_many_arguments)]
            pub(crate) unsafe fn kernel(
                a: *const f32,
                b: *const f32,
                c: *mut f32,
                k: usize,
                m: usize,
                n: usize,
                lda: usize,
                ldc: usize,
                alpha: f32,
                zero_mode: bool,
            ) -> usize {
                $(
                    if m >= $rows {
                        [<ukernel_ $rows xn>](a, b, c, k, n, lda, ldc, alpha, zero_mode);
                        return $rows;
                    }
                )+
                0
            }
        }
    };
}

pub(crate) use def_sgemm_kernel;
