pub mod hardware;

use std::time::Instant;

use lamina_base::{Result, Transpose};
use lamina_dev::{check_gemm_f32, layout_to_lds, random_matrix_seeded, ABLayout};
use lamina_gemm_f32::Sgemm;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BenchType {
    SGemm,
    SGemmBatched,
}

pub fn bench_type_from_str(bench_type_str: &str) -> Option<BenchType> {
    match bench_type_str {
        "sgemm" => Some(BenchType::SGemm),
        "sgemm_batched" => Some(BenchType::SGemmBatched),
        _ => None,
    }
}

pub fn layout_from_str(layout_str: &str) -> Option<ABLayout> {
    match layout_str {
        "nn" => Some(ABLayout::NN),
        "nt" => Some(ABLayout::NT),
        "tn" => Some(ABLayout::TN),
        "tt" => Some(ABLayout::TT),
        _ => None,
    }
}

/// Operands of one benchmark run, filled with seeded uniform values.
pub struct GemmProblem {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub batch: usize,
    pub layout: ABLayout,
    pub a: Vec<f32>,
    pub b: Vec<f32>,
    pub c: Vec<f32>,
}

impl GemmProblem {
    pub fn new(m: usize, n: usize, k: usize, batch: usize, layout: ABLayout) -> Self {
        let batch = batch.max(1);
        let mut a = vec![0.0; batch * m * k];
        let mut b = vec![0.0; batch * k * n];
        let mut c = vec![0.0; batch * m * n];
        random_matrix_seeded(&mut a, 1);
        random_matrix_seeded(&mut b, 2);
        random_matrix_seeded(&mut c, 3);
        Self { m, n, k, batch, layout, a, b, c }
    }

    pub fn flops(&self) -> f64 {
        2.0 * self.batch as f64 * self.m as f64 * self.n as f64 * self.k as f64
    }

    /// Runs the problem once and returns the elapsed time in seconds.
    pub fn run(&mut self, gemm: &Sgemm, bench_type: BenchType, alpha: f32, beta: f32) -> Result<f64> {
        let (trans_a, trans_b) = self.layout.transposes();
        let (trans_a, trans_b) = (Transpose::from(trans_a), Transpose::from(trans_b));
        let (lda, ldb, ldc) = layout_to_lds(self.layout, self.m, self.n, self.k);
        let (m, n, k) = (self.m, self.n, self.k);
        let start_time = Instant::now();
        match bench_type {
            BenchType::SGemm => {
                gemm.gemm(trans_a, trans_b, m, n, k, alpha, &self.a, lda, &self.b, ldb, beta, &mut self.c, ldc)?
            }
            BenchType::SGemmBatched => gemm.gemm_batched(
                self.batch,
                trans_a,
                trans_b,
                m,
                n,
                k,
                alpha,
                &self.a,
                lda,
                m * k,
                &self.b,
                ldb,
                k * n,
                beta,
                &mut self.c,
                ldc,
                m * n,
            )?,
        }
        Ok(start_time.elapsed().as_secs_f64())
    }

    /// Largest relative difference of a single gemm against the f64 reference.
    pub fn check(&self, gemm: &Sgemm, alpha: f32, beta: f32) -> Result<f64> {
        let (trans_a, trans_b) = self.layout.transposes();
        let (lda, ldb, ldc) = layout_to_lds(self.layout, self.m, self.n, self.k);
        let (m, n, k) = (self.m, self.n, self.k);
        let (a, b) = (&self.a[..m * k], &self.b[..k * n]);
        let mut c = self.c[..m * n].to_vec();
        let mut c_ref = c.clone();
        gemm.gemm(trans_a.into(), trans_b.into(), m, n, k, alpha, a, lda, b, ldb, beta, &mut c, ldc)?;
        Ok(check_gemm_f32(trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, &c, &mut c_ref, ldc))
    }
}

/// Parses the `--isa` argument; `None` keeps the process-wide variant.
pub fn sgemm_for(isa: Option<&str>) -> Result<Sgemm> {
    match isa {
        None => Ok(Sgemm::new()),
        Some(s) => Sgemm::with_isa(s.parse()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_problem_checks_out() {
        let mut p = GemmProblem::new(17, 9, 33, 2, ABLayout::NT);
        let gemm = sgemm_for(Some("baseline")).unwrap();
        assert!(p.run(&gemm, BenchType::SGemmBatched, 1.0, 0.0).unwrap() >= 0.0);
        assert!(p.check(&gemm, 1.0, 1.0).unwrap() < lamina_dev::EPS);
        assert!(sgemm_for(Some("mmx")).is_err());
        assert_eq!(bench_type_from_str("sgemm"), Some(BenchType::SGemm));
        assert!(layout_from_str("xx").is_none());
    }
}
