use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use bench::{BenchType, GemmProblem};
use lamina_dev::ABLayout;
use lamina_gemm_f32::{IsaVariant, Sgemm};

const DIMS: [usize; 4] = [64, 128, 256, 512];

fn bench_square(c: &mut Criterion) {
    let mut group = c.benchmark_group("sgemm_square");
    for isa in IsaVariant::ALL {
        // variants the cpu cannot run are skipped
        let Ok(gemm) = Sgemm::with_isa(isa) else {
            continue;
        };
        for dim in DIMS {
            let mut problem = GemmProblem::new(dim, dim, dim, 1, ABLayout::NN);
            group.throughput(Throughput::Elements(problem.flops() as u64));
            group.bench_with_input(BenchmarkId::new(isa.name(), dim), &dim, |b, _| {
                b.iter(|| problem.run(&gemm, BenchType::SGemm, 1.0, 0.0).unwrap())
            });
        }
    }
    group.finish();
}

// narrow output with tall inner dimension, exercises the masked tail path
fn bench_ragged(c: &mut Criterion) {
    let mut group = c.benchmark_group("sgemm_ragged");
    let gemm = Sgemm::new();
    for (m, n, k) in [(1, 17, 1024), (7, 33, 512), (129, 15, 256)] {
        let mut problem = GemmProblem::new(m, n, k, 1, ABLayout::NT);
        group.bench_function(BenchmarkId::new(gemm.isa().name(), format!("{m}x{n}x{k}")), |b| {
            b.iter(|| problem.run(&gemm, BenchType::SGemm, 1.0, 1.0).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(2))
        .sample_size(10);
    targets = bench_square, bench_ragged
);
criterion_main!(benches);
