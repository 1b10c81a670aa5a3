use bench::hardware::get_benchmark_config;
use bench::{bench_type_from_str, layout_from_str, sgemm_for, GemmProblem};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Times lamina sgemm for one problem size
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// number of repeats
    #[arg(short = 'r', long, default_value_t = 5)]
    n_repeats: usize,

    /// dim m
    #[arg(short, long, default_value_t = 200)]
    m: usize,

    /// dim n
    #[arg(short, long, default_value_t = 200)]
    n: usize,

    /// dim k
    #[arg(short, long, default_value_t = 200)]
    k: usize,

    /// batch dim
    #[arg(short, long, default_value_t = 5)]
    batch_dim: usize,

    /// transpose layout: nn, nt, tn or tt
    #[arg(short, long, default_value_t = String::from("nn"))]
    t_layout: String,

    /// compare one run against the f64 reference
    #[arg(short, long, default_value_t = false)]
    check: bool,

    /// force a kernel variant: baseline, avx, avx2fma3 or avx512f
    #[arg(short, long)]
    isa: Option<String>,

    /// sgemm or sgemm_batched
    #[arg(short = 'y', long, default_value_t = String::from("sgemm"))]
    bench_type: String,

    /// print the hardware config as json
    #[arg(long, default_value_t = false)]
    hw: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    if args.hw {
        println!("{}", serde_json::to_string_pretty(&get_benchmark_config())?);
    }
    let layout = layout_from_str(&args.t_layout).ok_or_else(|| format!("unsupported layout {}", args.t_layout))?;
    let bench_type =
        bench_type_from_str(&args.bench_type).ok_or_else(|| format!("unsupported bench type {}", args.bench_type))?;
    let gemm = sgemm_for(args.isa.as_deref())?;
    let (alpha, beta) = (1.0, 1.0);

    let mut problem = GemmProblem::new(args.m, args.n, args.k, args.batch_dim, layout);
    if args.check {
        let diff = problem.check(&gemm, alpha, beta)?;
        println!("diff: {}", diff);
    }

    let mut total_time = 0.0;
    let mut best_time = f64::INFINITY;
    for _ in 0..args.n_repeats {
        let end_time = problem.run(&gemm, bench_type, alpha, beta)?;
        total_time += end_time;
        println!("time: {}, total_time: {}", end_time, total_time);
        best_time = best_time.min(end_time);
    }
    let gflops = problem.flops() / best_time / 1e9;
    println!("isa: {}, best_time: {}, GFLOPS: {}", gemm.isa(), best_time, gflops);
    Ok(())
}
