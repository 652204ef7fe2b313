use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use simd_gemm::prelude::*;
use simd_gemm::KernelTable;

fn operands(m: usize, n: usize, k: usize) -> (Vec<f32>, Vec<f32>) {
    let a: Vec<f32> = (0..m * k).map(|i| ((i % 1000) as f32) * 0.001).collect();
    let b: Vec<f32> = (0..k * n)
        .map(|i| (((i + 500) % 1000) as f32) * 0.001)
        .collect();
    (a, b)
}

fn flops(m: usize, n: usize, k: usize) -> u64 {
    2 * (m * n * k) as u64
}

fn bench_sgemm_nn(c: &mut Criterion) {
    let mut group = c.benchmark_group("sgemm_nn");
    group.sample_size(20);

    for size in [64, 128, 256, 512, 1024].iter() {
        let n = *size;
        let (a, b) = operands(n, n, n);
        let mut out = vec![0.0f32; n * n];

        group.throughput(Throughput::Elements(flops(n, n, n)));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, &n| {
            bench.iter(|| {
                sgemm_nn(n, n, n, 1.0, &a, n, &b, n, 0.0, &mut out, n).unwrap();
                black_box(&out);
            });
        });
    }

    group.finish();
}

fn bench_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("sgemm_nn_levels");
    group.sample_size(20);

    let n = 256;
    let (a, b) = operands(n, n, n);
    let mut out = vec![0.0f32; n * n];
    group.throughput(Throughput::Elements(flops(n, n, n)));

    for level in SimdLevel::supported_levels() {
        let Some(table) = KernelTable::for_level(level) else {
            continue;
        };
        group.bench_function(BenchmarkId::new(level.to_string(), n), |bench| {
            bench.iter(|| unsafe {
                table.gemm_nn(
                    n,
                    n,
                    n,
                    1.0,
                    a.as_ptr(),
                    n,
                    b.as_ptr(),
                    n,
                    0.0,
                    out.as_mut_ptr(),
                    n,
                );
                black_box(&out);
            });
        });
    }

    group.finish();
}

fn bench_prepacked(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepacked");
    group.sample_size(20);

    // Inference-like shapes: few rows of A against one large reused B.
    for &(m, n, k) in &[(1, 1024, 1024), (8, 1024, 1024), (64, 512, 512), (256, 256, 256)] {
        let (a, b) = operands(m, n, k);
        let mut out = vec![0.0f32; m * n];
        let Ok(mut plan) = PrepackedPlan::new(m, n, k) else {
            continue;
        };
        let Ok(packed) = plan.pack_b(&b, n) else {
            continue;
        };
        let id = format!("{m}x{n}x{k}");

        group.throughput(Throughput::Elements(flops(m, n, k)));
        group.bench_function(BenchmarkId::new("run", &id), |bench| {
            bench.iter(|| {
                plan.run(&a, &packed, &mut out).unwrap();
                black_box(&out);
            });
        });
        group.bench_function(BenchmarkId::new("repack", &id), |bench| {
            bench.iter(|| {
                sgemm_nn(m, n, k, 1.0, &a, k, &b, n, 0.0, &mut out, n).unwrap();
                black_box(&out);
            });
        });
    }

    group.finish();
}

fn bench_sgemm_nt(c: &mut Criterion) {
    let mut group = c.benchmark_group("sgemm_nt");
    group.sample_size(20);

    for size in [64, 256, 512].iter() {
        let n = *size;
        let (a, bt) = operands(n, n, n);
        let mut out = vec![0.0f32; n * n];

        group.throughput(Throughput::Elements(flops(n, n, n)));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, &n| {
            bench.iter(|| {
                sgemm_nt(n, n, n, 1.0, &a, n, &bt, n, 0.0, &mut out, n).unwrap();
                black_box(&out);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sgemm_nn,
    bench_levels,
    bench_prepacked,
    bench_sgemm_nt
);
criterion_main!(benches);
