use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sieving_isd::*;

fn bench_cost_models(c: &mut Criterion) {
    let g = Geometry::new(0.3);

    c.bench_function("wedge_size", |b| {
        b.iter(|| black_box(g.wedge_size(black_box(0.4), black_box(0.1), None)));
    });

    let qw = Algorithm::RpcQuantumWalkReusable.model(g);
    let knobs = [0.4, 0.1, 0.02, 0.05, 0.01];
    c.bench_function("reusable_walk_runtime", |b| {
        b.iter(|| black_box(qw.runtime(black_box(&knobs))));
    });
}

fn bench_optimize(c: &mut Criterion) {
    let config = OptimizerConfig {
        iters: 1,
        prec: 1e-7,
        ..OptimizerConfig::default()
    };
    let model = Algorithm::RpcGrover.model(Geometry::new(0.3));

    c.bench_function("optimize_grover_single_restart", |b| {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        b.iter(|| {
            if let Some(problem) = model.problem() {
                let _ = black_box(optimize(&problem, &config, &mut rng));
            }
        });
    });

    c.bench_function("quantum_prange", |b| {
        b.iter(|| black_box(quantum_prange(black_box(0.5))));
    });
}

criterion_group!(benches, bench_cost_models, bench_optimize);
criterion_main!(benches);
