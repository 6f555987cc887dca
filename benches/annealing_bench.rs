use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use edge_alloc::algorithms::{AnnealingParams, SimulatedAnnealing};
use edge_alloc::dataset::SyntheticSource;
use edge_alloc::metrics::Inputs;
use edge_alloc::precalc::pre_calculation;
use edge_alloc::state::RunState;
use rand::rngs::StdRng;
use rand::SeedableRng;

const ALPHAS: [f64; 3] = [0.8, 0.9, 0.95];

fn build_state() -> RunState {
    let inputs = Inputs {
        devices: 300,
        edge_servers: 40,
        cloud_servers: 4,
        tech: 3,
    };
    pre_calculation(inputs, &mut SyntheticSource::new(11)).expect("synthetic scenario")
}

fn bench_annealing(c: &mut Criterion) {
    let mut group = c.benchmark_group("annealing");
    group.sample_size(20);
    let base = build_state();

    for alpha in ALPHAS {
        let annealer = SimulatedAnnealing::new(AnnealingParams {
            temperature: 100.0,
            alpha,
        });
        group.bench_with_input(
            BenchmarkId::new("alpha", alpha),
            &base,
            |b, base: &RunState| {
                b.iter_batched(
                    || (base.clone(), StdRng::seed_from_u64(3)),
                    |(mut state, mut rng)| {
                        let stats = annealer.anneal(&mut state, &mut rng);
                        black_box((stats.accepted, state.metrics.outputs.total_cost));
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_annealing);
criterion_main!(benches);
