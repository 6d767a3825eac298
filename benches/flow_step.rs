//! Benchmarks for the host reference step and shader assembly.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use flowcloud::flow::{self, SimulationParameters};
use flowcloud::geometry::BaseGeometry;
use flowcloud::noise::noise3;
use flowcloud::shader;
use flowcloud::state::InitialState;

fn bench_noise(c: &mut Criterion) {
    c.bench_function("noise3", |b| {
        let p = Vec3::new(0.3, -1.2, 4.7);
        b.iter(|| black_box(noise3(black_box(p))))
    });
}

fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance");
    let params = SimulationParameters::default();

    for count in [1_024u32, 16_641] {
        let geometry = BaseGeometry::fibonacci_sphere(0.02, count);
        let state = InitialState::generate(geometry.positions(), 0.25, &mut StdRng::seed_from_u64(1));
        let mut next = state.textures.1.clone();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                black_box(flow::advance(
                    &state.textures.0,
                    &state.base,
                    &mut next,
                    1.0,
                    0.016,
                    &params,
                ))
            })
        });
    }

    group.finish();
}

fn bench_initialize(c: &mut Criterion) {
    let geometry = BaseGeometry::uv_sphere(0.02, 128, 128);
    c.bench_function("initialize_default_sphere", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(7);
            black_box(InitialState::generate(geometry.positions(), 0.25, &mut rng))
        })
    });
}

fn bench_shader_assembly(c: &mut Criterion) {
    c.bench_function("compute_shader", |b| b.iter(|| black_box(shader::compute_shader())));
}

criterion_group!(benches, bench_noise, bench_advance, bench_initialize, bench_shader_assembly);
criterion_main!(benches);
