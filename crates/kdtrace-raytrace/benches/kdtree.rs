//! Benchmarks for kd-tree construction and closest-hit queries.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kdtrace_math::Interval;
use kdtrace_raytrace::random::{random_rays, random_spheres};
use kdtrace_raytrace::{Hittable, KdTreeSettings};

const FORWARD: Interval = Interval::new(0.001, f64::INFINITY);

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    let settings = KdTreeSettings::default();

    for count in [100usize, 1_000, 10_000] {
        let world = random_spheres(count, 50.0, 1);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &world, |b, world| {
            b.iter(|| world.build_kdtree(black_box(&settings)).unwrap())
        });
    }

    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse");
    let world = random_spheres(1_000, 50.0, 1);
    let tree = world.build_kdtree(&KdTreeSettings::default()).unwrap();
    let rays = random_rays(1_000, 50.0, 2);
    group.throughput(Throughput::Elements(rays.len() as u64));

    group.bench_function("kdtree", |b| {
        b.iter(|| {
            rays.iter()
                .filter(|ray| tree.intersect(black_box(ray), FORWARD).is_some())
                .count()
        })
    });

    group.bench_function("brute_force", |b| {
        b.iter(|| {
            rays.iter()
                .filter(|ray| world.hit(black_box(ray), FORWARD).is_some())
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_traverse);
criterion_main!(benches);
