//! # Batch Upload Benchmark
//!
//! Measures the per-frame cost of writing every member into the heap and
//! handing the heap to a drawable.
//!
//! Run with: `cargo bench --package kiln_rendering`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::Vec3;
use kiln_core::{EntityId, MaterialHandle, MeshHandle, Transform};
use kiln_rendering::{
    BatchRoot, BatchRule, BatchedInstance, HeadlessDrawable, ModelMatrixRule, TintedSpriteRule,
    TransformRule, UsageHint,
};

fn filled<R: BatchRule>(count: usize) -> BatchRoot<R, HeadlessDrawable> {
    let mut batch = BatchRoot::new(
        count,
        MeshHandle::new(0),
        MaterialHandle::new(0),
        HeadlessDrawable::new(),
        UsageHint::Stream,
    );
    for i in 0..count {
        let position = Vec3::new(i as f32, (i % 7) as f32, 0.0);
        batch.add(BatchedInstance::with_transform(
            EntityId::new(i as u32, 0),
            Transform::from_position(position),
        ));
    }
    batch
}

fn bench_rule<R: BatchRule>(c: &mut Criterion, name: &str) {
    let mut group = c.benchmark_group(name);

    for count in [1_000, 10_000, 100_000] {
        let mut batch = filled::<R>(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                batch.upload_instances();
                black_box(batch.stats().bytes_uploaded)
            });
        });
    }

    group.finish();
}

/// Benchmark: one POD record per member.
fn bench_transform_upload(c: &mut Criterion) {
    bench_rule::<TransformRule>(c, "upload_transform");
}

/// Benchmark: three field writes plus a component lookup per member.
fn bench_sprite_upload(c: &mut Criterion) {
    bench_rule::<TintedSpriteRule>(c, "upload_tinted_sprite");
}

/// Benchmark: matrix composition per member.
fn bench_matrix_upload(c: &mut Criterion) {
    bench_rule::<ModelMatrixRule>(c, "upload_model_matrix");
}

/// Benchmark: remove and re-add the first member (swap-with-last path).
fn bench_swap_remove(c: &mut Criterion) {
    let mut batch = filled::<TransformRule>(10_000);
    let mut handle = batch.iter().next().map(|(handle, _)| handle);

    c.bench_function("swap_remove_readd_10K", |b| {
        b.iter(|| {
            if let Some(current) = handle {
                let member = batch.remove(current).unwrap();
                let fresh = BatchedInstance::with_transform(member.id(), *member.transform());
                handle = Some(batch.add(fresh));
            }
            black_box(batch.batch_size())
        });
    });
}

criterion_group!(
    benches,
    bench_transform_upload,
    bench_sprite_upload,
    bench_matrix_upload,
    bench_swap_remove
);
criterion_main!(benches);
