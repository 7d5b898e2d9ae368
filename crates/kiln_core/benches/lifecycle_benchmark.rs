//! # Lifecycle Benchmark
//!
//! Measures the per-tick cost of the phased update and of pool churn.
//!
//! Run with: `cargo bench --package kiln_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use kiln_core::{Action, ActionContext, Entity, EntityId, EntityPool, MeshRenderer};

const POOL_SIZE: usize = 10_000;

struct Drift(Vec3);
impl Action for Drift {
    fn update(&mut self, ctx: &mut ActionContext<'_>) {
        let step = self.0 * ctx.delta();
        ctx.translate(step);
    }
}

struct Countdown(u32);
impl Action for Countdown {
    fn update(&mut self, ctx: &mut ActionContext<'_>) {
        self.0 = self.0.saturating_sub(1);
        if self.0 == 0 {
            ctx.kill();
        }
    }
}

struct Blinker;
impl Action for Blinker {
    fn update(&mut self, ctx: &mut ActionContext<'_>) {
        ctx.remove_action::<Blinker>().ok();
        ctx.add_action(Blinker);
    }
}

/// Benchmark: steady-state updates with no structural changes.
fn bench_steady_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_updates");

    for count in [1_000, POOL_SIZE] {
        let mut pool = EntityPool::new(count, MeshRenderer::default());
        while let Some(entity) = pool.get() {
            entity.add_action(Drift(Vec3::X));
        }
        pool.update(0.016);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                pool.update(0.016);
                black_box(pool.alive_count())
            });
        });
    }

    group.finish();
}

/// Benchmark: an action that removes and re-adds itself every tick.
fn bench_deferred_churn(c: &mut Criterion) {
    let mut entity = Entity::new(EntityId::new(0, 0));
    entity.add_action(Blinker);

    c.bench_function("deferred_readd_single_entity", |b| {
        b.iter(|| {
            entity.update(0.016);
            black_box(entity.actions().len())
        });
    });
}

/// Benchmark: spawn a full pool, let every entity expire, repeat.
fn bench_pool_churn(c: &mut Criterion) {
    let mut pool = EntityPool::new(POOL_SIZE, MeshRenderer::default());

    c.bench_function("pool_spawn_expire_10K", |b| {
        b.iter(|| {
            while let Some(entity) = pool.get() {
                entity.add_action(Countdown(1));
            }
            pool.update(0.016);
            black_box(pool.dead_count())
        });
    });
}

criterion_group!(
    benches,
    bench_steady_updates,
    bench_deferred_churn,
    bench_pool_churn
);
criterion_main!(benches);
