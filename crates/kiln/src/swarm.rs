//! # Swarm Scene
//!
//! The headless demo: one pool of drifting, spinning, self-expiring
//! entities and one batch of tinted sprites that fade out and are
//! replaced. Both refill themselves at the end of every update phase.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec3, Vec4};
use kiln_core::{EntityId, EntityPool, MaterialHandle, MeshHandle, MeshRenderer, Phased};
use kiln_rendering::{
    BatchRoot, BatchStats, BatchedInstance, HeadlessDrawable, SpriteTint, TintedSpriteRule,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::SimulationConfig;
use crate::frame::FrameLoop;
use crate::gameplay::{Drift, Fade, Lifetime, Pulse, Spin, Velocity};

/// Mesh shared by pooled entities.
pub const POOL_MESH: MeshHandle = MeshHandle::new(1);
/// Material shared by pooled entities.
pub const POOL_MATERIAL: MaterialHandle = MaterialHandle::new(1);
/// Mesh drawn by the sprite batch.
pub const SPRITE_MESH: MeshHandle = MeshHandle::new(2);
/// Material drawn by the sprite batch.
pub const SPRITE_MATERIAL: MaterialHandle = MaterialHandle::new(2);

/// Pool share refilled per frame.
const SPAWN_DIVISOR: usize = 32;

/// Counters shared by the scene's participants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwarmReport {
    /// Entities taken from the pool.
    pub spawned: u64,
    /// Entities returned to the pool.
    pub expired: u64,
    /// Most entities alive at the end of an update phase.
    pub peak_alive: usize,
    /// Members joined to the batch.
    pub joined: u64,
    /// Members dropped from the batch.
    pub left: u64,
    /// Upload statistics of the batch.
    pub batch: BatchStats,
}

/// Shared handle to a [`SwarmReport`].
pub type SharedReport = Rc<RefCell<SwarmReport>>;

fn random_unit(rng: &mut ChaCha8Rng) -> Vec3 {
    let v = Vec3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    v.try_normalize().unwrap_or(Vec3::X)
}

// =============================================================================
// EMITTER
// =============================================================================

/// Pooled entities that drift outward and expire.
pub struct Emitter {
    pool: EntityPool,
    rng: ChaCha8Rng,
    spawn_per_frame: usize,
    report: SharedReport,
}

impl Emitter {
    /// Creates an emitter over a pool of `pool_size` entities.
    #[must_use]
    pub fn new(pool_size: usize, rng: ChaCha8Rng, report: SharedReport) -> Self {
        Self {
            pool: EntityPool::new(pool_size, MeshRenderer::new(POOL_MESH, POOL_MATERIAL)),
            rng,
            spawn_per_frame: (pool_size / SPAWN_DIVISOR).max(1),
            report,
        }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &EntityPool {
        &self.pool
    }

    fn spawn(&mut self) -> u64 {
        let mut spawned = 0;
        for _ in 0..self.spawn_per_frame {
            let Some(entity) = self.pool.get() else {
                break;
            };
            let speed: f32 = self.rng.gen_range(0.5..4.0);
            entity.add_component(Velocity(random_unit(&mut self.rng) * speed));
            entity.add_action(Drift);
            entity.add_action(Spin {
                rate: random_unit(&mut self.rng),
            });
            entity.add_action(Lifetime::seconds(self.rng.gen_range(0.25..1.5)));
            spawned += 1;
        }
        spawned
    }
}

impl Phased for Emitter {
    fn drain_removals(&mut self) {
        self.pool.drain_removals();
    }

    fn drain_starts(&mut self) {
        self.pool.drain_starts();
    }

    fn run_updates(&mut self, delta: f32) {
        let before = self.pool.alive_count();
        self.pool.run_updates(delta);
        let expired = (before - self.pool.alive_count()) as u64;
        let peak = self.pool.alive_count();
        let spawned = self.spawn();

        let mut report = self.report.borrow_mut();
        report.expired += expired;
        report.spawned += spawned;
        report.peak_alive = report.peak_alive.max(peak);
    }

    fn render(&mut self) {
        self.pool.render();
    }
}

// =============================================================================
// FLOCK
// =============================================================================

/// A sprite batch whose members fade out and are replaced.
pub struct Flock {
    batch: BatchRoot<TintedSpriteRule, HeadlessDrawable>,
    rng: ChaCha8Rng,
    next_index: u32,
    report: SharedReport,
}

impl Flock {
    /// Creates a full batch of `capacity` members.
    #[must_use]
    pub fn new(config: &SimulationConfig, rng: ChaCha8Rng, report: SharedReport) -> Self {
        let batch = BatchRoot::new(
            config.batch_capacity,
            SPRITE_MESH,
            SPRITE_MATERIAL,
            HeadlessDrawable::new(),
            config.upload_usage,
        );
        let mut flock = Self {
            batch,
            rng,
            next_index: 0,
            report,
        };
        flock.refill();
        flock
    }

    /// The underlying batch.
    #[must_use]
    pub const fn batch(&self) -> &BatchRoot<TintedSpriteRule, HeadlessDrawable> {
        &self.batch
    }

    fn member(&mut self) -> BatchedInstance<TintedSpriteRule> {
        let id = EntityId::new(self.next_index, 0);
        self.next_index = self.next_index.wrapping_add(1);

        let mut member = BatchedInstance::new(id);
        let speed: f32 = self.rng.gen_range(0.1..1.0);
        let color = Vec4::new(
            self.rng.gen_range(0.2..1.0),
            self.rng.gen_range(0.2..1.0),
            self.rng.gen_range(0.2..1.0),
            1.0,
        );
        member.add_component(Velocity(random_unit(&mut self.rng) * speed));
        member.add_component(SpriteTint(color));
        member.add_action(Drift);
        member.add_action(Pulse::new(0.25, self.rng.gen_range(0.5..2.0)));
        member.add_action(Lifetime::seconds(self.rng.gen_range(0.5..2.0)));
        member.add_action(Fade);
        member
    }

    fn refill(&mut self) {
        let mut joined = 0;
        while self.batch.batch_size() < self.batch.capacity() {
            let member = self.member();
            if self.batch.try_add(member).is_err() {
                break;
            }
            joined += 1;
        }
        self.report.borrow_mut().joined += joined;
    }
}

impl Phased for Flock {
    fn drain_removals(&mut self) {
        self.batch.drain_removals();
    }

    fn drain_starts(&mut self) {
        self.batch.drain_starts();
    }

    fn run_updates(&mut self, delta: f32) {
        let before = self.batch.batch_size();
        self.batch.run_updates(delta);
        let left = (before - self.batch.batch_size()) as u64;
        self.report.borrow_mut().left += left;
        self.refill();
    }

    fn render(&mut self) {
        self.batch.render();
        self.report.borrow_mut().batch = self.batch.stats();
    }
}

/// Builds the frame loop for the swarm scene.
///
/// Runs are reproducible for a given `seed`.
#[must_use]
pub fn build(config: &SimulationConfig, seed: u64) -> (FrameLoop, SharedReport) {
    let report = SharedReport::default();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let emitter_rng = ChaCha8Rng::seed_from_u64(rng.gen());
    let flock_rng = ChaCha8Rng::seed_from_u64(rng.gen());

    let mut frame_loop = FrameLoop::from_config(config);
    frame_loop.push(Box::new(Emitter::new(
        config.pool_size,
        emitter_rng,
        Rc::clone(&report),
    )));
    frame_loop.push(Box::new(Flock::new(config, flock_rng, Rc::clone(&report))));

    tracing::info!(
        pool_size = config.pool_size,
        batch_capacity = config.batch_capacity,
        seed,
        "swarm scene built"
    );
    (frame_loop, report)
}
