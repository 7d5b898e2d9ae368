//! # Entity Pool
//!
//! Fixed-size set of entities for objects that are frequently spawned and
//! despawned (bullets, particles, short-lived NPCs).

use crate::ecs::{Entity, EntityId, MeshRenderer, Phased};

/// A pool of pre-allocated entities split into alive and dead sets.
///
/// The two sets always partition the full capacity. An entity only becomes
/// alive through [`EntityPool::get`] and only becomes dead when a sweep
/// observes its liveness flag cleared.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Actions run on one thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool = EntityPool::new(1024, MeshRenderer::new(bullet_mesh, bullet_material));
///
/// // Spawn - O(1), no heap allocation
/// if let Some(bullet) = pool.get() {
///     bullet.add_action(Lifetime::seconds(2.0));
/// }
///
/// // Tick - dead bullets return to the pool at the end of the update phase
/// pool.update(1.0 / 60.0);
/// ```
pub struct EntityPool {
    /// The storage array.
    entities: Box<[Entity]>,
    /// Indices of entities in use, in spawn order.
    alive: Vec<usize>,
    /// Free list - indices of recyclable entities.
    dead: Vec<usize>,
    /// Drawable copied onto every recycled entity.
    root: MeshRenderer,
}

impl EntityPool {
    /// Creates a pool of `capacity` dead entities.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Total entity count, fixed for the pool's lifetime
    /// * `root` - Mesh and material every spawned entity is drawn with
    ///
    /// # Panics
    ///
    /// Panics if `capacity` does not fit in an entity index.
    #[must_use]
    pub fn new(capacity: usize, root: MeshRenderer) -> Self {
        assert!(u32::try_from(capacity).is_ok(), "pool capacity exceeds entity index range");

        let entities: Vec<Entity> = (0..capacity)
            .map(|index| {
                let mut entity = Entity::dead();
                entity.assign_id(EntityId::new(index as u32, 0));
                entity
            })
            .collect();

        // Pop order hands out index 0 first
        let dead: Vec<usize> = (0..capacity).rev().collect();

        Self {
            entities: entities.into_boxed_slice(),
            alive: Vec::with_capacity(capacity),
            dead,
            root,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.len()
    }

    /// Number of alive entities.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Number of recyclable entities.
    #[inline]
    #[must_use]
    pub fn dead_count(&self) -> usize {
        self.dead.len()
    }

    /// The drawable copied onto recycled entities.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> MeshRenderer {
        self.root
    }

    /// Replaces the drawable used for future spawns.
    #[inline]
    pub fn set_root(&mut self, root: MeshRenderer) {
        self.root = root;
    }

    /// Recycles a dead entity and returns it.
    ///
    /// This is a **O(1)** operation with **zero heap allocations**. The
    /// entity gets a new generation, the identity transform, no actions and
    /// a copy of the pool's [`MeshRenderer`].
    ///
    /// # Returns
    ///
    /// The recycled entity, or `None` if every entity is alive.
    pub fn get(&mut self) -> Option<&mut Entity> {
        let Some(index) = self.dead.pop() else {
            tracing::trace!(capacity = self.capacity(), "entity pool exhausted");
            return None;
        };
        self.alive.push(index);
        debug_assert_eq!(self.alive.len() + self.dead.len(), self.entities.len());

        let entity = &mut self.entities[index];
        let id = entity.id().next_generation();
        entity.recycle(id);
        entity.add_component(self.root);
        Some(entity)
    }

    /// Moves every alive entity whose liveness flag is cleared to the dead set.
    ///
    /// # Returns
    ///
    /// How many entities were reclaimed.
    pub fn sweep(&mut self) -> usize {
        let Self {
            entities,
            alive,
            dead,
            ..
        } = self;

        let before = dead.len();
        alive.retain(|&index| {
            if entities[index].is_alive() {
                true
            } else {
                dead.push(index);
                false
            }
        });

        let reclaimed = dead.len() - before;
        if reclaimed > 0 {
            tracing::debug!(reclaimed, alive = alive.len(), "pool sweep");
        }
        reclaimed
    }

    /// Looks up an alive entity by id. Stale generations return `None`.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .get(id.index() as usize)
            .filter(|entity| entity.id() == id && entity.is_alive())
    }

    /// Mutable lookup of an alive entity by id.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities
            .get_mut(id.index() as usize)
            .filter(|entity| entity.id() == id && entity.is_alive())
    }

    /// Iterates the alive set in spawn order.
    pub fn iter_alive(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.alive.iter().map(move |&index| &self.entities[index])
    }

    /// Calls `f` on every alive entity in spawn order.
    pub fn for_each_alive_mut(&mut self, mut f: impl FnMut(&mut Entity)) {
        for &index in &self.alive {
            f(&mut self.entities[index]);
        }
    }

    /// Runs all three tick phases across the pool, then sweeps.
    pub fn update(&mut self, delta: f32) {
        Phased::drain_removals(self);
        Phased::drain_starts(self);
        Phased::run_updates(self, delta);
    }
}

impl Phased for EntityPool {
    fn drain_removals(&mut self) {
        self.for_each_alive_mut(Entity::drain_removals);
    }

    fn drain_starts(&mut self) {
        self.for_each_alive_mut(Entity::drain_starts);
    }

    fn run_updates(&mut self, delta: f32) {
        self.for_each_alive_mut(|entity| entity.run_updates(delta));
        self.sweep();
    }

    fn render(&mut self) {
        self.for_each_alive_mut(Entity::pre_draw);
    }
}
