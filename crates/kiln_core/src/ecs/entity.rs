//! # Entities
//!
//! An entity is an addressable simulated object: a generational id, a
//! liveness flag, a transform, and two slot tables (actions and components).
//!
//! ## Tick phases
//!
//! Each tick runs three phases in a fixed order:
//!
//! 1. **Remove drain** - apply queued requests, then evict every slot in the
//!    pending-remove mask (clearing its pending-start bit as well)
//! 2. **Start drain** - run `start` on every slot in the pending-start mask
//! 3. **Updates** - run `update` on every active slot, in storage order
//!
//! The render phase (`pre_draw`) runs separately, after all updates.

use std::cell::RefCell;
use std::rc::Rc;

use super::action::{attached_or_queued, Action, ActionContext, ActionFamily, Deferred};
use super::capability::{Admits, Capability, Standalone};
use super::component::{Component, ComponentFamily};
use super::mask::SlotMask;
use super::registry::{kind_id, kind_name, KindId};
use super::storage::ComponentStorage;
use super::transform::Transform;
use crate::error::{CoreError, CoreResult};

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the owning pool
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a new entity ID from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The slot index inside the owning pool
    /// * `generation` - How many times that slot has been recycled
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Same index, next generation.
    #[inline]
    #[must_use]
    pub const fn next_generation(self) -> Self {
        Self::new(self.index(), self.generation().wrapping_add(1))
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

/// Something that takes part in the phased tick.
///
/// A frame driver runs each phase on every participant before moving on to
/// the next phase, so no participant observes another one mid-tick.
pub trait Phased {
    /// Applies queued requests and evicts actions marked for removal.
    fn drain_removals(&mut self);

    /// Runs the one-time start hook of newly added actions.
    fn drain_starts(&mut self);

    /// Runs the per-tick update hook of every active action.
    fn run_updates(&mut self, delta: f32);

    /// Render phase. Does nothing by default.
    fn render(&mut self) {}
}

/// An addressable simulated object owning actions, components and a transform.
///
/// `C` decides what may be attached, see [`Capability`].
pub struct Entity<C: Capability = Standalone> {
    id: EntityId,
    alive: bool,
    transform: Transform,
    components: ComponentStorage<ComponentFamily>,
    actions: ComponentStorage<ActionFamily<C>>,
    pending_start: SlotMask,
    pending_remove: SlotMask,
    deferred: Vec<Deferred<C>>,
}

impl Entity {
    /// Creates a live free-standing entity with the identity transform and
    /// nothing attached.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self::with_capability(id)
    }

    /// Creates a dead entity slot with a null id.
    #[must_use]
    pub fn dead() -> Self {
        let mut entity = Self::new(EntityId::NULL);
        entity.alive = false;
        entity
    }
}

impl<C: Capability> Entity<C> {
    /// Creates a live entity of capability `C`.
    #[must_use]
    pub fn with_capability(id: EntityId) -> Self {
        Self {
            id,
            alive: true,
            transform: Transform::IDENTITY,
            components: ComponentStorage::new(),
            actions: ComponentStorage::new(),
            pending_start: SlotMask::EMPTY,
            pending_remove: SlotMask::EMPTY,
            deferred: Vec::new(),
        }
    }

    /// The entity's current id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    /// Reads the liveness flag.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Clears the liveness flag. A pool reclaims the entity at its next sweep.
    #[inline]
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Resets the entity for reuse under `id`.
    ///
    /// Sets the identity transform, strips every action and component, drops
    /// all queued requests and marks the entity alive.
    pub fn recycle(&mut self, id: EntityId) {
        self.id = id;
        self.alive = true;
        self.transform = Transform::IDENTITY;
        self.actions.clear();
        self.components.clear();
        self.pending_start = SlotMask::EMPTY;
        self.pending_remove = SlotMask::EMPTY;
        self.deferred.clear();
    }

    /// Local transform.
    #[inline]
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable local transform.
    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Attaches `value`, replacing any action of the same kind.
    ///
    /// The action is present immediately but its `start` hook only runs at
    /// the next start drain.
    pub fn add_action<T: Action<C>>(&mut self, value: T) -> Rc<RefCell<T>>
    where
        C: Admits<T>,
    {
        self.apply_deferred();

        let kind = kind_id::<ActionFamily<C>, T>();
        let shared = self.actions.add(value);
        self.pending_start.insert(kind);
        self.pending_remove.remove(kind);

        tracing::debug!(entity = ?self.id, kind = kind_name::<ActionFamily<C>>(kind), "action added");
        shared
    }

    /// Marks the action of kind `T` for removal at the next remove drain.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is attached.
    pub fn remove_action<T: Action<C>>(&mut self) -> CoreResult<()> {
        self.apply_deferred();

        let kind = kind_id::<ActionFamily<C>, T>();
        if !self.actions.has_id(kind) {
            return Err(CoreError::not_found::<T>());
        }
        self.pending_remove.insert(kind);
        Ok(())
    }

    /// Checks whether `T` is attached or queued for attachment.
    #[must_use]
    pub fn has_action<T: Action<C>>(&self) -> bool {
        attached_or_queued(&self.actions, &self.deferred, kind_id::<ActionFamily<C>, T>())
    }

    /// Returns the attached action of kind `T`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is attached.
    pub fn action<T: Action<C>>(&self) -> CoreResult<Rc<RefCell<T>>> {
        self.actions.get::<T>()
    }

    /// Checks whether `T` is waiting for its start hook.
    #[must_use]
    pub fn is_pending_start<T: Action<C>>(&self) -> bool {
        self.pending_start.contains(kind_id::<ActionFamily<C>, T>())
    }

    /// Checks whether `T` is marked, or queued to be marked, for removal.
    #[must_use]
    pub fn is_pending_remove<T: Action<C>>(&self) -> bool {
        let kind = kind_id::<ActionFamily<C>, T>();
        self.pending_remove.contains(kind)
            || self
                .deferred
                .iter()
                .any(|request| matches!(request, Deferred::Remove { kind: queued } if *queued == kind))
    }

    /// The action slot table.
    #[inline]
    #[must_use]
    pub const fn actions(&self) -> &ComponentStorage<ActionFamily<C>> {
        &self.actions
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches a component, replacing any component of the same kind.
    pub fn add_component<T: Component>(&mut self, value: T) -> Rc<RefCell<T>>
    where
        C: Admits<T>,
    {
        self.components.add(value)
    }

    /// Detaches the component of kind `T`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is attached.
    pub fn remove_component<T: Component>(&mut self) -> CoreResult<()> {
        self.components.remove::<T>()
    }

    /// Checks for a component of kind `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.components.has::<T>()
    }

    /// Returns the component of kind `T`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is attached.
    pub fn component<T: Component>(&self) -> CoreResult<Rc<RefCell<T>>> {
        self.components.get::<T>()
    }

    /// The component slot table.
    #[inline]
    #[must_use]
    pub const fn components(&self) -> &ComponentStorage<ComponentFamily> {
        &self.components
    }

    // =========================================================================
    // Tick phases
    // =========================================================================

    /// Remove drain. Applies queued requests in order, then evicts every
    /// slot marked for removal.
    ///
    /// An action removed before it started never starts.
    pub fn drain_removals(&mut self) {
        self.apply_deferred();

        for kind in self.pending_remove.take().iter() {
            self.pending_start.remove(kind);
            if self.actions.remove_by_id(kind).is_ok() {
                tracing::debug!(
                    entity = ?self.id,
                    kind = kind_name::<ActionFamily<C>>(kind),
                    "action removed"
                );
            }
        }
    }

    /// Start drain. Runs `start` once for every pending action.
    pub fn drain_starts(&mut self) {
        let starting = self.pending_start.take();
        if starting.is_empty() {
            return;
        }
        self.dispatch(0.0, |kind| starting.contains(kind), |action, ctx| {
            action.start(ctx);
        });
    }

    /// Update phase. Runs `update` on every active action.
    pub fn run_updates(&mut self, delta: f32) {
        let waiting = self.pending_start;
        self.dispatch(delta, |kind| !waiting.contains(kind), |action, ctx| {
            action.update(ctx);
        });
    }

    /// Render phase. Runs `pre_draw` on every active action.
    pub fn pre_draw(&mut self) {
        let waiting = self.pending_start;
        self.dispatch(0.0, |kind| !waiting.contains(kind), |action, ctx| {
            action.pre_draw(ctx);
        });
    }

    /// Runs the three tick phases for this entity alone.
    pub fn update(&mut self, delta: f32) {
        self.drain_removals();
        self.drain_starts();
        self.run_updates(delta);
    }

    /// Moves queued requests into the slot table and masks.
    fn apply_deferred(&mut self) {
        let Self {
            actions,
            pending_start,
            pending_remove,
            deferred,
            ..
        } = self;

        for request in deferred.drain(..) {
            match request {
                Deferred::Add { kind, slot } => {
                    actions.insert_slot(kind, slot);
                    pending_start.insert(kind);
                    pending_remove.remove(kind);
                }
                Deferred::Remove { kind } => {
                    if actions.has_id(kind) {
                        pending_remove.insert(kind);
                    }
                }
            }
        }
    }

    /// Calls `hook` on every action whose kind passes `filter`, in storage
    /// order. The storage itself is frozen for the whole pass.
    fn dispatch<P, H>(&mut self, delta: f32, filter: P, mut hook: H)
    where
        P: Fn(KindId) -> bool,
        H: FnMut(&mut dyn Action<C>, &mut ActionContext<'_, C>),
    {
        let Self {
            id,
            alive,
            transform,
            components,
            actions,
            deferred,
            ..
        } = self;
        let actions: &ComponentStorage<ActionFamily<C>> = actions;

        for (kind, object) in actions.entries() {
            if !filter(kind) {
                continue;
            }
            let mut ctx = ActionContext {
                entity: *id,
                transform: &mut *transform,
                components: &mut *components,
                actions,
                alive: &mut *alive,
                deferred: &mut *deferred,
                delta,
            };
            hook(&mut *object.borrow_mut(), &mut ctx);
        }
    }
}

impl<C: Capability> Phased for Entity<C> {
    fn drain_removals(&mut self) {
        Entity::drain_removals(self);
    }

    fn drain_starts(&mut self) {
        Entity::drain_starts(self);
    }

    fn run_updates(&mut self, delta: f32) {
        Entity::run_updates(self, delta);
    }

    fn render(&mut self) {
        self.pre_draw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        starts: u32,
        updates: u32,
        draws: u32,
    }

    struct Counted(Rc<RefCell<Log>>);
    impl Action for Counted {
        fn start(&mut self, _ctx: &mut ActionContext<'_>) {
            self.0.borrow_mut().starts += 1;
        }
        fn update(&mut self, _ctx: &mut ActionContext<'_>) {
            self.0.borrow_mut().updates += 1;
        }
        fn pre_draw(&mut self, _ctx: &mut ActionContext<'_>) {
            self.0.borrow_mut().draws += 1;
        }
    }

    struct SelfRemoving {
        updates: u32,
    }
    impl Action for SelfRemoving {
        fn update(&mut self, ctx: &mut ActionContext<'_>) {
            self.updates += 1;
            assert!(ctx.remove_action::<SelfRemoving>().is_ok());
        }
    }

    struct Spawner;
    impl Action for Spawner {
        fn update(&mut self, ctx: &mut ActionContext<'_>) {
            if !ctx.has_action::<Spawned>() {
                ctx.add_action(Spawned::default());
            }
        }
    }

    #[derive(Default)]
    struct Spawned {
        started: bool,
    }
    impl Action for Spawned {
        fn start(&mut self, _ctx: &mut ActionContext<'_>) {
            self.started = true;
        }
    }

    struct Mover;
    impl Action for Mover {
        fn update(&mut self, ctx: &mut ActionContext<'_>) {
            let step = glam::Vec3::X * ctx.delta();
            ctx.translate(step);
        }
    }

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert_eq!(id.next_generation().generation(), 67891);
        assert!(EntityId::default().is_null());
    }

    #[test]
    fn test_start_deferred_until_drain() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut entity = Entity::new(EntityId::new(0, 0));

        entity.add_action(Counted(Rc::clone(&log)));
        assert!(entity.has_action::<Counted>());
        assert!(entity.is_pending_start::<Counted>());
        assert_eq!(log.borrow().starts, 0);

        entity.update(0.016);
        assert_eq!(log.borrow().starts, 1);
        assert_eq!(log.borrow().updates, 1);

        entity.update(0.016);
        entity.pre_draw();
        assert_eq!(log.borrow().starts, 1);
        assert_eq!(log.borrow().updates, 2);
        assert_eq!(log.borrow().draws, 1);
    }

    #[test]
    fn test_removed_before_start_never_starts() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut entity = Entity::new(EntityId::new(0, 0));

        entity.add_action(Counted(Rc::clone(&log)));
        entity.remove_action::<Counted>().unwrap();
        assert!(entity.has_action::<Counted>());

        entity.update(0.016);
        assert!(!entity.has_action::<Counted>());
        assert_eq!(log.borrow().starts, 0);
        assert_eq!(log.borrow().updates, 0);
    }

    #[test]
    fn test_self_removal_completes_update() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        let handle = entity.add_action(SelfRemoving { updates: 0 });

        entity.update(0.016);
        assert_eq!(handle.borrow().updates, 1);
        // Still attached until the next remove drain.
        assert!(entity.has_action::<SelfRemoving>());
        assert!(entity.is_pending_remove::<SelfRemoving>());

        entity.drain_removals();
        assert!(!entity.has_action::<SelfRemoving>());
        assert!(entity.action::<SelfRemoving>().is_err());
        assert_eq!(handle.borrow().updates, 1);
    }

    #[test]
    fn test_hook_additions_apply_next_tick() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        entity.add_action(Spawner);

        entity.update(0.016);
        assert!(entity.has_action::<Spawned>());
        assert!(entity.action::<Spawned>().is_err());

        entity.update(0.016);
        assert!(entity.action::<Spawned>().unwrap().borrow().started);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        assert!(matches!(
            entity.remove_action::<Mover>(),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_actions_move_transform() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        entity.add_action(Mover);
        entity.update(0.5);
        entity.update(0.5);
        assert_eq!(entity.transform().position(), glam::Vec3::X);
    }

    #[test]
    fn test_recycle_resets_state() {
        let mut entity = Entity::new(EntityId::new(0, 0));
        entity.add_action(Mover);
        entity.transform_mut().set_position(glam::Vec3::ONE);
        entity.kill();

        entity.recycle(EntityId::new(0, 1));
        assert!(entity.is_alive());
        assert!(entity.actions().is_empty());
        assert_eq!(*entity.transform(), Transform::IDENTITY);
        assert_eq!(entity.id().generation(), 1);
    }
}
