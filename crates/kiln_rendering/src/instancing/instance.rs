//! # Batched Instances
//!
//! An entity whose per-instance render data lives in a slot of its batch's
//! shared heap instead of in drawable resources of its own.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use kiln_core::{
    fatal, Action, BatchSafe, Batched, Component, CoreError, CoreResult, Entity, EntityId,
    Phased, Transform,
};

use super::heap::{HeapSlot, SharedHeap};
use super::rules::BatchRule;
use crate::layout::AttributeLayout;

/// A batch member, written into its heap slot by rule `R`.
///
/// The member's entity has the [`Batched`] capability: only [`BatchSafe`]
/// actions and components can be attached, whether from here or from one of
/// its own hooks, so a member can never carry its own mesh or material.
pub struct BatchedInstance<R: BatchRule> {
    entity: Entity<Batched>,
    slot: Option<HeapSlot<R::Layout>>,
    _rule: PhantomData<R>,
}

impl<R: BatchRule> BatchedInstance<R> {
    /// Creates an unbound member.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            entity: Entity::with_capability(id),
            slot: None,
            _rule: PhantomData,
        }
    }

    /// Creates an unbound member at `transform`.
    #[must_use]
    pub fn with_transform(id: EntityId, transform: Transform) -> Self {
        let mut instance = Self::new(id);
        *instance.entity.transform_mut() = transform;
        instance
    }

    /// Binds this member to element `index` of `heap`. One-time operation,
    /// performed by the owning [`BatchRoot`](super::BatchRoot) when the
    /// member joins.
    ///
    /// # Panics
    ///
    /// Fatal [`CoreError::DoubleBinding`] if already bound, and fatal
    /// [`CoreError::BoundsViolation`] if `index` is outside the heap.
    pub(crate) fn assign_to_memory_heap(&mut self, heap: &SharedHeap<R::Layout>, index: usize) {
        if let Some(slot) = &self.slot {
            fatal(CoreError::DoubleBinding {
                index: slot.index(),
            });
        }

        let len = heap.borrow().byte_len();
        if index >= heap.borrow().capacity() {
            let stride = <R::Layout as AttributeLayout>::STRIDE;
            fatal(CoreError::BoundsViolation {
                element: index,
                start: index.saturating_mul(stride),
                end: index.saturating_add(1).saturating_mul(stride),
                len,
            });
        }

        self.slot = Some(HeapSlot::new(Rc::clone(heap), index));
    }

    /// Writes the current state into the bound slot through rule `R`.
    ///
    /// # Panics
    ///
    /// Fatal [`CoreError::Misuse`] if the member is not bound.
    pub fn update_memory_heap(&self) {
        let Some(slot) = &self.slot else {
            fatal(CoreError::Misuse {
                detail: "batched instance written before it was bound to a heap",
            });
        };
        R::write(&self.entity, slot);
    }

    /// Element index in the batch heap, once bound.
    #[inline]
    #[must_use]
    pub fn heap_index(&self) -> Option<usize> {
        self.slot.as_ref().map(HeapSlot::index)
    }

    /// Checks whether the member is bound to a heap.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.slot.is_some()
    }

    pub(crate) fn relocate(&mut self, index: usize) {
        if let Some(slot) = self.slot.as_mut() {
            slot.relocate(index);
        }
    }

    pub(crate) fn unbind(&mut self) {
        self.slot = None;
    }

    // =========================================================================
    // Entity access (restricted)
    // =========================================================================

    /// The underlying entity, read-only.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> &Entity<Batched> {
        &self.entity
    }

    /// The member's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.entity.id()
    }

    /// Local transform.
    #[inline]
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        self.entity.transform()
    }

    /// Mutable local transform.
    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        self.entity.transform_mut()
    }

    /// Reads the liveness flag.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.entity.is_alive()
    }

    /// Marks the member dead. Its root drops it at the end of the update phase.
    #[inline]
    pub fn kill(&mut self) {
        self.entity.kill();
    }

    /// Attaches a batch-safe action.
    ///
    /// The action's own hooks get a [`Batched`] context, so they cannot
    /// attach a drawable either:
    ///
    /// ```compile_fail
    /// use kiln_core::{Action, ActionContext, BatchSafe, Batched, EntityId, MeshRenderer};
    /// use kiln_rendering::{BatchedInstance, TransformRule};
    ///
    /// struct Sneaky;
    /// impl BatchSafe for Sneaky {}
    ///
    /// impl Action<Batched> for Sneaky {
    ///     fn start(&mut self, ctx: &mut ActionContext<'_, Batched>) {
    ///         ctx.add_component(MeshRenderer::default());
    ///     }
    /// }
    ///
    /// let mut member = BatchedInstance::<TransformRule>::new(EntityId::new(0, 0));
    /// member.add_action(Sneaky);
    /// ```
    pub fn add_action<T: Action<Batched> + BatchSafe>(&mut self, value: T) -> Rc<RefCell<T>> {
        self.entity.add_action(value)
    }

    /// Marks an action for removal.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is attached.
    pub fn remove_action<T: Action<Batched>>(&mut self) -> CoreResult<()> {
        self.entity.remove_action::<T>()
    }

    /// Checks whether `T` is attached or queued.
    #[must_use]
    pub fn has_action<T: Action<Batched>>(&self) -> bool {
        self.entity.has_action::<T>()
    }

    /// Returns an attached action.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is attached.
    pub fn action<T: Action<Batched>>(&self) -> CoreResult<Rc<RefCell<T>>> {
        self.entity.action::<T>()
    }

    /// Attaches a batch-safe component.
    ///
    /// A drawable of its own is rejected at compile time:
    ///
    /// ```compile_fail
    /// use kiln_core::{EntityId, MeshRenderer};
    /// use kiln_rendering::{BatchedInstance, TransformRule};
    ///
    /// let mut member = BatchedInstance::<TransformRule>::new(EntityId::new(0, 0));
    /// member.add_component(MeshRenderer::default());
    /// ```
    pub fn add_component<T: Component + BatchSafe>(&mut self, value: T) -> Rc<RefCell<T>> {
        self.entity.add_component(value)
    }

    /// Detaches a component.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is attached.
    pub fn remove_component<T: Component>(&mut self) -> CoreResult<()> {
        self.entity.remove_component::<T>()
    }

    /// Returns an attached component.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is attached.
    pub fn component<T: Component>(&self) -> CoreResult<Rc<RefCell<T>>> {
        self.entity.component::<T>()
    }

    /// Render-phase hook of every active action.
    pub fn pre_draw(&mut self) {
        self.entity.pre_draw();
    }

    /// Runs the three tick phases for this member alone.
    pub fn update(&mut self, delta: f32) {
        self.entity.update(delta);
    }
}

impl<R: BatchRule> Phased for BatchedInstance<R> {
    fn drain_removals(&mut self) {
        self.entity.drain_removals();
    }

    fn drain_starts(&mut self) {
        self.entity.drain_starts();
    }

    fn run_updates(&mut self, delta: f32) {
        self.entity.run_updates(delta);
    }

    fn render(&mut self) {
        self.entity.pre_draw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instancing::heap::BatchMemoryHeap;
    use crate::instancing::rules::TransformRule;
    use glam::Vec3;

    type Layout = <TransformRule as BatchRule>::Layout;

    #[test]
    fn test_bind_then_write() {
        let heap = BatchMemoryHeap::<Layout>::shared(2);
        let mut instance = BatchedInstance::<TransformRule>::new(EntityId::new(0, 0));
        assert!(!instance.is_bound());

        instance.assign_to_memory_heap(&heap, 1);
        instance.transform_mut().set_position(Vec3::X);
        instance.update_memory_heap();

        assert_eq!(instance.heap_index(), Some(1));
        assert_eq!(heap.borrow().get::<0>(1), Vec3::X);
    }

    #[test]
    #[should_panic(expected = "double binding")]
    fn test_double_binding_is_fatal() {
        let heap = BatchMemoryHeap::<Layout>::shared(2);
        let mut instance = BatchedInstance::<TransformRule>::new(EntityId::new(0, 0));
        instance.assign_to_memory_heap(&heap, 0);
        instance.assign_to_memory_heap(&heap, 1);
    }

    #[test]
    #[should_panic(expected = "bounds violation")]
    fn test_binding_outside_heap_is_fatal() {
        let heap = BatchMemoryHeap::<Layout>::shared(2);
        let mut instance = BatchedInstance::<TransformRule>::new(EntityId::new(0, 0));
        instance.assign_to_memory_heap(&heap, 2);
    }

    struct Glow;
    impl Component for Glow {}
    impl BatchSafe for Glow {}

    struct Ignite;
    impl BatchSafe for Ignite {}
    impl Action<Batched> for Ignite {
        fn start(&mut self, ctx: &mut kiln_core::ActionContext<'_, Batched>) {
            ctx.add_component(Glow);
        }
    }

    #[test]
    fn test_member_hooks_attach_batch_safe_kinds() {
        let mut instance = BatchedInstance::<TransformRule>::new(EntityId::new(0, 0));
        instance.add_action(Ignite);
        assert!(instance.component::<Glow>().is_err());

        instance.update(0.016);
        assert!(instance.component::<Glow>().is_ok());
        assert!(instance.has_action::<Ignite>());
    }

    #[test]
    #[should_panic(expected = "invariant violated")]
    fn test_unbound_write_is_fatal() {
        let instance = BatchedInstance::<TransformRule>::new(EntityId::new(0, 0));
        instance.update_memory_heap();
    }
}
