//! # Actions
//!
//! The behavior capability family. An action is a unit of per-entity logic
//! with three optional hooks:
//!
//! - `start` runs once, at the first start drain after the action is added
//! - `update` runs every tick while the action is active
//! - `pre_draw` runs in the render phase
//!
//! Every hook receives an [`ActionContext`] borrowing the owning entity's
//! state. Adding or removing actions through the context is deferred to the
//! next remove drain, so the pass currently running is never disturbed.

use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use glam::Vec3;

use super::capability::{Admits, Capability, Standalone};
use super::component::{Component, ComponentFamily};
use super::entity::EntityId;
use super::registry::{kind_id, Family, KindId};
use super::storage::{ComponentStorage, Member, SharedSlot};
use super::transform::Transform;
use crate::error::{CoreError, CoreResult};

/// Per-entity behavior with optional lifecycle hooks.
///
/// `C` is the capability of the entities the action can be attached to.
/// Actions meant for both free-standing entities and batch members
/// implement it for every `C: Capability`.
///
/// # Example
///
/// ```rust,ignore
/// struct Expire { remaining: f32 }
///
/// impl Action for Expire {
///     fn update(&mut self, ctx: &mut ActionContext<'_>) {
///         self.remaining -= ctx.delta();
///         if self.remaining <= 0.0 {
///             ctx.kill();
///         }
///     }
/// }
/// ```
pub trait Action<C: Capability = Standalone>: Any {
    /// One-time hook, run at the start drain following the add.
    fn start(&mut self, _ctx: &mut ActionContext<'_, C>) {}

    /// Per-tick hook.
    fn update(&mut self, _ctx: &mut ActionContext<'_, C>) {}

    /// Render-phase hook.
    fn pre_draw(&mut self, _ctx: &mut ActionContext<'_, C>) {}
}

/// The family every [`Action`] of capability `C` is registered in.
///
/// Each capability has its own id space.
pub struct ActionFamily<C: Capability = Standalone>(PhantomData<C>);

impl<C: Capability> Family for ActionFamily<C> {
    type Object = dyn Action<C>;
    const NAME: &'static str = C::ACTION_FAMILY;
}

impl<C: Capability, T: Action<C>> Member<ActionFamily<C>> for T {
    fn erase(shared: Rc<RefCell<Self>>) -> Rc<RefCell<dyn Action<C>>> {
        shared
    }
}

/// A structural request made from inside a hook.
pub(crate) enum Deferred<C: Capability> {
    /// Attach (or replace) an action.
    Add {
        kind: KindId,
        slot: SharedSlot<ActionFamily<C>>,
    },
    /// Mark an action for removal.
    Remove { kind: KindId },
}

/// Returns `true` if `kind` is attached or has a queued add.
///
/// A queued removal does not count until it is drained.
pub(crate) fn attached_or_queued<C: Capability>(
    actions: &ComponentStorage<ActionFamily<C>>,
    deferred: &[Deferred<C>],
    kind: KindId,
) -> bool {
    actions.has_id(kind)
        || deferred
            .iter()
            .any(|request| matches!(request, Deferred::Add { kind: queued, .. } if *queued == kind))
}

/// Borrowed view of the owning entity, handed to every hook.
///
/// Sibling actions are readable, but the action whose hook is running is
/// already mutably borrowed: fetching it again through [`Self::action`] and
/// borrowing it panics.
///
/// Attaching goes through the same capability check as on the entity
/// itself. A batch member's hook cannot give it a drawable of its own:
///
/// ```compile_fail
/// use kiln_core::{Action, ActionContext, BatchSafe, Batched, MeshRenderer};
///
/// struct Sneaky;
/// impl BatchSafe for Sneaky {}
///
/// impl Action<Batched> for Sneaky {
///     fn start(&mut self, ctx: &mut ActionContext<'_, Batched>) {
///         ctx.add_component(MeshRenderer::default());
///     }
/// }
/// ```
///
/// nor attach an action that is not [`BatchSafe`](super::BatchSafe):
///
/// ```compile_fail
/// use kiln_core::{Action, ActionContext, BatchSafe, Batched};
///
/// struct Loose;
/// impl Action<Batched> for Loose {}
///
/// struct Spawner;
/// impl BatchSafe for Spawner {}
///
/// impl Action<Batched> for Spawner {
///     fn update(&mut self, ctx: &mut ActionContext<'_, Batched>) {
///         ctx.add_action(Loose);
///     }
/// }
/// ```
pub struct ActionContext<'a, C: Capability = Standalone> {
    pub(crate) entity: EntityId,
    pub(crate) transform: &'a mut Transform,
    pub(crate) components: &'a mut ComponentStorage<ComponentFamily>,
    pub(crate) actions: &'a ComponentStorage<ActionFamily<C>>,
    pub(crate) alive: &'a mut bool,
    pub(crate) deferred: &'a mut Vec<Deferred<C>>,
    pub(crate) delta: f32,
}

impl<C: Capability> ActionContext<'_, C> {
    /// Id of the owning entity.
    #[inline]
    #[must_use]
    pub const fn entity_id(&self) -> EntityId {
        self.entity
    }

    /// Seconds since the previous tick. Zero outside the update phase.
    #[inline]
    #[must_use]
    pub const fn delta(&self) -> f32 {
        self.delta
    }

    /// The owning entity's transform.
    #[inline]
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &*self.transform
    }

    /// Mutable access to the owning entity's transform.
    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut *self.transform
    }

    /// Shorthand for moving the entity by `offset`.
    #[inline]
    pub fn translate(&mut self, offset: Vec3) {
        self.transform.translate(offset);
    }

    /// Marks the owning entity dead. Its pool reclaims it at the next sweep.
    #[inline]
    pub fn kill(&mut self) {
        *self.alive = false;
    }

    /// Reads the owning entity's liveness flag.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        *self.alive
    }

    /// Queues `value` to be attached at the next remove drain.
    ///
    /// The new action starts at the start drain of that same tick. Returns a
    /// handle so the caller can configure it right away.
    pub fn add_action<T: Action<C>>(&mut self, value: T) -> Rc<RefCell<T>>
    where
        C: Admits<T>,
    {
        let kind = kind_id::<ActionFamily<C>, T>();
        let (slot, shared) = SharedSlot::new(value);
        self.deferred.push(Deferred::Add { kind, slot });
        shared
    }

    /// Queues the removal of the action of kind `T`.
    ///
    /// A hook may remove its own action; the current call still completes.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if `T` is neither attached nor queued.
    pub fn remove_action<T: Action<C>>(&mut self) -> CoreResult<()> {
        let kind = kind_id::<ActionFamily<C>, T>();
        if !attached_or_queued(self.actions, self.deferred.as_slice(), kind) {
            return Err(CoreError::not_found::<T>());
        }
        self.deferred.push(Deferred::Remove { kind });
        Ok(())
    }

    /// Checks whether `T` is attached or queued for attachment. Actions
    /// marked for removal count until the next remove drain.
    #[must_use]
    pub fn has_action<T: Action<C>>(&self) -> bool {
        attached_or_queued(self.actions, self.deferred.as_slice(), kind_id::<ActionFamily<C>, T>())
    }

    /// Returns a sibling action.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if `T` is not attached.
    pub fn action<T: Action<C>>(&self) -> CoreResult<Rc<RefCell<T>>> {
        self.actions.get::<T>()
    }

    /// Returns a component of the owning entity.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if `T` is not attached.
    pub fn component<T: Component>(&self) -> CoreResult<Rc<RefCell<T>>> {
        self.components.get::<T>()
    }

    /// Checks for a component on the owning entity.
    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.components.has::<T>()
    }

    /// Attaches a component immediately. Components have no hooks, so
    /// nothing needs deferring.
    pub fn add_component<T: Component>(&mut self, value: T) -> Rc<RefCell<T>>
    where
        C: Admits<T>,
    {
        self.components.add(value)
    }

    /// Detaches a component immediately.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if `T` is not attached.
    pub fn remove_component<T: Component>(&mut self) -> CoreResult<()> {
        self.components.remove::<T>()
    }
}
