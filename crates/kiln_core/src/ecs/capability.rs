//! # Capabilities
//!
//! What an entity is allowed to carry. A free-standing entity may hold any
//! action or component. A batch member draws with its batch's mesh and
//! material, so everything attached to it, including anything its own hooks
//! attach, must be [`BatchSafe`].
//!
//! The capability is a type parameter of [`Entity`](super::Entity),
//! [`Action`](super::Action) and [`ActionContext`](super::ActionContext),
//! so the restriction is checked by the compiler on every path.

/// Marker for actions and components that may live on a batch member.
///
/// Drawable components must never implement this: a batch supplies one
/// mesh and one material for all of its members.
pub trait BatchSafe {}

/// A capability marker.
pub trait Capability: 'static {
    /// Family name of this capability's actions, used in diagnostics.
    const ACTION_FAMILY: &'static str;
}

/// Capability of entities that draw on their own. Anything may be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standalone {}

/// Capability of batch members. Only [`BatchSafe`] types may be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batched {}

impl Capability for Standalone {
    const ACTION_FAMILY: &'static str = "action";
}

impl Capability for Batched {
    const ACTION_FAMILY: &'static str = "batched action";
}

/// Implemented by a capability for every type it lets an entity carry.
pub trait Admits<T: ?Sized> {}

impl<T: ?Sized> Admits<T> for Standalone {}

impl<T: ?Sized + BatchSafe> Admits<T> for Batched {}
