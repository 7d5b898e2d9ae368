//! # Components
//!
//! Plain data attached to an entity. Components share the registry and
//! storage machinery with actions but have no hooks, so adds and removes
//! take effect immediately.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use super::registry::Family;
use super::storage::Member;

/// Hook-less data attached to an entity.
pub trait Component: Any {}

/// The family every [`Component`] is registered in.
#[derive(Debug, Clone, Copy)]
pub struct ComponentFamily;

impl Family for ComponentFamily {
    type Object = dyn Component;
    const NAME: &'static str = "component";
}

impl<T: Component> Member<ComponentFamily> for T {
    fn erase(shared: Rc<RefCell<Self>>) -> Rc<RefCell<dyn Component>> {
        shared
    }
}

/// Opaque mesh id, issued by the asset loader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MeshHandle(u32);

impl MeshHandle {
    /// Wraps a raw loader id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw loader id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Opaque material id, issued by the asset loader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MaterialHandle(u32);

impl MaterialHandle {
    /// Wraps a raw loader id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw loader id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Draws an entity with its own mesh and material.
///
/// Not [`super::BatchSafe`]: batch members share the batch's
/// mesh and material instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshRenderer {
    /// Mesh to draw.
    pub mesh: MeshHandle,
    /// Material to draw it with.
    pub material: MaterialHandle,
}

impl MeshRenderer {
    /// Pairs a mesh with a material.
    #[inline]
    #[must_use]
    pub const fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self { mesh, material }
    }
}

impl Component for MeshRenderer {}
