//! # Entity / Action System
//!
//! Type-indexed behavior storage with a deferred lifecycle.
//!
//! ## Design Philosophy
//!
//! - Every behavior type gets a small dense id on first use
//! - Each entity holds at most one instance per id, in a fixed slot table
//! - Start and remove requests are bits in a mask, drained at a barrier
//! - Behaviors may mutate their own entity from inside their own update

mod action;
mod capability;
mod component;
mod entity;
mod mask;
mod registry;
mod script;
mod storage;
mod transform;

pub use action::{Action, ActionContext, ActionFamily};
pub use capability::{Admits, BatchSafe, Batched, Capability, Standalone};
pub use component::{Component, ComponentFamily, MaterialHandle, MeshHandle, MeshRenderer};
pub use entity::{Entity, EntityId, Phased};
pub use mask::SlotMask;
pub use registry::{kind_id, kind_name, registered_kinds, Family, KindId, MAX_SLOTS_PER_ENTITY};
pub use script::{ScriptAction, ScriptHook, ScriptHost};
pub use storage::{ComponentStorage, Member};
pub use transform::Transform;
