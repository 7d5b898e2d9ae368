//! # KILN Core Runtime
//!
//! Entity / action runtime designed for:
//! - Behaviors that add and remove themselves from inside their own update
//! - Fixed, build-time capacities (no growth during gameplay)
//! - High-churn spawn/despawn through recycled entity pools
//!
//! ## Architecture Rules
//!
//! 1. **One instance per kind** - every entity holds at most one action of a given type
//! 2. **Deferred lifecycle** - start and remove requests are applied at the next drain
//! 3. **Fixed phase order** - remove drain, start drain, updates, then render
//! 4. **Typed capabilities** - batch members only accept batch-safe kinds, checked at compile time
//!
//! ## Example
//!
//! ```rust,ignore
//! use kiln_core::{Action, ActionContext, Entity, EntityId};
//!
//! struct Spin;
//! impl Action for Spin {
//!     fn update(&mut self, ctx: &mut ActionContext<'_>) {
//!         let euler = ctx.transform().euler();
//!         ctx.transform_mut().set_euler(euler + glam::Vec3::Y * ctx.delta());
//!     }
//! }
//!
//! let mut entity = Entity::new(EntityId::new(0, 0));
//! entity.add_action(Spin);
//! entity.update(1.0 / 60.0);
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;
pub mod memory;

pub use ecs::{
    kind_id, kind_name, registered_kinds, Action, ActionContext, ActionFamily, Admits,
    BatchSafe, Batched, Capability, Component, ComponentFamily, ComponentStorage, Entity,
    EntityId, Family, KindId, MaterialHandle, Member, MeshHandle, MeshRenderer, Phased,
    ScriptAction, ScriptHook, ScriptHost, SlotMask, Standalone, Transform, MAX_SLOTS_PER_ENTITY,
};
pub use error::{fatal, CoreError, CoreResult};
pub use memory::EntityPool;
