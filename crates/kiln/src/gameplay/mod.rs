//! # Gameplay
//!
//! Actions and components used by the demo scene. All of them are
//! batch-safe, so they run the same on pooled entities and batch members.

pub mod actions;
pub mod components;

pub use actions::{Drift, Fade, Lifetime, Pulse, Spin};
pub use components::Velocity;
