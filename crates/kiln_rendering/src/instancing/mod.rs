//! # Instanced Batching
//!
//! Many entities, one mesh, one draw call.
//!
//! ## How It Works
//!
//! 1. A [`BatchRoot`] owns a [`BatchMemoryHeap`] sized for its capacity
//! 2. Each [`BatchedInstance`] is bound to one heap element when it joins
//! 3. Every frame the root asks each member's [`BatchRule`] to write its
//!    element, then uploads the heap to its drawable once
//!
//! Members never address another member's element.

pub mod heap;
pub mod instance;
pub mod root;
pub mod rules;

pub use heap::{BatchMemoryHeap, HeapSlot, SharedHeap};
pub use instance::BatchedInstance;
pub use root::{BatchRoot, BatchStats, InstanceHandle};
pub use rules::{
    BatchRule, ModelMatrixRule, SpriteTint, TintedSpriteRule, TransformRecord, TransformRule,
};
