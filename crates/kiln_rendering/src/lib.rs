//! # KILN Rendering
//!
//! Batched per-instance render memory designed for:
//! - Thousands of entities sharing one mesh and one material
//! - One draw call and one upload per batch per frame
//! - Byte layouts computed at compile time and mirrored to the GPU
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  BatchedInstance ──(BatchRule)──▶ HeapSlot                 │
//! │         ↓                            ↓                     │
//! │  BatchRoot ─── owns ──▶ BatchMemoryHeap<AttributeLayout>   │
//! │         ↓                                                  │
//! │  Drawable::upload_per_instance  (headless or wgpu buffer)  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - A heap never grows after construction
//! - A member writes only its own element
//! - Members cannot carry a drawable of their own

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod drawable;
pub mod instancing;
pub mod layout;

pub use drawable::{Drawable, GpuInstanceBuffer, HeadlessDrawable, UploadRecord, UsageHint};
pub use instancing::{
    BatchMemoryHeap, BatchRoot, BatchRule, BatchStats, BatchedInstance, HeapSlot, InstanceHandle,
    ModelMatrixRule, SharedHeap, SpriteTint, TintedSpriteRule, TransformRecord, TransformRule,
};
pub use layout::{
    Attribute, AttributeFormat, AttributeLayout, BufferView, BufferViewMut, Field,
    LayoutDescriptor, RecordCheck,
};
