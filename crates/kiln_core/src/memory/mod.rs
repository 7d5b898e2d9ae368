//! # Memory Management
//!
//! Fixed-capacity containers for high-churn objects.
//!
//! ## Design Philosophy
//!
//! - Everything is allocated up front, at construction
//! - Capacity never changes during gameplay
//! - Reuse is O(1) through an index free list

pub mod pool;

pub use pool::EntityPool;
