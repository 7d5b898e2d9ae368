//! # Batch Rules
//!
//! A rule turns an entity's current state into one heap element. Each batch
//! kind has exactly one rule, fixed by the batch root's type.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};
use kiln_core::{BatchSafe, Batched, Component, Entity};

use super::heap::HeapSlot;
use crate::layout::AttributeLayout;

/// Writes an entity's per-instance data into its heap slot.
pub trait BatchRule: 'static {
    /// Layout of one heap element.
    type Layout: AttributeLayout;

    /// Called once per member per upload.
    fn write(entity: &Entity<Batched>, slot: &HeapSlot<Self::Layout>);
}

// =============================================================================
// TRANSFORM
// =============================================================================

/// Raw position, Euler angles and scale.
#[derive(Clone, Copy, Debug)]
pub struct TransformRule;

/// One [`TransformRule`] element.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TransformRecord {
    /// Local position.
    pub position: [f32; 3],
    /// Euler angles in radians.
    pub euler: [f32; 3],
    /// Local scale.
    pub scale: [f32; 3],
}

impl BatchRule for TransformRule {
    type Layout = (Vec3, Vec3, Vec3);

    fn write(entity: &Entity<Batched>, slot: &HeapSlot<Self::Layout>) {
        let transform = entity.transform();
        slot.write_record(&TransformRecord {
            position: transform.position().to_array(),
            euler: transform.euler().to_array(),
            scale: transform.scale().to_array(),
        });
    }
}

// =============================================================================
// TINTED SPRITE
// =============================================================================

/// Per-member color for [`TintedSpriteRule`]. Members without one are white.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteTint(pub Vec4);

impl Component for SpriteTint {}
impl BatchSafe for SpriteTint {}

/// Position, XY scale and an RGBA tint, for camera-facing quads.
#[derive(Clone, Copy, Debug)]
pub struct TintedSpriteRule;

impl TintedSpriteRule {
    /// Tint used when a member has no [`SpriteTint`].
    pub const DEFAULT_TINT: Vec4 = Vec4::ONE;
}

impl BatchRule for TintedSpriteRule {
    type Layout = (Vec3, Vec2, Vec4);

    fn write(entity: &Entity<Batched>, slot: &HeapSlot<Self::Layout>) {
        let transform = entity.transform();
        let tint = entity
            .component::<SpriteTint>()
            .map_or(Self::DEFAULT_TINT, |tint| {
                let tint = tint.borrow();
                tint.0
            });

        slot.set::<0>(transform.position());
        slot.set::<1>(transform.scale().truncate());
        slot.set::<2>(tint);
    }
}

// =============================================================================
// MODEL MATRIX
// =============================================================================

/// Full local-to-world matrix, one column per attribute.
#[derive(Clone, Copy, Debug)]
pub struct ModelMatrixRule;

impl BatchRule for ModelMatrixRule {
    type Layout = (Vec4, Vec4, Vec4, Vec4);

    fn write(entity: &Entity<Batched>, slot: &HeapSlot<Self::Layout>) {
        let columns: [[f32; 4]; 4] = entity.transform().matrix().to_cols_array_2d();
        slot.write_record(&columns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instancing::heap::BatchMemoryHeap;
    use kiln_core::EntityId;
    use std::rc::Rc;

    type TransformLayout = <TransformRule as BatchRule>::Layout;
    type SpriteLayout = <TintedSpriteRule as BatchRule>::Layout;
    type MatrixLayout = <ModelMatrixRule as BatchRule>::Layout;

    #[test]
    fn test_record_sizes_match_layouts() {
        assert_eq!(std::mem::size_of::<TransformRecord>(), TransformLayout::STRIDE);
        assert_eq!(MatrixLayout::STRIDE, 64);
        assert_eq!(SpriteLayout::STRIDE, 36);
    }

    #[test]
    fn test_transform_rule_writes_pose() {
        let heap = BatchMemoryHeap::<TransformLayout>::shared(2);
        let slot = HeapSlot::new(Rc::clone(&heap), 1);

        let mut entity = Entity::<Batched>::with_capability(EntityId::new(0, 0));
        entity.transform_mut().set_position(Vec3::new(1.0, 2.0, 3.0));
        entity.transform_mut().set_scale(Vec3::splat(2.0));
        TransformRule::write(&entity, &slot);

        assert_eq!(slot.get::<0>(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(slot.get::<1>(), Vec3::ZERO);
        assert_eq!(slot.get::<2>(), Vec3::splat(2.0));
    }

    #[test]
    fn test_tinted_sprite_uses_component() {
        let heap = BatchMemoryHeap::<SpriteLayout>::shared(1);
        let slot = HeapSlot::new(Rc::clone(&heap), 0);

        let mut entity = Entity::<Batched>::with_capability(EntityId::new(0, 0));
        TintedSpriteRule::write(&entity, &slot);
        assert_eq!(slot.get::<2>(), TintedSpriteRule::DEFAULT_TINT);

        entity.add_component(SpriteTint(Vec4::new(1.0, 0.0, 0.0, 0.5)));
        TintedSpriteRule::write(&entity, &slot);
        assert_eq!(slot.get::<2>(), Vec4::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(slot.get::<1>(), Vec2::ONE);
    }

    #[test]
    fn test_model_matrix_rule_translation_column() {
        let heap = BatchMemoryHeap::<MatrixLayout>::shared(1);
        let slot = HeapSlot::new(Rc::clone(&heap), 0);

        let mut entity = Entity::<Batched>::with_capability(EntityId::new(0, 0));
        entity.transform_mut().set_position(Vec3::new(4.0, 5.0, 6.0));
        ModelMatrixRule::write(&entity, &slot);

        assert_eq!(slot.get::<0>(), Vec4::X);
        assert_eq!(slot.get::<3>(), Vec4::new(4.0, 5.0, 6.0, 1.0));
    }
}
