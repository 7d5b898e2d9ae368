//! Local pose of an entity.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, Euler rotation (radians, XYZ order) and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vec3,
    euler: Vec3,
    scale: Vec3,
}

impl Transform {
    /// The identity pose: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        euler: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Creates a transform from its three parts.
    #[inline]
    #[must_use]
    pub const fn new(position: Vec3, euler: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            euler,
            scale,
        }
    }

    /// Identity pose moved to `position`.
    #[inline]
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Local position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Sets the local position.
    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Moves the position by `offset`.
    #[inline]
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Local Euler angles in radians.
    #[inline]
    #[must_use]
    pub const fn euler(&self) -> Vec3 {
        self.euler
    }

    /// Sets the local Euler angles in radians.
    #[inline]
    pub fn set_euler(&mut self, euler: Vec3) {
        self.euler = euler;
    }

    /// Local scale.
    #[inline]
    #[must_use]
    pub const fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Sets the local scale.
    #[inline]
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Rotation as a quaternion.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.euler.x, self.euler.y, self.euler.z)
    }

    /// Local-to-parent matrix (scale, then rotate, then translate).
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matrix() {
        assert_eq!(Transform::IDENTITY.matrix(), Mat4::IDENTITY);
        assert_eq!(Transform::default(), Transform::IDENTITY);
    }

    #[test]
    fn test_matrix_applies_translation_and_scale() {
        let mut transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        transform.set_scale(Vec3::splat(2.0));

        let point = transform.matrix().transform_point3(Vec3::X);
        assert!((point - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_translate_accumulates() {
        let mut transform = Transform::IDENTITY;
        transform.translate(Vec3::X);
        transform.translate(Vec3::X);
        assert_eq!(transform.position(), Vec3::new(2.0, 0.0, 0.0));
    }
}
