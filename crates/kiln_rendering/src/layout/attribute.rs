//! Primitive attribute types a layout can be built from.

use bytemuck::Pod;
use glam::{Vec2, Vec3, Vec4};

/// The shape of one per-instance attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeFormat {
    /// One `f32`.
    Float,
    /// One `i32`.
    Int,
    /// Two `f32`s.
    Float2,
    /// Three `f32`s.
    Float3,
    /// Four `f32`s.
    Float4,
}

impl AttributeFormat {
    /// Size in bytes.
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Float | Self::Int => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
        }
    }

    /// Number of scalar components.
    #[inline]
    #[must_use]
    pub const fn components(self) -> u32 {
        match self {
            Self::Float | Self::Int => 1,
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 => 4,
        }
    }

    /// Matching vertex format for a GPU pipeline.
    #[inline]
    #[must_use]
    pub const fn vertex_format(self) -> wgpu::VertexFormat {
        match self {
            Self::Float => wgpu::VertexFormat::Float32,
            Self::Int => wgpu::VertexFormat::Sint32,
            Self::Float2 => wgpu::VertexFormat::Float32x2,
            Self::Float3 => wgpu::VertexFormat::Float32x3,
            Self::Float4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// A value that can be stored as one attribute of a layout.
///
/// Values are copied byte-for-byte, so any alignment of the destination
/// buffer is accepted.
pub trait Attribute: Pod {
    /// Declared format.
    const FORMAT: AttributeFormat;

    /// Size in bytes. Always equal to `FORMAT.size()`.
    const SIZE: usize = Self::FORMAT.size();

    /// Writes `self` into `dst`, which must be exactly `SIZE` bytes.
    #[inline]
    fn write_bytes(self, dst: &mut [u8]) {
        dst.copy_from_slice(bytemuck::bytes_of(&self));
    }

    /// Reads a value from `src`, which must be exactly `SIZE` bytes.
    #[inline]
    #[must_use]
    fn read_bytes(src: &[u8]) -> Self {
        bytemuck::pod_read_unaligned(src)
    }
}

macro_rules! impl_attribute {
    ($($ty:ty => $format:ident),+ $(,)?) => {
        $(
            impl Attribute for $ty {
                const FORMAT: AttributeFormat = AttributeFormat::$format;
            }

            const _: () = assert!(
                std::mem::size_of::<$ty>() == AttributeFormat::$format.size(),
                "attribute type size does not match its format"
            );
        )+
    };
}

impl_attribute! {
    f32 => Float,
    i32 => Int,
    Vec2 => Float2,
    Vec3 => Float3,
    Vec4 => Float4,
}
