//! Runtime layout descriptions and the record-size check.

use std::marker::PhantomData;

use bytemuck::Pod;

use super::{offset_at, stride_of, AttributeFormat, AttributeLayout};

/// Type-erased layout, handed to a drawable with each upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutDescriptor {
    formats: &'static [AttributeFormat],
    stride: usize,
}

impl LayoutDescriptor {
    /// Describes a layout made of `formats`.
    #[must_use]
    pub const fn new(formats: &'static [AttributeFormat]) -> Self {
        Self {
            formats,
            stride: stride_of(formats),
        }
    }

    /// Field formats in declaration order.
    #[inline]
    #[must_use]
    pub const fn formats(&self) -> &'static [AttributeFormat] {
        self.formats
    }

    /// Bytes per element.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Byte offset of field `index`.
    #[inline]
    #[must_use]
    pub const fn offset(&self, index: usize) -> usize {
        offset_at(self.formats, index)
    }

    /// Per-instance vertex attributes, at consecutive shader locations
    /// starting from `first_location`.
    #[must_use]
    pub fn vertex_attributes(&self, first_location: u32) -> Vec<wgpu::VertexAttribute> {
        self.formats
            .iter()
            .zip(first_location..)
            .enumerate()
            .map(|(index, (format, shader_location))| wgpu::VertexAttribute {
                format: format.vertex_format(),
                offset: self.offset(index) as wgpu::BufferAddress,
                shader_location,
            })
            .collect()
    }

    /// Instance-rate vertex buffer layout over `attributes`.
    #[must_use]
    pub fn vertex_buffer_layout<'a>(
        &self,
        attributes: &'a [wgpu::VertexAttribute],
    ) -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes,
        }
    }
}

/// Compile-time proof that record type `R` is exactly one element of `L`.
///
/// Evaluating [`RecordCheck::MATCHES_STRIDE`] fails the build when the
/// sizes differ:
///
/// ```rust,ignore
/// let () = RecordCheck::<(Vec3, Vec3), [f32; 6]>::MATCHES_STRIDE;
/// ```
pub struct RecordCheck<L, R>(PhantomData<(L, R)>);

impl<L: AttributeLayout, R: Pod> RecordCheck<L, R> {
    /// Unit value whose evaluation asserts `size_of::<R>() == L::STRIDE`.
    pub const MATCHES_STRIDE: () = assert!(
        std::mem::size_of::<R>() == L::STRIDE,
        "record size does not match the layout stride"
    );
}
