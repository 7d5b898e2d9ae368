//! # Attribute Layouts
//!
//! A layout is a fixed, ordered list of attribute types, written as a
//! tuple: `(Vec3, Vec2, Vec4)`. Stride and offsets are associated
//! constants, so they cost nothing at runtime and are computed in exactly
//! one place for both the CPU heap and the GPU vertex attributes.
//!
//! ## Addressing
//!
//! Element `i` of a buffer occupies bytes `[i * STRIDE, (i + 1) * STRIDE)`.
//! Field `N` of that element starts at `i * STRIDE + OFFSET<N>`.
//!
//! ```rust,ignore
//! type Sprite = (Vec3, Vec2);
//! assert_eq!(Sprite::STRIDE, 20);
//! assert_eq!(<Sprite as Field<1>>::OFFSET, 12);
//!
//! let mut bytes = vec![0u8; 4 * Sprite::STRIDE];
//! Sprite::set::<1>(&mut bytes, 2, Vec2::new(0.5, 0.5));
//! ```

mod attribute;
mod descriptor;
mod tuple;
mod view;

use std::ops::Range;

use kiln_core::{fatal, CoreError};

pub use attribute::{Attribute, AttributeFormat};
pub use descriptor::{LayoutDescriptor, RecordCheck};
pub use view::{BufferView, BufferViewMut};

/// Byte offset of field `index` in a layout made of `formats`.
///
/// Indices past the end return the stride.
#[must_use]
pub const fn offset_at(formats: &[AttributeFormat], index: usize) -> usize {
    let mut offset = 0;
    let mut i = 0;
    while i < index && i < formats.len() {
        offset += formats[i].size();
        i += 1;
    }
    offset
}

/// Sum of the sizes of `formats`.
#[must_use]
pub const fn stride_of(formats: &[AttributeFormat]) -> usize {
    offset_at(formats, formats.len())
}

/// A fixed sequence of attribute types with compile-time offsets.
///
/// Implemented for tuples of one to eight [`Attribute`] types.
pub trait AttributeLayout: 'static {
    /// Declared formats, in field order.
    const FORMATS: &'static [AttributeFormat];

    /// Bytes per element.
    const STRIDE: usize = stride_of(Self::FORMATS);

    /// Number of fields.
    const FIELD_COUNT: usize = Self::FORMATS.len();

    /// Offset of field `index`, for code that only knows the index at runtime.
    #[inline]
    #[must_use]
    fn offset(index: usize) -> usize {
        offset_at(Self::FORMATS, index)
    }

    /// Runtime description of this layout, for a drawable.
    #[must_use]
    fn descriptor() -> LayoutDescriptor {
        LayoutDescriptor::new(Self::FORMATS)
    }

    /// Writes field `N` of `element`.
    ///
    /// The value's type is checked against the declared type of field `N`
    /// at compile time.
    ///
    /// # Panics
    ///
    /// Fatal [`CoreError::BoundsViolation`] if the field lies outside `buffer`.
    fn set<const N: usize>(buffer: &mut [u8], element: usize, value: <Self as Field<N>>::Attr)
    where
        Self: Field<N> + Sized,
    {
        let range = field_range::<Self, N>(buffer.len(), element);
        value.write_bytes(&mut buffer[range]);
    }

    /// Reads field `N` of `element`.
    ///
    /// # Panics
    ///
    /// Fatal [`CoreError::BoundsViolation`] if the field lies outside `buffer`.
    #[must_use]
    fn get<const N: usize>(buffer: &[u8], element: usize) -> <Self as Field<N>>::Attr
    where
        Self: Field<N> + Sized,
    {
        let range = field_range::<Self, N>(buffer.len(), element);
        <<Self as Field<N>>::Attr as Attribute>::read_bytes(&buffer[range])
    }
}

/// Static facts about field `N` of a layout.
pub trait Field<const N: usize>: AttributeLayout {
    /// Declared type of the field.
    type Attr: Attribute;

    /// Byte offset of the field inside one element.
    const OFFSET: usize;
}

/// Byte range of field `N` of `element`, or a fatal bounds violation.
fn field_range<L: Field<N>, const N: usize>(len: usize, element: usize) -> Range<usize> {
    let start = element
        .checked_mul(L::STRIDE)
        .and_then(|base| base.checked_add(<L as Field<N>>::OFFSET));
    let size = <<L as Field<N>>::Attr as Attribute>::SIZE;
    checked_range(len, element, start, size)
}

/// Byte range of the whole `element`, or a fatal bounds violation.
pub(crate) fn element_range<L: AttributeLayout>(len: usize, element: usize) -> Range<usize> {
    checked_range(len, element, element.checked_mul(L::STRIDE), L::STRIDE)
}

fn checked_range(len: usize, element: usize, start: Option<usize>, size: usize) -> Range<usize> {
    match start.and_then(|start| start.checked_add(size).map(|end| start..end)) {
        Some(range) if range.end <= len => range,
        Some(range) => fatal(CoreError::BoundsViolation {
            element,
            start: range.start,
            end: range.end,
            len,
        }),
        None => fatal(CoreError::BoundsViolation {
            element,
            start: usize::MAX,
            end: usize::MAX,
            len,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3, Vec4};

    type Sprite = (Vec3, Vec2);

    #[test]
    fn test_stride_and_offsets() {
        assert_eq!(Sprite::STRIDE, 20);
        assert_eq!(<Sprite as Field<0>>::OFFSET, 0);
        assert_eq!(<Sprite as Field<1>>::OFFSET, 12);
        assert_eq!(Sprite::offset(1), 12);
        assert_eq!(Sprite::FIELD_COUNT, 2);

        type Wide = (f32, i32, Vec4, Vec3, Vec2, f32, f32, Vec4);
        assert_eq!(Wide::STRIDE, 4 + 4 + 16 + 12 + 8 + 4 + 4 + 16);
        assert_eq!(<Wide as Field<7>>::OFFSET, 52);
    }

    #[test]
    fn test_set_get() {
        let mut bytes = vec![0u8; 3 * Sprite::STRIDE];
        Sprite::set::<0>(&mut bytes, 2, Vec3::new(1.0, 2.0, 3.0));
        Sprite::set::<1>(&mut bytes, 2, Vec2::new(4.0, 5.0));

        assert_eq!(Sprite::get::<0>(&bytes, 2), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Sprite::get::<1>(&bytes, 2), Vec2::new(4.0, 5.0));
        assert_eq!(Sprite::get::<1>(&bytes, 1), Vec2::ZERO);
    }

    #[test]
    #[should_panic(expected = "bounds violation")]
    fn test_out_of_range_is_fatal() {
        let mut bytes = vec![0u8; 2 * Sprite::STRIDE];
        Sprite::set::<1>(&mut bytes, 2, Vec2::ONE);
    }

    #[test]
    fn test_element_range() {
        assert_eq!(element_range::<Sprite>(60, 2), 40..60);
    }
}
