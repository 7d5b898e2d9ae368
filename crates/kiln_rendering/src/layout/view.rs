//! Typed element views over raw byte buffers.

use std::marker::PhantomData;

use super::{element_range, AttributeLayout, Field};

/// Read-only view of a byte buffer as elements of layout `L`.
#[derive(Clone, Copy)]
pub struct BufferView<'a, L: AttributeLayout> {
    bytes: &'a [u8],
    _layout: PhantomData<L>,
}

impl<'a, L: AttributeLayout> BufferView<'a, L> {
    /// Wraps `bytes`. A trailing partial element is ignored.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            _layout: PhantomData,
        }
    }

    /// Number of whole elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len() / L::STRIDE
    }

    /// Returns `true` if no whole element fits.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads field `N` of `element`.
    #[inline]
    #[must_use]
    pub fn get<const N: usize>(&self, element: usize) -> <L as Field<N>>::Attr
    where
        L: Field<N>,
    {
        L::get::<N>(self.bytes, element)
    }

    /// Raw bytes of one element.
    #[must_use]
    pub fn element(&self, element: usize) -> &'a [u8] {
        &self.bytes[element_range::<L>(self.bytes.len(), element)]
    }

    /// The underlying bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Mutable view of a byte buffer as elements of layout `L`.
pub struct BufferViewMut<'a, L: AttributeLayout> {
    bytes: &'a mut [u8],
    _layout: PhantomData<L>,
}

impl<'a, L: AttributeLayout> BufferViewMut<'a, L> {
    /// Wraps `bytes`. A trailing partial element is ignored.
    #[must_use]
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self {
            bytes,
            _layout: PhantomData,
        }
    }

    /// Number of whole elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len() / L::STRIDE
    }

    /// Returns `true` if no whole element fits.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes field `N` of `element`.
    #[inline]
    pub fn set<const N: usize>(&mut self, element: usize, value: <L as Field<N>>::Attr)
    where
        L: Field<N>,
    {
        L::set::<N>(self.bytes, element, value);
    }

    /// Reads field `N` of `element`.
    #[inline]
    #[must_use]
    pub fn get<const N: usize>(&self, element: usize) -> <L as Field<N>>::Attr
    where
        L: Field<N>,
    {
        L::get::<N>(self.bytes, element)
    }

    /// Raw bytes of one element.
    pub fn element_mut(&mut self, element: usize) -> &mut [u8] {
        let range = element_range::<L>(self.bytes.len(), element);
        &mut self.bytes[range]
    }

    /// Read-only view of the same bytes.
    #[must_use]
    pub fn as_view(&self) -> BufferView<'_, L> {
        BufferView::new(self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    type Pair = (f32, Vec2);

    #[test]
    fn test_views_share_addressing() {
        let mut bytes = vec![0u8; 4 * Pair::STRIDE + 3];
        let mut view = BufferViewMut::<Pair>::new(&mut bytes);
        assert_eq!(view.len(), 4);

        view.set::<0>(3, 7.0);
        view.set::<1>(3, Vec2::new(1.0, 2.0));
        assert_eq!(view.get::<1>(3), Vec2::new(1.0, 2.0));

        let read = BufferView::<Pair>::new(&bytes);
        assert_eq!(read.get::<0>(3), 7.0);
        assert_eq!(read.element(3).len(), 12);
    }
}
