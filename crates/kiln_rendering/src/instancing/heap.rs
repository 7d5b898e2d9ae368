//! # Batch Memory Heap
//!
//! One flat byte buffer per batch, sized `capacity * STRIDE` at
//! construction and never resized.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use bytemuck::Pod;

use crate::layout::{element_range, AttributeLayout, BufferView, BufferViewMut, Field, RecordCheck};

/// Fixed-capacity per-instance storage for layout `L`.
pub struct BatchMemoryHeap<L: AttributeLayout> {
    bytes: Box<[u8]>,
    capacity: usize,
    _layout: PhantomData<L>,
}

/// A heap shared between its batch root and the members bound to it.
pub type SharedHeap<L> = Rc<RefCell<BatchMemoryHeap<L>>>;

impl<L: AttributeLayout> BatchMemoryHeap<L> {
    /// Allocates a zeroed heap for `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity * STRIDE` overflows `usize`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let len = capacity
            .checked_mul(L::STRIDE)
            .unwrap_or_else(|| panic!("heap of {capacity} elements overflows usize"));

        Self {
            bytes: vec![0u8; len].into_boxed_slice(),
            capacity,
            _layout: PhantomData,
        }
    }

    /// Allocates a heap and wraps it for sharing.
    #[must_use]
    pub fn shared(capacity: usize) -> SharedHeap<L> {
        Rc::new(RefCell::new(Self::new(capacity)))
    }

    /// Number of elements the heap holds.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size in bytes.
    #[inline]
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// The whole heap.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Writes field `N` of `element`.
    #[inline]
    pub fn set<const N: usize>(&mut self, element: usize, value: <L as Field<N>>::Attr)
    where
        L: Field<N>,
    {
        L::set::<N>(&mut self.bytes, element, value);
    }

    /// Reads field `N` of `element`.
    #[inline]
    #[must_use]
    pub fn get<const N: usize>(&self, element: usize) -> <L as Field<N>>::Attr
    where
        L: Field<N>,
    {
        L::get::<N>(&self.bytes, element)
    }

    /// Typed read-only view.
    #[must_use]
    pub fn view(&self) -> BufferView<'_, L> {
        BufferView::new(&self.bytes)
    }

    /// Typed mutable view.
    #[must_use]
    pub fn view_mut(&mut self) -> BufferViewMut<'_, L> {
        BufferViewMut::new(&mut self.bytes)
    }

    /// Raw bytes of one element.
    pub(crate) fn element_mut(&mut self, element: usize) -> &mut [u8] {
        let range = element_range::<L>(self.bytes.len(), element);
        &mut self.bytes[range]
    }

    /// Copies element `from` over element `to`.
    pub(crate) fn copy_element(&mut self, from: usize, to: usize) {
        let source = element_range::<L>(self.bytes.len(), from);
        let target = element_range::<L>(self.bytes.len(), to);
        self.bytes.copy_within(source, target.start);
    }
}

/// A member's handle to its own element of a shared heap.
///
/// The handle never exposes other elements.
pub struct HeapSlot<L: AttributeLayout> {
    heap: SharedHeap<L>,
    index: usize,
}

impl<L: AttributeLayout> HeapSlot<L> {
    pub(crate) fn new(heap: SharedHeap<L>, index: usize) -> Self {
        Self { heap, index }
    }

    /// The element this slot addresses.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Checks whether this slot lives in `heap`.
    #[must_use]
    pub fn is_in(&self, heap: &SharedHeap<L>) -> bool {
        Rc::ptr_eq(&self.heap, heap)
    }

    /// Writes field `N` of this slot's element.
    pub fn set<const N: usize>(&self, value: <L as Field<N>>::Attr)
    where
        L: Field<N>,
    {
        self.heap.borrow_mut().set::<N>(self.index, value);
    }

    /// Reads field `N` of this slot's element.
    #[must_use]
    pub fn get<const N: usize>(&self) -> <L as Field<N>>::Attr
    where
        L: Field<N>,
    {
        self.heap.borrow().get::<N>(self.index)
    }

    /// Writes a whole element from a POD record of exactly `STRIDE` bytes.
    ///
    /// A record of the wrong size fails to compile.
    pub fn write_record<R: Pod>(&self, record: &R) {
        let () = RecordCheck::<L, R>::MATCHES_STRIDE;
        self.heap
            .borrow_mut()
            .element_mut(self.index)
            .copy_from_slice(bytemuck::bytes_of(record));
    }

    /// Points the slot at another element of the same heap.
    pub(crate) fn relocate(&mut self, index: usize) {
        self.index = index;
    }
}
