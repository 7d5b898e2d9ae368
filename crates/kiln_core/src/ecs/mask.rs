//! Fixed-width bit set over kind slots.

use super::registry::{KindId, MAX_SLOTS_PER_ENTITY};

const _: () = assert!(MAX_SLOTS_PER_ENTITY <= u32::BITS as usize);

/// One bit per kind slot. Used for the pending-start and pending-remove queues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SlotMask(u32);

impl SlotMask {
    /// The empty mask.
    pub const EMPTY: Self = Self(0);

    /// Sets the bit for `kind`.
    #[inline]
    pub fn insert(&mut self, kind: KindId) {
        self.0 |= 1 << kind.index();
    }

    /// Clears the bit for `kind`.
    #[inline]
    pub fn remove(&mut self, kind: KindId) {
        self.0 &= !(1 << kind.index());
    }

    /// Checks the bit for `kind`.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: KindId) -> bool {
        (self.0 & (1 << kind.index())) != 0
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Clears every bit, returning the previous contents.
    #[inline]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Iterates the set bits in ascending slot order.
    pub fn iter(self) -> impl Iterator<Item = KindId> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let index = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(KindId::from_index(index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut mask = SlotMask::EMPTY;
        let kind = KindId::from_index(5);
        assert!(!mask.contains(kind));

        mask.insert(kind);
        assert!(mask.contains(kind));
        assert_eq!(mask.len(), 1);

        mask.remove(kind);
        assert!(mask.is_empty());
    }

    #[test]
    fn test_iter_and_take() {
        let mut mask = SlotMask::EMPTY;
        for index in [31, 0, 7] {
            mask.insert(KindId::from_index(index));
        }

        let seen: Vec<usize> = mask.iter().map(KindId::index).collect();
        assert_eq!(seen, vec![0, 7, 31]);

        let taken = mask.take();
        assert_eq!(taken.len(), 3);
        assert!(mask.is_empty());
    }
}
