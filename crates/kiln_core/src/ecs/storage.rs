//! # Component Storage
//!
//! Fixed-capacity, type-indexed slot table with one instance per kind.
//!
//! The storage uses a slot-plus-dense-set strategy:
//! - One pre-sized slot per kind id, so lookups are O(1) by id
//! - A dense list of occupied ids for full sweeps
//! - Swap-remove on the dense list, so sweep order depends only on the
//!   add/remove history of this storage

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use super::registry::{kind_id, kind_name, Family, KindId, MAX_SLOTS_PER_ENTITY};
use crate::error::{CoreError, CoreResult};

/// A concrete kind that can be stored in family `F`.
///
/// Families implement this with a blanket impl over their capability trait,
/// so user types never implement it by hand.
pub trait Member<F: Family>: 'static {
    /// Upcasts a shared handle to the family's capability object.
    fn erase(shared: Rc<RefCell<Self>>) -> Rc<RefCell<F::Object>>;
}

/// Both views of one stored instance: the capability object for sweeps and
/// the concrete type for typed access.
pub(crate) struct SharedSlot<F: Family> {
    object: Rc<RefCell<F::Object>>,
    concrete: Rc<dyn Any>,
}

impl<F: Family> SharedSlot<F> {
    pub(crate) fn new<T: Member<F>>(value: T) -> (Self, Rc<RefCell<T>>) {
        let shared = Rc::new(RefCell::new(value));
        let concrete: Rc<dyn Any> = shared.clone();
        let object = T::erase(Rc::clone(&shared));
        (Self { object, concrete }, shared)
    }
}

struct Occupied<F: Family> {
    slot: SharedSlot<F>,
    /// Position of this kind in the dense list.
    dense: usize,
}

/// Slot table holding at most one instance per kind of family `F`.
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<ComponentFamily> = ComponentStorage::new();
/// storage.add(Velocity(Vec3::X));
/// assert!(storage.has::<Velocity>());
/// ```
pub struct ComponentStorage<F: Family> {
    slots: [Option<Occupied<F>>; MAX_SLOTS_PER_ENTITY],
    populated: Vec<KindId>,
}

impl<F: Family> ComponentStorage<F> {
    /// Creates an empty storage. All slots exist up front.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            populated: Vec::with_capacity(MAX_SLOTS_PER_ENTITY),
        }
    }

    /// Stores `value` in the slot for `T`, releasing any previous instance.
    ///
    /// Returns a shared handle so the caller can configure the new instance.
    pub fn add<T: Member<F>>(&mut self, value: T) -> Rc<RefCell<T>> {
        let kind = kind_id::<F, T>();
        let (slot, shared) = SharedSlot::new(value);
        self.insert_slot(kind, slot);
        shared
    }

    /// Places a prepared slot, returning the instance it replaced.
    pub(crate) fn insert_slot(&mut self, kind: KindId, slot: SharedSlot<F>) -> Option<SharedSlot<F>> {
        if let Some(occupied) = self.slots[kind.index()].as_mut() {
            tracing::trace!(family = F::NAME, kind = kind_name::<F>(kind), "replacing slot");
            return Some(std::mem::replace(&mut occupied.slot, slot));
        }

        let dense = self.populated.len();
        self.populated.push(kind);
        self.slots[kind.index()] = Some(Occupied { slot, dense });
        None
    }

    /// Returns the instance of kind `T`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` is stored.
    pub fn get<T: Member<F>>(&self) -> CoreResult<Rc<RefCell<T>>> {
        let kind = kind_id::<F, T>();
        let occupied = self.slots[kind.index()]
            .as_ref()
            .ok_or_else(CoreError::not_found::<T>)?;

        Rc::clone(&occupied.slot.concrete)
            .downcast::<RefCell<T>>()
            .map_err(|_| CoreError::not_found::<T>())
    }

    /// Returns the instance stored under `kind` as the family capability.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if the slot is empty.
    pub fn get_by_id(&self, kind: KindId) -> CoreResult<Rc<RefCell<F::Object>>> {
        self.slots[kind.index()]
            .as_ref()
            .map(|occupied| Rc::clone(&occupied.slot.object))
            .ok_or(CoreError::NotFound {
                kind: kind_name::<F>(kind),
            })
    }

    /// Checks whether a `T` is stored. Never fails.
    #[inline]
    #[must_use]
    pub fn has<T: Member<F>>(&self) -> bool {
        self.has_id(kind_id::<F, T>())
    }

    /// Checks whether the slot for `kind` is occupied.
    #[inline]
    #[must_use]
    pub fn has_id(&self, kind: KindId) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Releases the instance of kind `T`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if no `T` was stored.
    pub fn remove<T: Member<F>>(&mut self) -> CoreResult<()> {
        self.remove_by_id(kind_id::<F, T>())
    }

    /// Releases the instance stored under `kind`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if the slot was already empty.
    pub fn remove_by_id(&mut self, kind: KindId) -> CoreResult<()> {
        let occupied = self.slots[kind.index()].take().ok_or(CoreError::NotFound {
            kind: kind_name::<F>(kind),
        })?;

        self.populated.swap_remove(occupied.dense);
        if let Some(&moved) = self.populated.get(occupied.dense) {
            if let Some(entry) = self.slots[moved.index()].as_mut() {
                entry.dense = occupied.dense;
            }
        }
        Ok(())
    }

    /// Iterates every stored instance as the family capability.
    ///
    /// Order is unspecified across kinds, but fixed for a given history.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<RefCell<F::Object>>> + '_ {
        self.populated.iter().filter_map(move |kind| {
            self.slots[kind.index()]
                .as_ref()
                .map(|occupied| &occupied.slot.object)
        })
    }

    /// Iterates `(kind, instance)` pairs, in the same order as [`Self::iter`].
    pub fn entries(&self) -> impl Iterator<Item = (KindId, &Rc<RefCell<F::Object>>)> + '_ {
        self.populated.iter().filter_map(move |&kind| {
            self.slots[kind.index()]
                .as_ref()
                .map(|occupied| (kind, &occupied.slot.object))
        })
    }

    /// Iterates the occupied kind ids, in sweep order.
    pub fn kinds(&self) -> impl Iterator<Item = KindId> + '_ {
        self.populated.iter().copied()
    }

    /// Number of stored instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.populated.len()
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.populated.is_empty()
    }

    /// Releases every instance. Slots stay allocated.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.populated.clear();
    }
}

impl<F: Family> Default for ComponentStorage<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Describe {
        fn describe(&self) -> String;
    }

    struct TestFamily;
    impl Family for TestFamily {
        type Object = dyn Describe;
        const NAME: &'static str = "test";
    }

    impl<T: Describe + 'static> Member<TestFamily> for T {
        fn erase(shared: Rc<RefCell<Self>>) -> Rc<RefCell<dyn Describe>> {
            shared
        }
    }

    struct Apple(u32);
    impl Describe for Apple {
        fn describe(&self) -> String {
            format!("apple {}", self.0)
        }
    }

    struct Pear;
    impl Describe for Pear {
        fn describe(&self) -> String {
            "pear".to_owned()
        }
    }

    struct Plum;
    impl Describe for Plum {
        fn describe(&self) -> String {
            "plum".to_owned()
        }
    }

    #[test]
    fn test_add_get_has() {
        let mut storage: ComponentStorage<TestFamily> = ComponentStorage::new();
        assert!(!storage.has::<Apple>());

        let handle = storage.add(Apple(1));
        handle.borrow_mut().0 = 2;

        assert!(storage.has::<Apple>());
        assert_eq!(storage.get::<Apple>().unwrap().borrow().0, 2);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_add_replaces_and_releases() {
        let mut storage: ComponentStorage<TestFamily> = ComponentStorage::new();
        let first = storage.add(Apple(1));
        assert_eq!(Rc::strong_count(&first), 3);

        storage.add(Apple(9));
        // Only the test's handle keeps the replaced instance alive now.
        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get::<Apple>().unwrap().borrow().0, 9);
    }

    #[test]
    fn test_missing_is_not_found() {
        let mut storage: ComponentStorage<TestFamily> = ComponentStorage::new();
        assert!(matches!(storage.get::<Pear>(), Err(CoreError::NotFound { .. })));
        assert!(matches!(storage.remove::<Pear>(), Err(CoreError::NotFound { .. })));

        storage.add(Pear);
        assert!(storage.remove::<Pear>().is_ok());
        assert!(storage.remove::<Pear>().is_err());
    }

    #[test]
    fn test_get_by_id_returns_capability() {
        let mut storage: ComponentStorage<TestFamily> = ComponentStorage::new();
        storage.add(Apple(4));
        let kind = kind_id::<TestFamily, Apple>();
        assert_eq!(storage.get_by_id(kind).unwrap().borrow().describe(), "apple 4");
    }

    #[test]
    fn test_iteration_follows_history() {
        let mut storage: ComponentStorage<TestFamily> = ComponentStorage::new();
        storage.add(Apple(0));
        storage.add(Pear);
        storage.add(Plum);
        storage.remove::<Apple>().unwrap();

        // Plum was swapped into Apple's dense position.
        let names: Vec<String> = storage.iter().map(|o| o.borrow().describe()).collect();
        assert_eq!(names, vec!["plum".to_owned(), "pear".to_owned()]);

        storage.remove::<Plum>().unwrap();
        let names: Vec<String> = storage.iter().map(|o| o.borrow().describe()).collect();
        assert_eq!(names, vec!["pear".to_owned()]);
    }

    #[test]
    fn test_ids_shared_across_storages() {
        let mut a: ComponentStorage<TestFamily> = ComponentStorage::new();
        let mut b: ComponentStorage<TestFamily> = ComponentStorage::new();
        b.add(Pear);
        a.add(Apple(1));

        let ids_a: Vec<KindId> = a.kinds().collect();
        assert_eq!(ids_a, vec![kind_id::<TestFamily, Apple>()]);
        assert!(b.has_id(kind_id::<TestFamily, Pear>()));
    }

    #[test]
    fn test_clear() {
        let mut storage: ComponentStorage<TestFamily> = ComponentStorage::new();
        storage.add(Apple(1));
        storage.add(Pear);
        storage.clear();
        assert!(storage.is_empty());
        assert!(!storage.has::<Pear>());
    }
}
