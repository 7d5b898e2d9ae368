//! # Kind Registry
//!
//! Assigns every distinct behavior/component type a small dense integer,
//! shared by all storages of the same capability family.
//!
//! Ids are handed out lazily on first use and never change for the rest of
//! the process. Two families may reuse the same integer independently.
//!
//! The global table is only locked on a thread's first lookup of a kind.
//! After that the id comes from a per-thread cache.

use std::any::{type_name, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::error::{fatal, CoreError};

/// Maximum number of distinct kinds per family, and therefore the number
/// of slots every storage carries.
pub const MAX_SLOTS_PER_ENTITY: usize = 32;

/// A capability family: the common interface a set of kinds is stored as.
///
/// Families are zero-sized markers. The associated object type is what a
/// storage hands out during a full sweep.
pub trait Family: 'static {
    /// The shared capability, usually a trait object such as `dyn Action`.
    type Object: ?Sized + 'static;

    /// Family name used in diagnostics.
    const NAME: &'static str;
}

/// Dense per-family kind id. Always below [`MAX_SLOTS_PER_ENTITY`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct KindId(u8);

impl KindId {
    /// Builds an id from a slot index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a valid slot.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        assert!(index < MAX_SLOTS_PER_ENTITY, "kind index out of range");
        Self(index as u8)
    }

    /// Returns the slot index this id addresses.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Default)]
struct FamilyTable {
    ids: HashMap<TypeId, KindId>,
    names: Vec<&'static str>,
}

type Registry = HashMap<TypeId, FamilyTable>;

fn registry() -> &'static Mutex<Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

thread_local! {
    /// `(family, kind)` to id, filled from the global table.
    static CACHE: RefCell<HashMap<(TypeId, TypeId), KindId>> = RefCell::new(HashMap::new());
}

/// Returns the id of kind `T` inside family `F`, registering it on first use.
///
/// Registering more than [`MAX_SLOTS_PER_ENTITY`] kinds in one family is a
/// build-time sizing error and aborts.
#[must_use]
pub fn kind_id<F: Family, T: 'static>() -> KindId {
    let key = (TypeId::of::<F>(), TypeId::of::<T>());
    if let Some(id) = CACHE.with(|cache| cache.borrow().get(&key).copied()) {
        return id;
    }

    let id = lookup_or_register::<F, T>();
    CACHE.with(|cache| cache.borrow_mut().insert(key, id));
    id
}

fn lookup_or_register<F: Family, T: 'static>() -> KindId {
    let mut registry = registry().lock();
    let table = registry.entry(TypeId::of::<F>()).or_default();

    if let Some(&id) = table.ids.get(&TypeId::of::<T>()) {
        return id;
    }

    let next = table.names.len();
    if next >= MAX_SLOTS_PER_ENTITY {
        drop(registry);
        fatal(CoreError::CapacityExceeded {
            what: "distinct kinds in one family",
            limit: MAX_SLOTS_PER_ENTITY,
        });
    }

    let id = KindId::from_index(next);
    table.ids.insert(TypeId::of::<T>(), id);
    table.names.push(type_name::<T>());
    drop(registry);

    tracing::trace!(family = F::NAME, kind = type_name::<T>(), id = next, "registered kind");
    id
}

/// Returns the type name registered under `id` in family `F`.
#[must_use]
pub fn kind_name<F: Family>(id: KindId) -> &'static str {
    registry()
        .lock()
        .get(&TypeId::of::<F>())
        .and_then(|table| table.names.get(id.index()).copied())
        .unwrap_or("<unregistered>")
}

/// Returns how many kinds family `F` has registered so far.
#[must_use]
pub fn registered_kinds<F: Family>() -> usize {
    registry()
        .lock()
        .get(&TypeId::of::<F>())
        .map_or(0, |table| table.names.len())
}
