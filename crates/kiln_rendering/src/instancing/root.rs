//! # Batch Root
//!
//! Owns a batch heap, the mesh and material every member shares, and the
//! single draw call that covers all of them.
//!
//! ## Membership
//!
//! Members occupy the heap prefix `[0, batch_size)`. Removing a member moves
//! the last member into its element, so the prefix stays packed and an
//! upload never contains holes.

use std::cell::Ref;
use std::collections::HashMap;

use kiln_core::{fatal, CoreError, CoreResult, MaterialHandle, MeshHandle, Phased};

use super::heap::{BatchMemoryHeap, SharedHeap};
use super::instance::BatchedInstance;
use super::rules::BatchRule;
use crate::drawable::{Drawable, UsageHint};
use crate::layout::AttributeLayout;

/// Stable handle to a batch member. Survives re-indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceHandle(u32);

impl InstanceHandle {
    /// Raw handle value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Upload statistics for one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Uploads performed.
    pub uploads: u64,
    /// Live bytes handed to the drawable over all uploads.
    pub bytes_uploaded: u64,
    /// Instance count of the most recent upload.
    pub last_instance_count: usize,
}

/// A batch of members drawn with one mesh, one material and one call.
///
/// # Type Parameters
///
/// * `R` - Rule that writes each member's heap element
/// * `D` - Renderer resource the heap is uploaded to
pub struct BatchRoot<R: BatchRule, D: Drawable> {
    heap: SharedHeap<R::Layout>,
    drawable: D,
    mesh: MeshHandle,
    material: MaterialHandle,
    /// Dense member list; member `i` owns heap element `i`.
    members: Vec<BatchedInstance<R>>,
    /// Handle of member `i`.
    handles: Vec<InstanceHandle>,
    lookup: HashMap<InstanceHandle, usize>,
    next_handle: u32,
    usage: UsageHint,
    stats: BatchStats,
}

impl<R: BatchRule, D: Drawable> BatchRoot<R, D> {
    /// Creates an empty batch with room for `capacity` members.
    ///
    /// The drawable receives the mesh, the material and an instance count
    /// of zero immediately.
    ///
    /// # Panics
    ///
    /// Panics if the heap size overflows.
    #[must_use]
    pub fn new(
        capacity: usize,
        mesh: MeshHandle,
        material: MaterialHandle,
        mut drawable: D,
        usage: UsageHint,
    ) -> Self {
        drawable.set_mesh(mesh);
        drawable.set_material(material);
        drawable.set_instance_count(0);

        Self {
            heap: BatchMemoryHeap::shared(capacity),
            drawable,
            mesh,
            material,
            members: Vec::with_capacity(capacity),
            handles: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
            next_handle: 0,
            usage,
            stats: BatchStats::default(),
        }
    }

    /// Joins `instance` to the batch.
    ///
    /// # Panics
    ///
    /// Fatal [`CoreError::CapacityExceeded`] if the batch is full, and fatal
    /// [`CoreError::DoubleBinding`] if `instance` is already bound.
    pub fn add(&mut self, instance: BatchedInstance<R>) -> InstanceHandle {
        match self.try_add(instance) {
            Ok(handle) => handle,
            Err(error) => fatal(error),
        }
    }

    /// Joins `instance` to the batch unless it is full.
    ///
    /// The member is bound to the next free heap element and the drawable's
    /// instance count is updated.
    ///
    /// # Errors
    ///
    /// [`CoreError::CapacityExceeded`] if every heap element is taken. The
    /// batch is left unchanged.
    ///
    /// # Panics
    ///
    /// Fatal [`CoreError::DoubleBinding`] if `instance` is already bound.
    pub fn try_add(&mut self, mut instance: BatchedInstance<R>) -> CoreResult<InstanceHandle> {
        let capacity = self.capacity();
        if self.members.len() >= capacity {
            return Err(CoreError::CapacityExceeded {
                what: "batch members",
                limit: capacity,
            });
        }

        let index = self.members.len();
        instance.assign_to_memory_heap(&self.heap, index);

        let handle = InstanceHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        self.members.push(instance);
        self.handles.push(handle);
        self.lookup.insert(handle, index);
        self.drawable.set_instance_count(self.members.len());

        tracing::trace!(handle = handle.raw(), index, "batch member joined");
        Ok(handle)
    }

    /// Detaches a member and returns it unbound.
    ///
    /// The last member moves into the freed heap element.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`] if `handle` is not a member.
    pub fn remove(&mut self, handle: InstanceHandle) -> CoreResult<BatchedInstance<R>> {
        let Some(index) = self.lookup.remove(&handle) else {
            return Err(CoreError::NotFound {
                kind: "batch member",
            });
        };

        let last = self.members.len() - 1;
        if index != last {
            self.heap.borrow_mut().copy_element(last, index);
        }

        let mut removed = self.members.swap_remove(index);
        self.handles.swap_remove(index);
        if index < last {
            self.members[index].relocate(index);
            self.lookup.insert(self.handles[index], index);
        }

        removed.unbind();
        self.drawable.set_instance_count(self.members.len());
        tracing::trace!(handle = handle.raw(), index, "batch member left");
        Ok(removed)
    }

    /// Detaches every member whose liveness flag is cleared.
    ///
    /// # Returns
    ///
    /// How many members were removed.
    pub fn remove_dead(&mut self) -> usize {
        let mut removed = 0;
        // Descending, so a swapped-in member has already been checked
        for index in (0..self.members.len()).rev() {
            if !self.members[index].is_alive() {
                let handle = self.handles[index];
                if self.remove(handle).is_ok() {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            tracing::debug!(removed, remaining = self.members.len(), "batch sweep");
        }
        removed
    }

    /// Looks up a member.
    #[must_use]
    pub fn get(&self, handle: InstanceHandle) -> Option<&BatchedInstance<R>> {
        self.lookup.get(&handle).map(|&index| &self.members[index])
    }

    /// Looks up a member mutably.
    pub fn get_mut(&mut self, handle: InstanceHandle) -> Option<&mut BatchedInstance<R>> {
        self.lookup
            .get(&handle)
            .map(|&index| &mut self.members[index])
    }

    /// Iterates members in heap order.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceHandle, &BatchedInstance<R>)> + '_ {
        self.handles.iter().copied().zip(self.members.iter())
    }

    /// Joined member count.
    #[inline]
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.members.len()
    }

    /// Maximum member count, fixed at construction.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.heap.borrow().capacity()
    }

    /// Read-only view of the heap.
    ///
    /// The shared handle itself never leaves the root, so nothing outside
    /// the batch can bind to one of its elements:
    ///
    /// ```compile_fail
    /// use kiln_core::{EntityId, MaterialHandle, MeshHandle};
    /// use kiln_rendering::{BatchRoot, BatchedInstance, HeadlessDrawable, TransformRule, UsageHint};
    ///
    /// let mut batch = BatchRoot::<TransformRule, _>::new(
    ///     1,
    ///     MeshHandle::new(0),
    ///     MaterialHandle::new(0),
    ///     HeadlessDrawable::new(),
    ///     UsageHint::Dynamic,
    /// );
    /// batch.add(BatchedInstance::new(EntityId::new(0, 0)));
    ///
    /// let mut rogue = BatchedInstance::<TransformRule>::new(EntityId::new(1, 0));
    /// rogue.assign_to_memory_heap(batch.heap(), 0);
    /// ```
    #[inline]
    #[must_use]
    pub fn heap(&self) -> Ref<'_, BatchMemoryHeap<R::Layout>> {
        self.heap.borrow()
    }

    /// The drawable the batch uploads to.
    #[inline]
    #[must_use]
    pub const fn drawable(&self) -> &D {
        &self.drawable
    }

    /// Mutable access to the drawable.
    #[inline]
    pub fn drawable_mut(&mut self) -> &mut D {
        &mut self.drawable
    }

    /// Mesh shared by every member.
    #[inline]
    #[must_use]
    pub const fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    /// Material shared by every member.
    #[inline]
    #[must_use]
    pub const fn material(&self) -> MaterialHandle {
        self.material
    }

    /// Usage hint passed with each upload.
    #[inline]
    #[must_use]
    pub const fn usage(&self) -> UsageHint {
        self.usage
    }

    /// Upload statistics.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Render-phase hook of every member's actions.
    pub fn pre_draw(&mut self) {
        for member in &mut self.members {
            member.pre_draw();
        }
    }

    /// Writes every member into its heap element, then uploads the heap once.
    ///
    /// Nothing is uploaded while the batch is empty.
    pub fn upload_instances(&mut self) {
        for member in &self.members {
            member.update_memory_heap();
        }

        let count = self.members.len();
        if count == 0 {
            return;
        }

        let stride = <R::Layout as AttributeLayout>::STRIDE;
        let descriptor = <R::Layout as AttributeLayout>::descriptor();
        let heap = self.heap.borrow();
        self.drawable
            .upload_per_instance(&descriptor, stride, count, heap.as_bytes(), self.usage);

        let bytes = (stride * count) as u64;
        self.stats.uploads += 1;
        self.stats.bytes_uploaded += bytes;
        self.stats.last_instance_count = count;
        tracing::debug!(count, bytes, "batch upload");
    }

    /// Runs the three tick phases across the batch, then renders.
    pub fn update(&mut self, delta: f32) {
        Phased::drain_removals(self);
        Phased::drain_starts(self);
        Phased::run_updates(self, delta);
        Phased::render(self);
    }
}

impl<R: BatchRule, D: Drawable> Phased for BatchRoot<R, D> {
    fn drain_removals(&mut self) {
        for member in &mut self.members {
            member.drain_removals();
        }
    }

    fn drain_starts(&mut self) {
        for member in &mut self.members {
            member.drain_starts();
        }
    }

    fn run_updates(&mut self, delta: f32) {
        for member in &mut self.members {
            member.run_updates(delta);
        }
        self.remove_dead();
    }

    fn render(&mut self) {
        self.pre_draw();
        self.upload_instances();
    }
}
