//! GPU-side mirror of a batch heap.
//!
//! Keeps one vertex buffer sized to the live instance data, grows it when a
//! batch outgrows it and writes it through the queue once per upload.

use std::ops::Range;
use std::sync::Arc;

use kiln_core::{MaterialHandle, MeshHandle};

use super::{Drawable, UsageHint};
use crate::layout::LayoutDescriptor;

/// Smallest buffer ever allocated, in bytes.
const MIN_BUFFER_SIZE: u64 = 1024;

/// A wgpu vertex buffer holding per-instance attributes.
pub struct GpuInstanceBuffer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    label: String,
    buffer: wgpu::Buffer,
    capacity: u64,
    live_bytes: u64,
    instance_count: u32,
    mesh: MeshHandle,
    material: MaterialHandle,
    usage: UsageHint,
}

impl GpuInstanceBuffer {
    /// Allocates a buffer of at least `initial_bytes`.
    #[must_use]
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        label: impl Into<String>,
        initial_bytes: u64,
    ) -> Self {
        let label = label.into();
        let capacity = initial_bytes.max(MIN_BUFFER_SIZE);
        let buffer = create_instance_buffer(&device, &label, capacity);

        Self {
            device,
            queue,
            label,
            buffer,
            capacity,
            live_bytes: 0,
            instance_count: 0,
            mesh: MeshHandle::default(),
            material: MaterialHandle::default(),
            usage: UsageHint::default(),
        }
    }

    /// Ensure the buffer holds `needed` bytes. Returns true if it was reallocated.
    pub fn ensure_capacity(&mut self, needed: u64) -> bool {
        if needed <= self.capacity {
            return false;
        }

        let capacity = needed.saturating_mul(2).max(MIN_BUFFER_SIZE);
        self.buffer = create_instance_buffer(&self.device, &self.label, capacity);
        self.capacity = capacity;
        tracing::debug!(label = %self.label, capacity, "grew instance buffer");
        true
    }

    /// The vertex buffer to bind at the instance slot.
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// The live part of the buffer.
    #[must_use]
    pub fn live_slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..self.live_bytes)
    }

    /// Instance range for the draw call.
    #[inline]
    #[must_use]
    pub const fn instances(&self) -> Range<u32> {
        0..self.instance_count
    }

    /// Mesh to draw.
    #[inline]
    #[must_use]
    pub const fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    /// Material to draw with.
    #[inline]
    #[must_use]
    pub const fn material(&self) -> MaterialHandle {
        self.material
    }

    /// Usage hint of the most recent upload.
    #[inline]
    #[must_use]
    pub const fn usage(&self) -> UsageHint {
        self.usage
    }
}

fn create_instance_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl Drawable for GpuInstanceBuffer {
    fn set_mesh(&mut self, mesh: MeshHandle) {
        self.mesh = mesh;
    }

    fn set_material(&mut self, material: MaterialHandle) {
        self.material = material;
    }

    fn set_instance_count(&mut self, count: usize) {
        self.instance_count = count as u32;
    }

    fn upload_per_instance(
        &mut self,
        layout: &LayoutDescriptor,
        stride: usize,
        instance_count: usize,
        bytes: &[u8],
        usage: UsageHint,
    ) {
        debug_assert_eq!(layout.stride(), stride);

        let live = &bytes[..stride * instance_count];
        self.ensure_capacity(live.len() as u64);
        if !live.is_empty() {
            self.queue.write_buffer(&self.buffer, 0, live);
        }

        self.live_bytes = live.len() as u64;
        self.instance_count = instance_count as u32;
        self.usage = usage;
        tracing::trace!(label = %self.label, instance_count, bytes = live.len(), ?usage, "instance upload");
    }
}
