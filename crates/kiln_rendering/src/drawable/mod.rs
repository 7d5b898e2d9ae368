//! # Drawables
//!
//! The renderer-side resource a batch draws through. A batch sets its mesh
//! and material once, reports its member count whenever it changes, and
//! uploads its heap once per frame.

mod gpu;

use kiln_core::{MaterialHandle, MeshHandle};
use serde::Deserialize;

use crate::layout::{AttributeFormat, LayoutDescriptor};

pub use gpu::GpuInstanceBuffer;

/// How often the uploaded instance data is expected to change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageHint {
    /// Written once, drawn many times.
    Static,
    /// Rewritten most frames.
    #[default]
    Dynamic,
    /// Rewritten every frame and drawn once.
    Stream,
}

/// A shared mesh/material pair that can draw many instances in one call.
pub trait Drawable {
    /// Sets the mesh every instance is drawn with.
    fn set_mesh(&mut self, mesh: MeshHandle);

    /// Sets the material every instance is drawn with.
    fn set_material(&mut self, material: MaterialHandle);

    /// Sets how many instances the next draw covers.
    fn set_instance_count(&mut self, count: usize);

    /// Copies per-instance data to the renderer.
    ///
    /// `bytes` is the whole heap; only the first `instance_count * stride`
    /// bytes are live.
    fn upload_per_instance(
        &mut self,
        layout: &LayoutDescriptor,
        stride: usize,
        instance_count: usize,
        bytes: &[u8],
        usage: UsageHint,
    );
}

/// Copy of the most recent upload received by a [`HeadlessDrawable`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadRecord {
    /// Formats of the uploaded layout.
    pub formats: Vec<AttributeFormat>,
    /// Bytes per instance.
    pub stride: usize,
    /// Live instances.
    pub instance_count: usize,
    /// The live prefix of the heap.
    pub bytes: Vec<u8>,
    /// Usage hint passed with the upload.
    pub usage: UsageHint,
}

/// A drawable with no GPU behind it. Records what it is given.
///
/// Used by the headless server build and by tests.
#[derive(Clone, Debug, Default)]
pub struct HeadlessDrawable {
    mesh: Option<MeshHandle>,
    material: Option<MaterialHandle>,
    instance_count: usize,
    uploads: u64,
    bytes_uploaded: u64,
    last_upload: Option<UploadRecord>,
}

impl HeadlessDrawable {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh set by the batch.
    #[inline]
    #[must_use]
    pub const fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    /// Material set by the batch.
    #[inline]
    #[must_use]
    pub const fn material(&self) -> Option<MaterialHandle> {
        self.material
    }

    /// Instance count most recently reported.
    #[inline]
    #[must_use]
    pub const fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Number of uploads received.
    #[inline]
    #[must_use]
    pub const fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Live bytes received over all uploads.
    #[inline]
    #[must_use]
    pub const fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded
    }

    /// The most recent upload.
    #[inline]
    #[must_use]
    pub fn last_upload(&self) -> Option<&UploadRecord> {
        self.last_upload.as_ref()
    }
}

impl Drawable for HeadlessDrawable {
    fn set_mesh(&mut self, mesh: MeshHandle) {
        self.mesh = Some(mesh);
    }

    fn set_material(&mut self, material: MaterialHandle) {
        self.material = Some(material);
    }

    fn set_instance_count(&mut self, count: usize) {
        self.instance_count = count;
    }

    fn upload_per_instance(
        &mut self,
        layout: &LayoutDescriptor,
        stride: usize,
        instance_count: usize,
        bytes: &[u8],
        usage: UsageHint,
    ) {
        let live = &bytes[..stride * instance_count];
        let record = self.last_upload.get_or_insert_with(UploadRecord::default);

        // Reuse the previous allocations
        record.formats.clear();
        record.formats.extend_from_slice(layout.formats());
        record.bytes.clear();
        record.bytes.extend_from_slice(live);
        record.stride = stride;
        record.instance_count = instance_count;
        record.usage = usage;

        self.uploads += 1;
        self.bytes_uploaded += live.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::AttributeLayout;

    #[test]
    fn test_headless_records_live_prefix() {
        let mut drawable = HeadlessDrawable::new();
        let descriptor = <(f32,) as AttributeLayout>::descriptor();
        let heap = [1u8; 16];

        drawable.upload_per_instance(&descriptor, 4, 2, &heap, UsageHint::Stream);

        let record = drawable.last_upload().unwrap();
        assert_eq!(record.bytes.len(), 8);
        assert_eq!(record.formats, vec![AttributeFormat::Float]);
        assert_eq!(record.usage, UsageHint::Stream);
        assert_eq!(drawable.bytes_uploaded(), 8);
    }

    #[test]
    fn test_usage_hint_default() {
        assert_eq!(UsageHint::default(), UsageHint::Dynamic);
    }
}
