//! DescriptorSet - the high-level wrapper handed to callers
//!
//! A wrapper owns one pooled native set for as long as it is alive and keeps
//! every resource written into it alive. When the last reference goes away
//! (callers, binding history, command streams), it posts a `ReleasedSet` to
//! its manager, which recycles the native set into its sub-pool.

use std::sync::{Arc, Mutex};
use crossbeam_channel::Sender;
use crate::descriptor::backend::GpuResourceRef;
use crate::descriptor::handles::NativeSet;
use crate::descriptor::layout::{DescriptorSetLayout, LayoutMask};
use crate::descriptor::resource_count::ResourceCount;

/// Everything needed to recycle a native set: its handle, shape and mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReleasedSet {
    pub native: NativeSet,
    pub count: ResourceCount,
    pub mask: LayoutMask,
}

/// A descriptor set obtained from a `DescriptorSetManager`
pub struct DescriptorSet {
    native: NativeSet,
    layout: Arc<DescriptorSetLayout>,
    /// Resources written into this set (append-only)
    resources: Mutex<Vec<GpuResourceRef>>,
    release: Sender<ReleasedSet>,
}

impl DescriptorSet {
    pub(crate) fn new(
        native: NativeSet,
        layout: Arc<DescriptorSetLayout>,
        release: Sender<ReleasedSet>,
    ) -> Self {
        Self {
            native,
            layout,
            resources: Mutex::new(Vec::new()),
            release,
        }
    }

    pub fn native(&self) -> NativeSet {
        self.native
    }

    pub fn layout(&self) -> &Arc<DescriptorSetLayout> {
        &self.layout
    }

    /// Keep `resource` alive for as long as this set is
    pub fn acquire(&self, resource: GpuResourceRef) {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(resource);
    }

    /// Number of resources currently held by this set
    pub fn acquired_count(&self) -> usize {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn released(&self) -> ReleasedSet {
        ReleasedSet {
            native: self.native,
            count: *self.layout.count(),
            mask: *self.layout.mask(),
        }
    }
}

impl Drop for DescriptorSet {
    fn drop(&mut self) {
        // Manager already gone: its pools were destroyed with it
        let _ = self.release.send(self.released());
    }
}
