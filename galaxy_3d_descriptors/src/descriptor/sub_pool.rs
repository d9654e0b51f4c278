//! SubPool - fixed-capacity arena of descriptor sets for one shape
//!
//! A sub-pool owns one native pool provisioned for `shape x capacity`
//! descriptors. It never grows: the growing pool creates a larger sibling
//! instead. Recycled sets are kept in free-lists keyed by the exact layout
//! mask, so two layouts sharing a shape share the capacity budget but never
//! receive each other's sets.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::descriptor::backend::DescriptorDevice;
use crate::descriptor::handles::{NativePool, NativeSet};
use crate::descriptor::layout::{DescriptorSetLayout, LayoutMask};
use crate::descriptor::resource_count::ResourceCount;
use crate::error::Result;

pub struct SubPool {
    device: Arc<dyn DescriptorDevice>,
    pool: NativePool,
    count: ResourceCount,
    capacity: u32,
    /// Native sets allocated from `pool` so far (never decreases)
    size: u32,
    /// Sets currently sitting in the free-lists
    unused_count: u32,
    unused: FxHashMap<LayoutMask, Vec<NativeSet>>,
}

impl SubPool {
    /// Create the native pool for `capacity` sets of shape `count`
    pub fn new(device: &Arc<dyn DescriptorDevice>, count: ResourceCount, capacity: u32) -> Result<Self> {
        let pool = device.create_descriptor_pool(&(count * capacity), capacity)?;
        Ok(Self {
            device: Arc::clone(device),
            pool,
            count,
            capacity,
            size: 0,
            unused_count: 0,
            unused: FxHashMap::default(),
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of native sets allocated from this sub-pool
    pub fn allocated(&self) -> u32 {
        self.size
    }

    /// Number of recycled sets waiting for reuse
    pub fn unused_count(&self) -> u32 {
        self.unused_count
    }

    pub fn count(&self) -> &ResourceCount {
        &self.count
    }

    pub fn native(&self) -> NativePool {
        self.pool
    }

    /// Whether sets of shape `count` come from this sub-pool
    #[inline]
    pub fn can_allocate(&self, count: &ResourceCount) -> bool {
        *count == self.count
    }

    /// Hand out a set for `layout`, or `None` to let the caller try elsewhere
    ///
    /// Once a free-list exists for the layout's mask, only that list is used:
    /// an empty list yields `None` even if the pool still has room.
    pub fn obtain_set(&mut self, layout: &DescriptorSetLayout) -> Option<NativeSet> {
        debug_assert!(self.can_allocate(layout.count()), "layout shape does not match sub-pool");

        if let Some(sets) = self.unused.get_mut(layout.mask()) {
            let set = sets.pop()?;
            self.unused_count -= 1;
            crate::engine_trace!("galaxy3d::descriptors", "Reusing recycled set {:?}", set);
            return Some(set);
        }

        if self.size >= self.capacity {
            return None;
        }

        match self.device.allocate_descriptor_set(self.pool, layout.native()) {
            Ok(set) => {
                self.size += 1;
                Some(set)
            }
            Err(e) => crate::engine_fatal!("galaxy3d::descriptors",
                "Failed to allocate descriptor set: {} (size={} capacity={} count={:?})",
                e, self.size, self.capacity, self.count),
        }
    }

    /// Make `set` available again for layouts with `mask`
    ///
    /// The native set stays provisioned; `allocated()` does not shrink.
    pub fn recycle(&mut self, mask: LayoutMask, set: NativeSet) {
        self.unused.entry(mask).or_default().push(set);
        self.unused_count += 1;
    }
}

impl Drop for SubPool {
    fn drop(&mut self) {
        // Destroying the pool frees every set allocated from it
        self.device.destroy_descriptor_pool(self.pool);
    }
}

#[cfg(test)]
#[path = "sub_pool_tests.rs"]
mod tests;
