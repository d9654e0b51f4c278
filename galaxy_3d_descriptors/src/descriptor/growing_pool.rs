//! GrowingPool - unbounded, shape-partitioned collection of sub-pools
//!
//! Sub-pools are grouped by `ResourceCount`. A request scans the sub-pools of
//! its shape in creation order; when none can serve it, a new sub-pool is
//! created, sized `ceil(largest same-shape capacity x growth factor)` or the
//! initial capacity for a shape seen for the first time.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::config::DescriptorPoolConfig;
use crate::descriptor::backend::DescriptorDevice;
use crate::descriptor::handles::NativeSet;
use crate::descriptor::layout::{DescriptorSetLayout, LayoutMask};
use crate::descriptor::resource_count::ResourceCount;
use crate::descriptor::sub_pool::SubPool;
use crate::error::Result;

pub struct GrowingPool {
    device: Arc<dyn DescriptorDevice>,
    config: DescriptorPoolConfig,
    pools: FxHashMap<ResourceCount, Vec<SubPool>>,
}

impl GrowingPool {
    pub fn new(device: Arc<dyn DescriptorDevice>) -> Self {
        Self {
            device,
            config: DescriptorPoolConfig::default(),
            pools: FxHashMap::default(),
        }
    }

    pub fn with_config(device: Arc<dyn DescriptorDevice>, config: DescriptorPoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            device,
            config,
            pools: FxHashMap::default(),
        })
    }

    pub fn config(&self) -> &DescriptorPoolConfig {
        &self.config
    }

    /// Sub-pools serving `count`, in creation order
    pub fn sub_pools(&self, count: &ResourceCount) -> &[SubPool] {
        self.pools.get(count).map_or(&[], Vec::as_slice)
    }

    /// Sum of the capacities of the sub-pools serving `count`
    pub fn total_capacity(&self, count: &ResourceCount) -> u32 {
        self.sub_pools(count).iter().map(SubPool::capacity).sum()
    }

    /// Obtain a native set for `layout`, growing if needed
    ///
    /// Never fails: if the freshly created sub-pool cannot satisfy the request
    /// the underlying allocation primitive is broken and we terminate.
    pub fn obtain_set(&mut self, layout: &DescriptorSetLayout) -> NativeSet {
        let count = *layout.count();
        let same_shape = self.pools.entry(count).or_default();

        let mut largest_capacity: Option<u32> = None;
        for pool in same_shape.iter_mut() {
            if let Some(set) = pool.obtain_set(layout) {
                return set;
            }
            largest_capacity = largest_capacity.max(Some(pool.capacity()));
        }

        let capacity = match largest_capacity {
            Some(previous) => self.config.grown_capacity(previous),
            None => self.config.initial_set_count,
        };

        let pool = match SubPool::new(&self.device, ResourceCount::from_layout_mask(layout.mask()), capacity) {
            Ok(pool) => pool,
            Err(e) => crate::engine_fatal!("galaxy3d::descriptors",
                "Failed to create descriptor sub-pool (capacity {}, count {:?}): {}", capacity, count, e),
        };
        crate::engine_info!("galaxy3d::descriptors",
            "Created descriptor sub-pool {:?}: capacity {} for [{}] (sub-pools of this shape: {})",
            pool.native(), capacity, layout.mask(), same_shape.len() + 1);

        same_shape.push(pool);
        let Some(pool) = same_shape.last_mut() else {
            unreachable!("sub-pool was just pushed");
        };
        match pool.obtain_set(layout) {
            Some(set) => set,
            None => crate::engine_fatal!("galaxy3d::descriptors",
                "New sub-pool failed to obtain a set for [{}]", layout.mask()),
        }
    }

    /// Return `set` to the first sub-pool serving `count`
    pub fn recycle(&mut self, count: &ResourceCount, mask: LayoutMask, set: NativeSet) {
        let Some(pool) = self.pools.get_mut(count).and_then(|pools| pools.first_mut()) else {
            crate::engine_fatal!("galaxy3d::descriptors",
                "Recycling set {:?} of shape {:?} that no sub-pool serves", set, count);
        };
        pool.recycle(mask, set);
        crate::engine_trace!("galaxy3d::descriptors", "Recycled set {:?} [{}]", set, mask);
    }
}

#[cfg(test)]
#[path = "growing_pool_tests.rs"]
mod tests;
