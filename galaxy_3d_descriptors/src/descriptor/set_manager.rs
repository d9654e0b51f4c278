//! DescriptorSetManager - public entry point of the descriptor core
//!
//! Owns the growing pool, one `BindingHistory` per live set, and the stashed
//! sets staged for the next commit. Writes are applied to the native set
//! immediately; binds are only staged by `bind()` and flushed lazily by
//! `commit()`, which re-issues bind commands only for slots whose content
//! changed since they were last bound.
//!
//! Set lifecycle:
//!
//! ```text
//! Free --create_set--> Allocated/Unbound --bind--> Staged --commit--> Bound
//!                            ^                                          |
//!                            +------------- write / offsets ------------+
//! any state --destroy_set + last reference dropped--> ReleasedSet --> Free
//! ```
//!
//! Single-threaded: one manager per command-recording thread.

use std::sync::Arc;
use crossbeam_channel::{Receiver, Sender};
use rustc_hash::FxHashMap;
use crate::config::{DescriptorPoolConfig, MAX_DESCRIPTOR_SET_COUNT};
use crate::descriptor::backend::{
    BufferResource, CommandStream, DescriptorBufferInfo, DescriptorDevice, DescriptorImageInfo,
    DescriptorWrite, DescriptorWriteInfo, GpuResourceRef, ImageSubresourceRange, ImageViewType,
    TextureResource, TextureUsage, WriteDescriptorType,
};
use crate::descriptor::binding_history::{BindingHistory, DescriptorSetOffsets};
use crate::descriptor::descriptor_set::{DescriptorSet, ReleasedSet};
use crate::descriptor::growing_pool::GrowingPool;
use crate::descriptor::handles::{NativePipelineLayout, NativeSampler, NativeSet};
use crate::descriptor::layout::{BindingKind, DescriptorSetLayout};
use crate::error::Result;

/// State of a stashed-set slot as seen by the next commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// No set staged in this slot
    Unbound,
    /// A set is staged and needs a bind command
    StagedDirty,
    /// A set is staged and already bound with its current content
    StagedClean,
}

/// Snapshot of the last commit
#[derive(Debug, Clone, Copy, Default)]
struct BoundInfo {
    pipeline_layout: NativePipelineLayout,
    set_mask: u8,
    bound_sets: [Option<NativeSet>; MAX_DESCRIPTOR_SET_COUNT],
}

impl PartialEq for BoundInfo {
    /// Slots outside `set_mask` are ignored
    fn eq(&self, other: &Self) -> bool {
        if self.pipeline_layout != other.pipeline_layout || self.set_mask != other.set_mask {
            return false;
        }
        (0..MAX_DESCRIPTOR_SET_COUNT)
            .filter(|i| self.set_mask & (1 << i) != 0)
            .all(|i| self.bound_sets[i] == other.bound_sets[i])
    }
}

/// Default resources for bindings that have nothing written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceHolders {
    pub buffer: DescriptorBufferInfo,
    pub image: DescriptorImageInfo,
}

/// Subpass input attachment to write into a set
#[derive(Clone)]
pub struct InputAttachment {
    pub texture: Arc<dyn TextureResource>,
    pub range: ImageSubresourceRange,
}

pub struct DescriptorSetManager {
    device: Arc<dyn DescriptorDevice>,
    pool: GrowingPool,
    history: FxHashMap<NativeSet, BindingHistory>,
    stashed_sets: [Option<NativeSet>; MAX_DESCRIPTOR_SET_COUNT],
    /// Set each slot last received a bind command for, while still current
    committed_sets: [Option<NativeSet>; MAX_DESCRIPTOR_SET_COUNT],
    last_bound_info: BoundInfo,
    release_sender: Sender<ReleasedSet>,
    release_receiver: Receiver<ReleasedSet>,
    placeholders: Option<PlaceHolders>,
}

impl DescriptorSetManager {
    pub fn new(device: Arc<dyn DescriptorDevice>) -> Self {
        let pool = GrowingPool::new(Arc::clone(&device));
        Self::with_pool(device, pool)
    }

    /// Create a manager whose pool grows according to `config`
    pub fn with_config(device: Arc<dyn DescriptorDevice>, config: DescriptorPoolConfig) -> Result<Self> {
        let pool = GrowingPool::with_config(Arc::clone(&device), config)?;
        Ok(Self::with_pool(device, pool))
    }

    fn with_pool(device: Arc<dyn DescriptorDevice>, pool: GrowingPool) -> Self {
        let (release_sender, release_receiver) = crossbeam_channel::unbounded();
        Self {
            device,
            pool,
            history: FxHashMap::default(),
            stashed_sets: [None; MAX_DESCRIPTOR_SET_COUNT],
            committed_sets: [None; MAX_DESCRIPTOR_SET_COUNT],
            last_bound_info: BoundInfo::default(),
            release_sender,
            release_receiver,
            placeholders: None,
        }
    }

    // ===== LIFETIME =====

    /// Obtain a set of `layout` from the pool and start tracking it
    pub fn create_set(&mut self, layout: &Arc<DescriptorSetLayout>) -> Arc<DescriptorSet> {
        self.collect_released();

        let native = self.pool.obtain_set(layout);
        let set = Arc::new(DescriptorSet::new(native, Arc::clone(layout), self.release_sender.clone()));
        self.history.insert(native, BindingHistory::new(&set));
        set
    }

    /// Stop tracking `set` and clear every slot staging it
    ///
    /// The native set returns to its pool once the last reference to the
    /// wrapper (caller or command stream) has been dropped.
    ///
    /// Required before dropping a set that is not currently bound: until then
    /// its history holds a reference to the wrapper, so dropping the caller's
    /// `Arc` alone never returns the set to the pool.
    pub fn destroy_set(&mut self, set: &DescriptorSet) {
        let native = set.native();
        self.history.remove(&native);
        self.clear_stashed(native);
    }

    /// Recycle a released native set into the sub-pool of its shape
    pub fn release_set(&mut self, released: ReleasedSet) {
        self.history.remove(&released.native);
        self.clear_stashed(released.native);
        self.pool.recycle(&released.count, released.mask, released.native);
    }

    /// Recycle every set whose wrapper has been dropped; returns how many
    pub fn collect_released(&mut self) -> usize {
        let mut released_count = 0;
        while let Ok(released) = self.release_receiver.try_recv() {
            self.release_set(released);
            released_count += 1;
        }
        released_count
    }

    fn clear_stashed(&mut self, native: NativeSet) {
        for slot in self.stashed_sets.iter_mut().chain(self.committed_sets.iter_mut()) {
            if *slot == Some(native) {
                *slot = None;
            }
        }
    }

    // ===== WRITES =====

    /// Write a uniform buffer range into `binding`
    pub fn update_buffer(
        &mut self,
        set: &DescriptorSet,
        binding: u8,
        buffer: &Arc<dyn BufferResource>,
        offset: u64,
        size: u64,
    ) {
        let native = set.native();
        let ty = match self.history_mut(native).mask().kind_of(binding) {
            Some(BindingKind::Buffer) => WriteDescriptorType::UniformBuffer,
            Some(BindingKind::DynamicBuffer) => WriteDescriptorType::UniformBufferDynamic,
            other => crate::engine_fatal!("galaxy3d::descriptors",
                "update_buffer: binding {} of set {:?} is {:?}, not a buffer", binding, native, other),
        };

        self.device.update_descriptor_sets(&[DescriptorWrite {
            set: native,
            binding,
            ty,
            info: DescriptorWriteInfo::Buffer(DescriptorBufferInfo {
                buffer: buffer.gpu_buffer(),
                offset,
                range: size,
            }),
        }]);
        set.acquire(GpuResourceRef::Buffer(Arc::clone(buffer)));
        self.history_mut(native).write(binding);
    }

    /// Write `texture` sampled with `sampler` into `binding`
    pub fn update_sampler(
        &mut self,
        set: &DescriptorSet,
        binding: u8,
        texture: &Arc<dyn TextureResource>,
        sampler: NativeSampler,
    ) {
        let native = set.native();
        let kind = self.history_mut(native).mask().kind_of(binding);
        if kind != Some(BindingKind::Sampler) {
            crate::engine_fatal!("galaxy3d::descriptors",
                "update_sampler: binding {} of set {:?} is {:?}, not a sampler", binding, native, kind);
        }

        let range = texture.primary_view_range();
        let view_type = texture.view_type();
        // A 2D depth texture may have mips used as attachments: sample it
        // through a view with the same properties as the attachment view
        let image_view = if texture.usage().contains(TextureUsage::DEPTH_ATTACHMENT)
            && view_type == ImageViewType::Tex2D
        {
            texture.attachment_view(&range)
        } else {
            texture.view_for_type(&range, view_type)
        };

        self.device.update_descriptor_sets(&[DescriptorWrite {
            set: native,
            binding,
            ty: WriteDescriptorType::CombinedImageSampler,
            info: DescriptorWriteInfo::Image(DescriptorImageInfo {
                sampler,
                image_view,
                image_layout: texture.primary_layout(),
            }),
        }]);
        set.acquire(GpuResourceRef::Texture(Arc::clone(texture)));
        self.history_mut(native).write_texture(binding, range, texture);
    }

    /// Extension point: input attachments are not written yet
    pub fn update_input_attachment(&mut self, set: &DescriptorSet, _attachment: InputAttachment) {
        crate::engine_trace!("galaxy3d::descriptors",
            "update_input_attachment ignored for set {:?}", set.native());
    }

    /// Record default resources for unused bindings
    ///
    /// Stored only; writes do not consult them.
    pub fn set_placeholders(
        &mut self,
        sampler: NativeSampler,
        texture: &Arc<dyn TextureResource>,
        buffer: &Arc<dyn BufferResource>,
    ) {
        let range = texture.primary_view_range();
        self.placeholders = Some(PlaceHolders {
            buffer: DescriptorBufferInfo {
                buffer: buffer.gpu_buffer(),
                offset: 0,
                range: 1,
            },
            image: DescriptorImageInfo {
                sampler,
                image_view: texture.view_for_type(&range, texture.view_type()),
                image_layout: texture.primary_layout(),
            },
        });
    }

    pub fn placeholders(&self) -> Option<&PlaceHolders> {
        self.placeholders.as_ref()
    }

    // ===== BINDING =====

    /// Stage `set` in slot `set_index` with `offsets`; no command is recorded
    pub fn bind(&mut self, set_index: u8, set: &DescriptorSet, offsets: DescriptorSetOffsets) {
        let index = set_index as usize;
        assert!(index < MAX_DESCRIPTOR_SET_COUNT, "set index {} out of range", set_index);

        let native = set.native();
        self.history_mut(native).set_offsets(offsets);

        if let Some(last) = self.stashed_sets[index] {
            if last != native {
                self.history_mut(last).unbind();
            }
        }
        self.stashed_sets[index] = Some(native);
    }

    /// Record bind commands for the slots in `set_mask` that need one
    ///
    /// Returns the number of bind commands recorded. Nothing is recorded when
    /// every active slot is clean and layout, mask and staged sets match the
    /// previous commit.
    pub fn commit(
        &mut self,
        commands: &mut dyn CommandStream,
        pipeline_layout: NativePipelineLayout,
        set_mask: u8,
    ) -> usize {
        let mut dirty = [false; MAX_DESCRIPTOR_SET_COUNT];
        for (index, is_dirty) in dirty.iter_mut().enumerate() {
            if set_mask & (1 << index) != 0 {
                *is_dirty = self.slot_status(index as u8) == SlotStatus::StagedDirty;
            }
        }
        let all_bound = !dirty.contains(&true);

        let next_info = BoundInfo {
            pipeline_layout,
            set_mask,
            bound_sets: self.stashed_sets,
        };
        if all_bound && self.last_bound_info == next_info {
            return 0;
        }

        let mut bind_count = 0;
        for index in (0..MAX_DESCRIPTOR_SET_COUNT).filter(|&i| dirty[i]) {
            let Some(native) = self.stashed_sets[index] else { continue };
            let Some(history) = self.history.get_mut(&native) else { continue };
            history.bind(commands, pipeline_layout, index as u8);
            bind_count += 1;

            // The set changed since any other slot bound it; those binds are stale
            for (other, committed) in self.committed_sets.iter_mut().enumerate() {
                if other != index && !dirty[other] && *committed == Some(native) {
                    *committed = None;
                }
            }
            self.committed_sets[index] = Some(native);
        }
        self.last_bound_info = next_info;
        bind_count
    }

    // ===== QUERIES =====

    pub fn slot_status(&self, set_index: u8) -> SlotStatus {
        let index = set_index as usize;
        let Some(native) = self.stashed_sets.get(index).copied().flatten() else {
            return SlotStatus::Unbound;
        };
        match self.history.get(&native) {
            None => SlotStatus::Unbound,
            // Clean only if this slot itself received the current bind
            Some(history) if history.bound() && self.committed_sets[index] == Some(native) => {
                SlotStatus::StagedClean
            }
            Some(_) => SlotStatus::StagedDirty,
        }
    }

    /// Native set staged in `set_index`
    pub fn stashed_set(&self, set_index: u8) -> Option<NativeSet> {
        self.stashed_sets.get(set_index as usize).copied().flatten()
    }

    pub fn history(&self, native: NativeSet) -> Option<&BindingHistory> {
        self.history.get(&native)
    }

    /// Number of live sets with a binding history
    pub fn tracked_set_count(&self) -> usize {
        self.history.len()
    }

    pub fn pool(&self) -> &GrowingPool {
        &self.pool
    }

    fn history_mut(&mut self, native: NativeSet) -> &mut BindingHistory {
        match self.history.get_mut(&native) {
            Some(history) => history,
            None => crate::engine_fatal!("galaxy3d::descriptors",
                "Descriptor set {:?} is not tracked (destroyed or never created)", native),
        }
    }
}

#[cfg(test)]
#[path = "set_manager_tests.rs"]
mod tests;
