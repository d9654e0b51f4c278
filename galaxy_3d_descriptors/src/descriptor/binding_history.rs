//! BindingHistory - per-set write and bind state
//!
//! Tracks which bindings of a set have been written, the dynamic offsets to
//! use at bind time, the textures referenced by sampler writes, and whether
//! the set is currently bound in the command stream.
//!
//! Invariant: `bound()` is true only if nothing observable (a write or the
//! offsets) changed since the last `bind()`. Every mutation clears it.

use std::sync::{Arc, Weak};
use crate::config::MAX_DESCRIPTOR_BINDINGS;
use crate::descriptor::backend::{CommandStream, GpuResourceRef, ImageSubresourceRange, TextureResource};
use crate::descriptor::descriptor_set::DescriptorSet;
use crate::descriptor::handles::{NativePipelineLayout, NativeSet, NativeSetLayout};
use crate::descriptor::layout::LayoutMask;
use crate::descriptor::resource_count::ResourceCount;

/// Dynamic offsets of a set, one per dynamic buffer in binding order
pub type DescriptorSetOffsets = Vec<u32>;

/// A texture sub-resource range read through a sampler binding
#[derive(Clone)]
pub struct TextureBundle {
    pub texture: Arc<dyn TextureResource>,
    pub range: ImageSubresourceRange,
}

impl TextureBundle {
    fn same_as(&self, texture: &Arc<dyn TextureResource>, range: &ImageSubresourceRange) -> bool {
        Arc::ptr_eq(&self.texture, texture) && self.range == *range
    }
}

pub struct BindingHistory {
    native: NativeSet,
    /// Lookup only, never keeps the wrapper alive
    set: Weak<DescriptorSet>,
    /// The history's own acquisition of the wrapper; moved to the command
    /// stream on bind, re-acquired on unbind
    retained: Option<Arc<DescriptorSet>>,
    textures: Vec<TextureBundle>,
    offsets: DescriptorSetOffsets,
    mask: LayoutMask,
    layout: NativeSetLayout,
    count: ResourceCount,
    max_index: Option<u8>,
    written: u64,
    bound: bool,
}

impl BindingHistory {
    pub fn new(set: &Arc<DescriptorSet>) -> Self {
        let layout = set.layout();
        // Binding indices are below 64 (checked by `LayoutMask::from_desc`),
        // so the written mask covers every binding
        let count = *layout.count();

        let mut history = Self {
            native: set.native(),
            set: Arc::downgrade(set),
            retained: None,
            textures: Vec::new(),
            offsets: DescriptorSetOffsets::new(),
            mask: *layout.mask(),
            layout: layout.native(),
            count,
            max_index: layout.mask().max_binding_index(),
            written: 0,
            bound: false,
        };
        // Initial state is unbound
        history.unbind();
        history
    }

    /// Replace the dynamic offsets; the set must be bound again
    ///
    /// # Panics
    ///
    /// If more offsets are given than the layout has dynamic buffers.
    pub fn set_offsets(&mut self, offsets: DescriptorSetOffsets) {
        assert!(
            offsets.len() <= self.count.dynamic_buffer as usize,
            "{} dynamic offsets given for a set with {} dynamic buffers",
            offsets.len(),
            self.count.dynamic_buffer
        );
        self.offsets = offsets;
        self.bound = false;
    }

    /// Mark `binding` as written
    pub fn write(&mut self, binding: u8) {
        assert!(binding < MAX_DESCRIPTOR_BINDINGS, "binding {} out of range", binding);
        self.written |= 1u64 << binding;
        self.bound = false;
    }

    /// Mark `binding` as written with a texture range read through it
    pub fn write_texture(&mut self, binding: u8, range: ImageSubresourceRange, texture: &Arc<dyn TextureResource>) {
        self.write(binding);
        if !self.textures.iter().any(|bundle| bundle.same_as(texture, &range)) {
            self.textures.push(TextureBundle { texture: Arc::clone(texture), range });
        }
    }

    /// Record the bind command; the set's acquisition moves to `commands`
    pub fn bind(&mut self, commands: &mut dyn CommandStream, pipeline_layout: NativePipelineLayout, index: u8) {
        let dynamic_count = self.count.dynamic_buffer as usize;
        if self.offsets.len() == dynamic_count {
            commands.bind_descriptor_set(pipeline_layout, index as u32, self.native, &self.offsets);
        } else {
            let mut offsets = self.offsets.clone();
            offsets.resize(dynamic_count, 0);
            commands.bind_descriptor_set(pipeline_layout, index as u32, self.native, &offsets);
        }

        if let Some(set) = self.retained.take().or_else(|| self.set.upgrade()) {
            commands.acquire(GpuResourceRef::DescriptorSet(set));
        }
        self.bound = true;
    }

    /// The set was superseded in its slot before being committed
    pub fn unbind(&mut self) {
        if self.retained.is_none() {
            self.retained = self.set.upgrade();
        }
        self.bound = false;
    }

    pub fn bound(&self) -> bool {
        self.bound
    }

    pub fn written(&self, binding: u8) -> bool {
        binding < MAX_DESCRIPTOR_BINDINGS && self.written & (1u64 << binding) != 0
    }

    pub fn written_mask(&self) -> u64 {
        self.written
    }

    /// Whether the history currently holds its own acquisition of the set
    pub fn retains_set(&self) -> bool {
        self.retained.is_some()
    }

    pub fn native(&self) -> NativeSet {
        self.native
    }

    pub fn layout(&self) -> NativeSetLayout {
        self.layout
    }

    pub fn mask(&self) -> &LayoutMask {
        &self.mask
    }

    pub fn count(&self) -> &ResourceCount {
        &self.count
    }

    pub fn max_index(&self) -> Option<u8> {
        self.max_index
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Textures read by this set, for layout-transition bookkeeping
    pub fn referenced_textures(&self) -> &[TextureBundle] {
        &self.textures
    }
}

#[cfg(test)]
#[path = "binding_history_tests.rs"]
mod tests;
