/// Mock descriptor backend for unit tests (no GPU required)
///
/// `MockDescriptorDevice` hands out incrementing handles and records every
/// call so tests can assert on pool sizing, allocations and writes.
/// Pools enforce their `max_sets` like a real driver would.

use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use crate::descriptor::backend::{
    BufferResource, CommandStream, DescriptorDevice, DescriptorWrite, GpuResourceRef, ImageLayout,
    ImageSubresourceRange, ImageViewType, TextureResource, TextureUsage,
};
use crate::descriptor::handles::{
    NativeBuffer, NativeImageView, NativePipelineLayout, NativePool, NativeSet, NativeSetLayout,
};
use crate::descriptor::layout::{
    DescriptorFlags, DescriptorSetLayout, DescriptorSetLayoutBinding, DescriptorSetLayoutDesc,
    DescriptorType, ShaderStageFlags,
};
use crate::descriptor::resource_count::ResourceCount;
use crate::error::{Error, Result};

// ============================================================================
// Mock Device
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPool {
    pub native: NativePool,
    pub totals: ResourceCount,
    pub max_sets: u32,
    pub allocated: u32,
}

#[derive(Debug, Default)]
pub struct MockDeviceState {
    next_handle: u64,
    pub pools: Vec<MockPool>,
    pub layouts: Vec<NativeSetLayout>,
    pub allocations: Vec<(NativePool, NativeSetLayout, NativeSet)>,
    pub writes: Vec<DescriptorWrite>,
    pub destroyed_pools: Vec<NativePool>,
    pub destroyed_layouts: Vec<NativeSetLayout>,
    /// Next pool creation fails
    pub fail_pool_creation: bool,
    /// Next layout creation fails
    pub fail_layout_creation: bool,
}

impl MockDeviceState {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

#[derive(Debug, Default)]
pub struct MockDescriptorDevice {
    state: Mutex<MockDeviceState>,
}

impl MockDescriptorDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, MockDeviceState> {
        self.state.lock().unwrap()
    }

    pub fn pool_count(&self) -> usize {
        self.state().pools.len()
    }

    pub fn allocation_count(&self) -> usize {
        self.state().allocations.len()
    }

    pub fn writes(&self) -> Vec<DescriptorWrite> {
        self.state().writes.clone()
    }
}

impl DescriptorDevice for MockDescriptorDevice {
    fn create_descriptor_set_layout(&self, _desc: &DescriptorSetLayoutDesc) -> Result<NativeSetLayout> {
        let mut state = self.state();
        if std::mem::take(&mut state.fail_layout_creation) {
            return Err(Error::BackendError("mock layout creation failure".to_string()));
        }
        let layout = NativeSetLayout::from_raw(state.next());
        state.layouts.push(layout);
        Ok(layout)
    }

    fn destroy_descriptor_set_layout(&self, layout: NativeSetLayout) {
        self.state().destroyed_layouts.push(layout);
    }

    fn create_descriptor_pool(&self, totals: &ResourceCount, max_sets: u32) -> Result<NativePool> {
        let mut state = self.state();
        if std::mem::take(&mut state.fail_pool_creation) {
            return Err(Error::BackendError("mock pool creation failure".to_string()));
        }
        let native = NativePool::from_raw(state.next());
        state.pools.push(MockPool { native, totals: *totals, max_sets, allocated: 0 });
        Ok(native)
    }

    fn destroy_descriptor_pool(&self, pool: NativePool) {
        self.state().destroyed_pools.push(pool);
    }

    fn allocate_descriptor_set(&self, pool: NativePool, layout: NativeSetLayout) -> Result<NativeSet> {
        let mut state = self.state();
        let set = NativeSet::from_raw(state.next());
        let Some(entry) = state.pools.iter_mut().find(|p| p.native == pool) else {
            return Err(Error::InvalidResource(format!("unknown pool {:?}", pool)));
        };
        if entry.allocated >= entry.max_sets {
            return Err(Error::OutOfPoolMemory);
        }
        entry.allocated += 1;
        state.allocations.push((pool, layout, set));
        Ok(set)
    }

    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) {
        self.state().writes.extend_from_slice(writes);
    }
}

// ============================================================================
// Mock Command Stream
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBind {
    pub pipeline_layout: NativePipelineLayout,
    pub set_index: u32,
    pub set: NativeSet,
    pub dynamic_offsets: Vec<u32>,
}

#[derive(Debug, Default)]
pub struct MockCommandStream {
    pub binds: Vec<RecordedBind>,
    pub acquired: Vec<GpuResourceRef>,
}

impl MockCommandStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every retained resource, as when the GPU finished the stream
    pub fn retire(&mut self) {
        self.acquired.clear();
    }

    pub fn acquired_sets(&self) -> Vec<NativeSet> {
        self.acquired
            .iter()
            .filter_map(|resource| match resource {
                GpuResourceRef::DescriptorSet(set) => Some(set.native()),
                _ => None,
            })
            .collect()
    }
}

impl CommandStream for MockCommandStream {
    fn bind_descriptor_set(
        &mut self,
        pipeline_layout: NativePipelineLayout,
        set_index: u32,
        set: NativeSet,
        dynamic_offsets: &[u32],
    ) {
        self.binds.push(RecordedBind {
            pipeline_layout,
            set_index,
            set,
            dynamic_offsets: dynamic_offsets.to_vec(),
        });
    }

    fn acquire(&mut self, resource: GpuResourceRef) {
        self.acquired.push(resource);
    }
}

// ============================================================================
// Mock Resources
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub native: NativeBuffer,
}

impl MockBuffer {
    pub fn new(raw: u64) -> Arc<dyn BufferResource> {
        Arc::new(Self { native: NativeBuffer::from_raw(raw) })
    }
}

impl BufferResource for MockBuffer {
    fn gpu_buffer(&self) -> NativeBuffer {
        self.native
    }
}

/// Views are derived from `base_view`: `+ 1` for the typed view, `+ 2` for
/// the attachment view
#[derive(Debug)]
pub struct MockTexture {
    pub base_view: u64,
    pub view_type: ImageViewType,
    pub usage: TextureUsage,
    pub layout: ImageLayout,
    pub range: ImageSubresourceRange,
    pub typed_view_requests: Mutex<Vec<ImageViewType>>,
}

impl MockTexture {
    pub fn new(base_view: u64, view_type: ImageViewType, usage: TextureUsage) -> Arc<Self> {
        Arc::new(Self {
            base_view,
            view_type,
            usage,
            layout: ImageLayout::ShaderReadOnly,
            range: ImageSubresourceRange {
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
            typed_view_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn sampled_2d(base_view: u64) -> Arc<dyn TextureResource> {
        Self::new(base_view, ImageViewType::Tex2D, TextureUsage::SAMPLEABLE)
    }

    pub fn typed_view(&self) -> NativeImageView {
        NativeImageView::from_raw(self.base_view + 1)
    }

    pub fn attachment(&self) -> NativeImageView {
        NativeImageView::from_raw(self.base_view + 2)
    }
}

impl TextureResource for MockTexture {
    fn primary_view_range(&self) -> ImageSubresourceRange {
        self.range
    }

    fn view_type(&self) -> ImageViewType {
        self.view_type
    }

    fn view_for_type(&self, _range: &ImageSubresourceRange, view_type: ImageViewType) -> NativeImageView {
        self.typed_view_requests.lock().unwrap().push(view_type);
        self.typed_view()
    }

    fn attachment_view(&self, _range: &ImageSubresourceRange) -> NativeImageView {
        self.attachment()
    }

    fn primary_layout(&self) -> ImageLayout {
        self.layout
    }

    fn usage(&self) -> TextureUsage {
        self.usage
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn as_device(device: &Arc<MockDescriptorDevice>) -> Arc<dyn DescriptorDevice> {
    Arc::clone(device) as Arc<dyn DescriptorDevice>
}

pub fn ubo(binding: u8) -> DescriptorSetLayoutBinding {
    DescriptorSetLayoutBinding::new(
        DescriptorType::UniformBuffer, ShaderStageFlags::VERTEX_FRAGMENT, binding, DescriptorFlags::empty())
}

pub fn dynamic_ubo(binding: u8) -> DescriptorSetLayoutBinding {
    DescriptorSetLayoutBinding::new(
        DescriptorType::UniformBuffer, ShaderStageFlags::VERTEX_FRAGMENT, binding, DescriptorFlags::DYNAMIC_OFFSET)
}

pub fn sampler(binding: u8) -> DescriptorSetLayoutBinding {
    DescriptorSetLayoutBinding::new(
        DescriptorType::Sampler, ShaderStageFlags::FRAGMENT, binding, DescriptorFlags::empty())
}

pub fn input_attachment(binding: u8) -> DescriptorSetLayoutBinding {
    DescriptorSetLayoutBinding::new(
        DescriptorType::InputAttachment, ShaderStageFlags::FRAGMENT, binding, DescriptorFlags::empty())
}

pub fn create_layout(
    device: &Arc<MockDescriptorDevice>,
    bindings: Vec<DescriptorSetLayoutBinding>,
) -> Arc<DescriptorSetLayout> {
    DescriptorSetLayout::new(&as_device(device), DescriptorSetLayoutDesc::new(bindings)).unwrap()
}

/// Pool each allocated native set came from
pub fn native_sets(device: &MockDescriptorDevice) -> FxHashMap<NativeSet, NativePool> {
    device.state().allocations.iter().map(|(pool, _, set)| (*set, *pool)).collect()
}
