//! Backend capabilities consumed by the descriptor core
//!
//! The core never talks to a graphics API directly. It talks to:
//! - `DescriptorDevice`: creates native layouts, pools and sets, and applies
//!   descriptor writes.
//! - `CommandStream`: records bind commands and retains resources until the
//!   stream has been retired by the API's own synchronization.
//! - `BufferResource` / `TextureResource`: the resources written into sets.

use std::fmt;
use std::sync::Arc;
use bitflags::bitflags;
use crate::descriptor::descriptor_set::DescriptorSet;
use crate::descriptor::handles::{
    NativeBuffer, NativeImageView, NativePipelineLayout, NativePool, NativeSampler, NativeSet,
    NativeSetLayout,
};
use crate::descriptor::layout::DescriptorSetLayoutDesc;
use crate::descriptor::resource_count::ResourceCount;
use crate::error::Result;

// ============================================================================
// Descriptor writes
// ============================================================================

/// Native descriptor type of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteDescriptorType {
    UniformBuffer,
    UniformBufferDynamic,
    CombinedImageSampler,
    InputAttachment,
}

/// Buffer range written into a buffer binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBufferInfo {
    pub buffer: NativeBuffer,
    pub offset: u64,
    pub range: u64,
}

/// Image written into a sampler or input attachment binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorImageInfo {
    pub sampler: NativeSampler,
    pub image_view: NativeImageView,
    pub image_layout: ImageLayout,
}

/// Payload of a descriptor write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorWriteInfo {
    Buffer(DescriptorBufferInfo),
    Image(DescriptorImageInfo),
}

/// One descriptor write (`VkWriteDescriptorSet` with a single descriptor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorWrite {
    pub set: NativeSet,
    pub binding: u8,
    pub ty: WriteDescriptorType,
    pub info: DescriptorWriteInfo,
}

// ============================================================================
// Textures
// ============================================================================

/// Sub-resource range of an image (mips x layers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSubresourceRange {
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

/// Image view dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageViewType {
    Tex2D,
    Tex2DArray,
    Cube,
    CubeArray,
    Tex3D,
}

/// Layout an image is in when sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    ShaderReadOnly,
    DepthStencilReadOnly,
    ColorAttachment,
    DepthStencilAttachment,
}

bitflags! {
    /// Texture usage flags relevant to descriptor writes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u16 {
        const SAMPLEABLE = 0x01;
        const COLOR_ATTACHMENT = 0x02;
        const DEPTH_ATTACHMENT = 0x04;
        const STENCIL_ATTACHMENT = 0x08;
        const SUBPASS_INPUT = 0x10;
    }
}

/// Texture capability exposed by the resource layer
pub trait TextureResource: Send + Sync {
    /// Range covered by the texture's primary view
    fn primary_view_range(&self) -> ImageSubresourceRange;

    /// View type the texture was created with
    fn view_type(&self) -> ImageViewType;

    /// View of `range` with the given dimensionality
    fn view_for_type(&self, range: &ImageSubresourceRange, view_type: ImageViewType) -> NativeImageView;

    /// View of `range` suitable for use as an attachment
    fn attachment_view(&self, range: &ImageSubresourceRange) -> NativeImageView;

    /// Layout of the primary view's sub-resources
    fn primary_layout(&self) -> ImageLayout;

    fn usage(&self) -> TextureUsage;
}

/// Buffer capability exposed by the resource layer
pub trait BufferResource: Send + Sync {
    fn gpu_buffer(&self) -> NativeBuffer;
}

// ============================================================================
// Resource references
// ============================================================================

/// A strong reference keeping a GPU-visible resource alive
///
/// Held by descriptor sets for the resources written into them, and by
/// command streams for the sets bound into them.
#[derive(Clone)]
pub enum GpuResourceRef {
    Buffer(Arc<dyn BufferResource>),
    Texture(Arc<dyn TextureResource>),
    DescriptorSet(Arc<DescriptorSet>),
}

impl fmt::Debug for GpuResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuResourceRef::Buffer(buffer) => write!(f, "Buffer({:?})", buffer.gpu_buffer()),
            GpuResourceRef::Texture(texture) => write!(f, "Texture({:?})", texture.view_type()),
            GpuResourceRef::DescriptorSet(set) => write!(f, "DescriptorSet({:?})", set.native()),
        }
    }
}

// ============================================================================
// Device and command stream
// ============================================================================

/// Native descriptor object provider
pub trait DescriptorDevice: Send + Sync {
    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<NativeSetLayout>;

    fn destroy_descriptor_set_layout(&self, layout: NativeSetLayout);

    /// Create a pool able to hold `max_sets` sets using at most `totals` descriptors
    fn create_descriptor_pool(&self, totals: &ResourceCount, max_sets: u32) -> Result<NativePool>;

    fn destroy_descriptor_pool(&self, pool: NativePool);

    /// Allocate one set of `layout` from `pool`
    ///
    /// # Errors
    ///
    /// `Error::OutOfPoolMemory` when the pool is exhausted.
    fn allocate_descriptor_set(&self, pool: NativePool, layout: NativeSetLayout) -> Result<NativeSet>;

    /// Apply writes immediately (CPU-side metadata update, not recorded)
    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]);
}

/// Command recording capability
pub trait CommandStream {
    /// Record a bind of `set` at `set_index` for the graphics bind point
    fn bind_descriptor_set(
        &mut self,
        pipeline_layout: NativePipelineLayout,
        set_index: u32,
        set: NativeSet,
        dynamic_offsets: &[u32],
    );

    /// Keep `resource` alive until this stream has been retired
    fn acquire(&mut self, resource: GpuResourceRef);
}
