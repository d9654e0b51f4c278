//! Descriptor module: pooled descriptor sets and lazy set binding.
//!
//! Layouts are grouped by shape into growing pools of fixed-capacity
//! sub-pools. The set manager tracks per-set writes and binds, and only
//! records bind commands for slots that changed since the last commit.

mod backend;
mod binding_history;
mod descriptor_set;
mod growing_pool;
mod handles;
mod layout;
mod resource_count;
mod set_manager;
mod sub_pool;
pub mod standard_layouts;

#[cfg(test)]
pub(crate) mod mock_backend;

pub use backend::{
    BufferResource, CommandStream, DescriptorBufferInfo, DescriptorDevice, DescriptorImageInfo,
    DescriptorWrite, DescriptorWriteInfo, GpuResourceRef, ImageLayout, ImageSubresourceRange,
    ImageViewType, TextureResource, TextureUsage, WriteDescriptorType,
};
pub use binding_history::{BindingHistory, DescriptorSetOffsets, TextureBundle};
pub use descriptor_set::{DescriptorSet, ReleasedSet};
pub use growing_pool::GrowingPool;
pub use handles::{
    NativeBuffer, NativeImageView, NativePipelineLayout, NativePool, NativeSampler, NativeSet,
    NativeSetLayout,
};
pub use layout::{
    BindingKind, DescriptorFlags, DescriptorSetLayout, DescriptorSetLayoutBinding,
    DescriptorSetLayoutDesc, DescriptorType, LayoutMask, ShaderStageFlags,
};
pub use resource_count::ResourceCount;
pub use set_manager::{DescriptorSetManager, InputAttachment, PlaceHolders, SlotStatus};
pub use sub_pool::SubPool;
