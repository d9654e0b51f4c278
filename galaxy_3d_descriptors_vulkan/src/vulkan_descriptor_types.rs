/// Conversions between descriptor-layer types and Vulkan types
///
/// Pure functions, no device needed.

use ash::vk;
use ash::vk::Handle;
use galaxy_3d_descriptors::galaxy3d::Error;
use galaxy_3d_descriptors::galaxy3d::descriptor::{
    DescriptorSetLayoutBinding, DescriptorType, ImageLayout, ResourceCount, ShaderStageFlags,
    WriteDescriptorType,
};

/// Native descriptor type of a layout binding
pub(crate) fn binding_type_to_vk(binding: &DescriptorSetLayoutBinding) -> vk::DescriptorType {
    match binding.ty {
        DescriptorType::UniformBuffer if binding.is_dynamic_buffer() => vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
        DescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorType::Sampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        DescriptorType::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
    }
}

pub(crate) fn write_type_to_vk(ty: WriteDescriptorType) -> vk::DescriptorType {
    match ty {
        WriteDescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        WriteDescriptorType::UniformBufferDynamic => vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
        WriteDescriptorType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        WriteDescriptorType::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
    }
}

/// Convert ShaderStageFlags to Vulkan shader stage flags
pub(crate) fn stage_flags_to_vk(flags: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut vk_flags = vk::ShaderStageFlags::empty();
    if flags.contains(ShaderStageFlags::VERTEX) { vk_flags |= vk::ShaderStageFlags::VERTEX; }
    if flags.contains(ShaderStageFlags::FRAGMENT) { vk_flags |= vk::ShaderStageFlags::FRAGMENT; }
    if flags.contains(ShaderStageFlags::COMPUTE) { vk_flags |= vk::ShaderStageFlags::COMPUTE; }
    vk_flags
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    }
}

/// Pool sizes for `totals`, one entry per non-zero kind
pub(crate) fn pool_sizes(totals: &ResourceCount) -> Vec<vk::DescriptorPoolSize> {
    [
        (vk::DescriptorType::UNIFORM_BUFFER, totals.buffer),
        (vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC, totals.dynamic_buffer),
        (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, totals.sampler),
        (vk::DescriptorType::INPUT_ATTACHMENT, totals.input_attachment),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .map(|(ty, descriptor_count)| vk::DescriptorPoolSize { ty, descriptor_count })
    .collect()
}

/// Map a failed allocation result; pool exhaustion stays distinguishable
pub(crate) fn allocation_error(result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL => Error::OutOfPoolMemory,
        other => galaxy_3d_descriptors::engine_err!("galaxy3d::vulkan",
            "Failed to allocate descriptor set: {:?}", other),
    }
}

/// Reinterpret a raw 64-bit handle as a Vulkan handle
pub(crate) fn vk_handle<H: Handle>(raw: u64) -> H {
    H::from_raw(raw)
}

#[cfg(test)]
#[path = "vulkan_descriptor_types_tests.rs"]
mod tests;
