/// VulkanCommandStream - Vulkan implementation of CommandStream
///
/// Records descriptor binds into a command buffer in the recording state and
/// keeps every acquired resource alive until `retire()` is called, which the
/// owner does once the submission's fence has signaled.

use ash::vk;
use ash::vk::Handle;
use galaxy_3d_descriptors::galaxy3d::descriptor::{
    CommandStream, GpuResourceRef, NativePipelineLayout, NativeSet,
};
use crate::vulkan_descriptor_types::vk_handle;

pub struct VulkanCommandStream {
    device: ash::Device,
    command_buffer: vk::CommandBuffer,
    /// Resources referenced by recorded commands
    retained: Vec<GpuResourceRef>,
}

impl VulkanCommandStream {
    /// Wrap a command buffer that is already recording
    pub fn new(device: ash::Device, command_buffer: vk::CommandBuffer) -> Self {
        Self {
            device,
            command_buffer,
            retained: Vec::new(),
        }
    }

    pub fn buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn retained_count(&self) -> usize {
        self.retained.len()
    }

    /// Release every retained resource; the GPU must be done with the buffer
    pub fn retire(&mut self) {
        self.retained.clear();
    }
}

impl CommandStream for VulkanCommandStream {
    fn bind_descriptor_set(
        &mut self,
        pipeline_layout: NativePipelineLayout,
        set_index: u32,
        set: NativeSet,
        dynamic_offsets: &[u32],
    ) {
        let sets = [vk_handle::<vk::DescriptorSet>(set.as_raw())];
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_handle(pipeline_layout.as_raw()),
                set_index,
                &sets,
                dynamic_offsets,
            );
        }
    }

    fn acquire(&mut self, resource: GpuResourceRef) {
        self.retained.push(resource);
    }
}

impl Drop for VulkanCommandStream {
    fn drop(&mut self) {
        if !self.retained.is_empty() && !self.command_buffer.is_null() {
            galaxy_3d_descriptors::engine_trace!("galaxy3d::vulkan",
                "Command stream dropped with {} retained resources", self.retained.len());
        }
    }
}
