/*!
# Galaxy 3D Descriptors - Vulkan Backend

Vulkan implementation of the galaxy_3d_descriptors backend traits, using the
Ash library for Vulkan bindings.

- `VulkanDescriptorDevice` creates layouts, pools and sets on an `ash::Device`
- `VulkanCommandStream` records `vkCmdBindDescriptorSets` into a command buffer
- `VulkanContext` is a headless instance/device pair for tools and tests

```no_run
use std::sync::Arc;
use galaxy_3d_descriptors::galaxy3d::DescriptorSetManager;
use galaxy_3d_descriptors_vulkan::{VulkanContext, VulkanDescriptorDevice};

let context = VulkanContext::headless(false)?;
let device = Arc::new(VulkanDescriptorDevice::new(context.device().clone()));
let manager = DescriptorSetManager::new(device);
# Ok::<(), galaxy_3d_descriptors::galaxy3d::Error>(())
```
*/

mod vulkan_descriptor_types;
mod vulkan_descriptor_device;
mod vulkan_command_stream;
mod vulkan_context;
mod vulkan_debug;

pub use vulkan_descriptor_device::VulkanDescriptorDevice;
pub use vulkan_command_stream::VulkanCommandStream;
pub use vulkan_context::VulkanContext;

// Re-export debug utilities
pub use vulkan_debug::{reset_validation_error_count, validation_error_count};
