/// VulkanContext - Headless Vulkan instance and device
///
/// Owns everything needed to drive the descriptor layer without a window:
/// - Instance (with validation layers and debug messenger when enabled)
/// - Logical device with one graphics queue
/// - Command pool for recording descriptor binds
///
/// Every object created from `device()` must be destroyed before the context.

use ash::vk;
use galaxy_3d_descriptors::galaxy3d::{Error, Result};
use galaxy_3d_descriptors::{engine_error, engine_info};

pub struct VulkanContext {
    /// Vulkan entry (keeps the loader alive)
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    graphics_queue: vk::Queue,
    graphics_queue_family: u32,
    command_pool: vk::CommandPool,
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanContext {
    /// Create a context on the first Vulkan-capable GPU
    pub fn headless(enable_validation: bool) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Galaxy3D Descriptors")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Galaxy3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_1);

            let mut extension_names = Vec::new();
            let mut layer_names = Vec::new();
            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_loader, debug_messenger) = if enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    )
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::vulkan_debug::vulkan_debug_callback));

                match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                    Ok(messenger) => (Some(debug_utils), Some(messenger)),
                    Err(e) => {
                        instance.destroy_instance(None);
                        engine_error!("galaxy3d::vulkan", "Failed to create debug messenger: {:?}", e);
                        return Err(Error::InitializationFailed(
                            format!("Failed to create debug messenger: {:?}", e)));
                    }
                }
            } else {
                (None, None)
            };

            let (physical_device, graphics_queue_family, device, command_pool) =
                match Self::create_device(&instance) {
                    Ok(created) => created,
                    Err(e) => {
                        if let (Some(debug_utils), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                            debug_utils.destroy_debug_utils_messenger(messenger, None);
                        }
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                };
            let graphics_queue = device.get_device_queue(graphics_queue_family, 0);

            engine_info!("galaxy3d::vulkan", "Headless Vulkan context ready (queue family {})",
                graphics_queue_family);

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                device,
                graphics_queue,
                graphics_queue_family,
                command_pool,
                debug_utils_loader,
                debug_messenger,
            })
        }
    }

    /// Pick the first GPU and create a device with one graphics queue
    unsafe fn create_device(
        instance: &ash::Instance,
    ) -> Result<(vk::PhysicalDevice, u32, ash::Device, vk::CommandPool)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        let physical_device = physical_devices
            .into_iter()
            .next()
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
        let graphics_family_index = queue_families
            .iter()
            .enumerate()
            .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|(i, _)| i as u32)
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "No graphics queue family found");
                Error::InitializationFailed("No graphics queue family found".to_string())
            })?;

        let queue_priorities = [1.0];
        let queue_create_infos = [
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities),
        ];
        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos);

        let device = instance
            .create_device(physical_device, &device_create_info, None)
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;

        let pool_create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(graphics_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        match device.create_command_pool(&pool_create_info, None) {
            Ok(pool) => Ok((physical_device, graphics_family_index, device, pool)),
            Err(e) => {
                device.destroy_device(None);
                engine_error!("galaxy3d::vulkan", "Failed to create command pool: {:?}", e);
                Err(Error::InitializationFailed(format!("Failed to create command pool: {:?}", e)))
            }
        }
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Allocate a primary command buffer from the context's pool
    pub fn allocate_command_buffer(&self) -> Result<vk::CommandBuffer> {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        unsafe {
            let buffers = self.device.allocate_command_buffers(&allocate_info)
                .map_err(|e| galaxy_3d_descriptors::engine_err!("galaxy3d::vulkan",
                    "Failed to allocate command buffer: {:?}", e))?;
            buffers.into_iter().next().ok_or_else(|| galaxy_3d_descriptors::engine_err!(
                "galaxy3d::vulkan", "vkAllocateCommandBuffers returned no buffer"))
        }
    }

    pub fn free_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.free_command_buffers(self.command_pool, &[command_buffer]);
        }
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle()
                .map_err(|e| galaxy_3d_descriptors::engine_err!("galaxy3d::vulkan",
                    "vkDeviceWaitIdle failed: {:?}", e))
        }
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);

            // Messenger goes before the instance
            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger.take()) {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
