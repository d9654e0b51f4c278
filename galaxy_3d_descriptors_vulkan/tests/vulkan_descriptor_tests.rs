//! Tests for the Vulkan descriptor backend
//!
//! These tests drive DescriptorSetManager on a real device through a headless
//! VulkanContext. All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_descriptor_tests -- --ignored
//! Add `--features vulkan-validation` to run under the Khronos validation layer.

use ash::vk;
use ash::vk::Handle;
use galaxy_3d_descriptors::galaxy3d::DescriptorSetManager;
use galaxy_3d_descriptors::galaxy3d::descriptor::standard_layouts;
use galaxy_3d_descriptors::galaxy3d::descriptor::{
    BufferResource, DescriptorDevice, DescriptorSetLayout, NativeBuffer, NativePipelineLayout,
    SlotStatus,
};
use galaxy_3d_descriptors_vulkan::{
    reset_validation_error_count, validation_error_count, VulkanCommandStream, VulkanContext,
    VulkanDescriptorDevice,
};
use std::sync::Arc;

fn create_context() -> VulkanContext {
    reset_validation_error_count();
    VulkanContext::headless(cfg!(feature = "vulkan-validation")).unwrap()
}

fn create_device(context: &VulkanContext) -> Arc<dyn DescriptorDevice> {
    Arc::new(VulkanDescriptorDevice::new(context.device().clone()))
}

/// Host-visible uniform buffer with its own memory
struct GpuBuffer {
    device: ash::Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
}

impl GpuBuffer {
    fn new(context: &VulkanContext, size: u64) -> Arc<dyn BufferResource> {
        let device = context.device().clone();
        unsafe {
            let info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(vk::BufferUsageFlags::UNIFORM_BUFFER)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = device.create_buffer(&info, None).unwrap();
            let requirements = device.get_buffer_memory_requirements(buffer);

            let properties = context.instance()
                .get_physical_device_memory_properties(context.physical_device());
            let memory_type = (0..properties.memory_type_count)
                .find(|&i| {
                    requirements.memory_type_bits & (1 << i) != 0
                        && properties.memory_types[i as usize].property_flags
                            .contains(vk::MemoryPropertyFlags::HOST_VISIBLE)
                })
                .unwrap();

            let allocate_info = vk::MemoryAllocateInfo::default()
                .allocation_size(requirements.size)
                .memory_type_index(memory_type);
            let memory = device.allocate_memory(&allocate_info, None).unwrap();
            device.bind_buffer_memory(buffer, memory, 0).unwrap();

            Arc::new(Self { device, buffer, memory })
        }
    }
}

impl BufferResource for GpuBuffer {
    fn gpu_buffer(&self) -> NativeBuffer {
        NativeBuffer::from_raw(self.buffer.as_raw())
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

fn create_pipeline_layout(context: &VulkanContext, layouts: &[&DescriptorSetLayout]) -> vk::PipelineLayout {
    let set_layouts: Vec<vk::DescriptorSetLayout> = layouts
        .iter()
        .map(|layout| vk::DescriptorSetLayout::from_raw(layout.native().as_raw()))
        .collect();
    let info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
    unsafe { context.device().create_pipeline_layout(&info, None).unwrap() }
}

fn begin_recording(context: &VulkanContext) -> vk::CommandBuffer {
    let command_buffer = context.allocate_command_buffer().unwrap();
    let begin_info = vk::CommandBufferBeginInfo::default()
        .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    unsafe {
        context.device().begin_command_buffer(command_buffer, &begin_info).unwrap();
    }
    command_buffer
}

// ============================================================================
// LAYOUT AND POOL TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_standard_layouts() {
    let context = create_context();
    let device = create_device(&context);

    for desc in [
        standard_layouts::post_process_layout(),
        standard_layouts::depth_variant_layout(),
        standard_layouts::ssr_variant_layout(),
        standard_layouts::per_view_layout(),
        standard_layouts::per_renderable_layout(),
    ] {
        let layout = DescriptorSetLayout::new(&device, desc).unwrap();
        assert!(!layout.native().is_null());
    }

    assert_eq!(validation_error_count(), 0);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_pool_grows_past_initial_capacity() {
    let context = create_context();
    let device = create_device(&context);
    let mut manager = DescriptorSetManager::new(Arc::clone(&device));
    let layout = DescriptorSetLayout::new(&device, standard_layouts::per_view_layout()).unwrap();

    // 11 sets: the first sub-pool holds 10
    let sets: Vec<_> = (0..11).map(|_| manager.create_set(&layout)).collect();

    let capacities: Vec<u32> = manager.pool().sub_pools(layout.count())
        .iter()
        .map(|pool| pool.capacity())
        .collect();
    assert_eq!(capacities, vec![10, 15]);
    assert!(sets.iter().all(|set| !set.native().is_null()));

    drop(sets);
    drop(manager);
    assert_eq!(validation_error_count(), 0);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_destroyed_set_is_reused() {
    let context = create_context();
    let device = create_device(&context);
    let mut manager = DescriptorSetManager::new(Arc::clone(&device));
    let layout = DescriptorSetLayout::new(&device, standard_layouts::post_process_layout()).unwrap();

    let set = manager.create_set(&layout);
    let native = set.native();
    manager.destroy_set(&set);
    drop(set);

    let again = manager.create_set(&layout);
    assert_eq!(again.native(), native);
}

// ============================================================================
// WRITE AND BIND TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_write_bind_and_commit() {
    let context = create_context();
    let device = create_device(&context);
    let mut manager = DescriptorSetManager::new(Arc::clone(&device));

    let per_view = DescriptorSetLayout::new(&device, standard_layouts::per_view_layout()).unwrap();
    let per_renderable = DescriptorSetLayout::new(&device, standard_layouts::per_renderable_layout()).unwrap();
    let pipeline_layout = create_pipeline_layout(&context, &[&per_view, &per_renderable]);
    let native_layout = NativePipelineLayout::from_raw(pipeline_layout.as_raw());

    let uniforms = GpuBuffer::new(&context, 1024);
    let view_set = manager.create_set(&per_view);
    let object_set = manager.create_set(&per_renderable);
    for binding in 0..5 {
        manager.update_buffer(&view_set, binding, &uniforms, 0, 256);
    }
    manager.update_buffer(&object_set, 0, &uniforms, 0, 256);
    manager.update_buffer(&object_set, 1, &uniforms, 256, 256);
    manager.update_buffer(&object_set, 2, &uniforms, 512, 256);

    let command_buffer = begin_recording(&context);
    let mut stream = VulkanCommandStream::new(context.device().clone(), command_buffer);

    manager.bind(0, &view_set, Vec::new());
    manager.bind(1, &object_set, vec![0, 256]);
    assert_eq!(manager.commit(&mut stream, native_layout, 0b11), 2);
    assert_eq!(manager.slot_status(0), SlotStatus::StagedClean);
    assert_eq!(manager.slot_status(1), SlotStatus::StagedClean);

    // Nothing changed
    assert_eq!(manager.commit(&mut stream, native_layout, 0b11), 0);

    // New offsets re-bind only slot 1
    manager.bind(1, &object_set, vec![256, 512]);
    assert_eq!(manager.commit(&mut stream, native_layout, 0b11), 1);
    assert!(stream.retained_count() > 0);

    unsafe {
        context.device().end_command_buffer(command_buffer).unwrap();
    }
    stream.retire();
    drop(stream);
    context.free_command_buffer(command_buffer);

    drop(view_set);
    drop(object_set);
    drop(manager);
    unsafe {
        context.device().destroy_pipeline_layout(pipeline_layout, None);
    }
    assert_eq!(validation_error_count(), 0);
}
