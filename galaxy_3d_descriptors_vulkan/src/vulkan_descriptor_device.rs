/// VulkanDescriptorDevice - Vulkan implementation of DescriptorDevice
///
/// Thin wrapper over an `ash::Device`: every call maps one-to-one onto a
/// Vulkan descriptor entry point. The device is borrowed, not owned; the
/// application destroys it after every pool and layout created here.

use ash::vk;
use ash::vk::Handle;
use galaxy_3d_descriptors::galaxy3d::Result;
use galaxy_3d_descriptors::galaxy3d::descriptor::{
    DescriptorDevice, DescriptorSetLayoutDesc, DescriptorWrite, DescriptorWriteInfo, NativePool,
    NativeSet, NativeSetLayout, ResourceCount,
};
use galaxy_3d_descriptors::{engine_bail, engine_debug, engine_err};
use crate::vulkan_descriptor_types::{
    allocation_error, binding_type_to_vk, image_layout_to_vk, pool_sizes, stage_flags_to_vk,
    vk_handle, write_type_to_vk,
};

pub struct VulkanDescriptorDevice {
    device: ash::Device,
}

impl VulkanDescriptorDevice {
    pub fn new(device: ash::Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }
}

impl DescriptorDevice for VulkanDescriptorDevice {
    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<NativeSetLayout> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc.bindings
            .iter()
            .map(|binding| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(binding.binding as u32)
                    .descriptor_type(binding_type_to_vk(binding))
                    .descriptor_count(1)
                    .stage_flags(stage_flags_to_vk(binding.stage_flags))
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .bindings(&bindings);

        unsafe {
            let layout = self.device.create_descriptor_set_layout(&create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create descriptor set layout: {:?}", e))?;
            Ok(NativeSetLayout::from_raw(layout.as_raw()))
        }
    }

    fn destroy_descriptor_set_layout(&self, layout: NativeSetLayout) {
        unsafe {
            self.device.destroy_descriptor_set_layout(vk_handle(layout.as_raw()), None);
        }
    }

    fn create_descriptor_pool(&self, totals: &ResourceCount, max_sets: u32) -> Result<NativePool> {
        let sizes = pool_sizes(totals);
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&sizes)
            .max_sets(max_sets);

        unsafe {
            let pool = self.device.create_descriptor_pool(&info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create descriptor pool: {:?}", e))?;
            engine_debug!("galaxy3d::vulkan",
                "Created VkDescriptorPool {:?} (max_sets={}, sizes={})", pool, max_sets, sizes.len());
            Ok(NativePool::from_raw(pool.as_raw()))
        }
    }

    fn destroy_descriptor_pool(&self, pool: NativePool) {
        unsafe {
            self.device.destroy_descriptor_pool(vk_handle(pool.as_raw()), None);
        }
    }

    fn allocate_descriptor_set(&self, pool: NativePool, layout: NativeSetLayout) -> Result<NativeSet> {
        let layouts = [vk_handle::<vk::DescriptorSetLayout>(layout.as_raw())];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(vk_handle(pool.as_raw()))
            .set_layouts(&layouts);

        unsafe {
            let sets = self.device.allocate_descriptor_sets(&allocate_info).map_err(allocation_error)?;
            let Some(set) = sets.first() else {
                engine_bail!("galaxy3d::vulkan", "vkAllocateDescriptorSets returned no set");
            };
            Ok(NativeSet::from_raw(set.as_raw()))
        }
    }

    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) {
        // Infos must stay alive until the update call
        let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::new();
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::new();
        for write in writes {
            match write.info {
                DescriptorWriteInfo::Buffer(info) => buffer_infos.push(
                    vk::DescriptorBufferInfo::default()
                        .buffer(vk_handle(info.buffer.as_raw()))
                        .offset(info.offset)
                        .range(info.range)
                ),
                DescriptorWriteInfo::Image(info) => image_infos.push(
                    vk::DescriptorImageInfo::default()
                        .sampler(vk_handle(info.sampler.as_raw()))
                        .image_view(vk_handle(info.image_view.as_raw()))
                        .image_layout(image_layout_to_vk(info.image_layout))
                ),
            }
        }

        let mut buffer_idx = 0usize;
        let mut image_idx = 0usize;
        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .map(|write| {
                let vk_write = vk::WriteDescriptorSet::default()
                    .dst_set(vk_handle(write.set.as_raw()))
                    .dst_binding(write.binding as u32)
                    .dst_array_element(0)
                    .descriptor_type(write_type_to_vk(write.ty));
                match write.info {
                    DescriptorWriteInfo::Buffer(_) => {
                        buffer_idx += 1;
                        vk_write.buffer_info(std::slice::from_ref(&buffer_infos[buffer_idx - 1]))
                    }
                    DescriptorWriteInfo::Image(_) => {
                        image_idx += 1;
                        vk_write.image_info(std::slice::from_ref(&image_infos[image_idx - 1]))
                    }
                }
            })
            .collect();

        unsafe {
            self.device.update_descriptor_sets(&vk_writes, &[]);
        }
    }
}
