//! Descriptor set layout descriptions and their bit-mask encoding
//!
//! A layout is described by its bindings. From that description we derive:
//! - `LayoutMask`: one bit per binding and per resource kind. It is the exact
//!   identity of a layout and keys the sub-pool free-lists.
//! - `ResourceCount`: the coarser shape, used to pick and size sub-pools.

use std::fmt;
use std::sync::Arc;
use bitflags::bitflags;
use crate::config::MAX_DESCRIPTOR_BINDINGS;
use crate::descriptor::backend::DescriptorDevice;
use crate::descriptor::handles::NativeSetLayout;
use crate::descriptor::resource_count::ResourceCount;
use crate::error::{Error, Result};

// ============================================================================
// Binding description
// ============================================================================

/// Kind of resource bound at a descriptor binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    /// Uniform buffer (dynamic when flagged with `DescriptorFlags::DYNAMIC_OFFSET`)
    UniformBuffer,
    /// Combined image sampler
    Sampler,
    /// Subpass input attachment
    InputAttachment,
}

bitflags! {
    /// Shader stages that access a binding
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u8 {
        const VERTEX = 0x01;
        const FRAGMENT = 0x02;
        const COMPUTE = 0x04;
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

bitflags! {
    /// Per-binding options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DescriptorFlags: u8 {
        /// Uniform buffer bound with a dynamic offset supplied at bind time
        const DYNAMIC_OFFSET = 0x01;
    }
}

/// Description of a single binding within a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutBinding {
    pub ty: DescriptorType,
    pub stage_flags: ShaderStageFlags,
    /// Binding number (`layout(binding = N)` in GLSL)
    pub binding: u8,
    pub flags: DescriptorFlags,
}

impl DescriptorSetLayoutBinding {
    pub const fn new(
        ty: DescriptorType,
        stage_flags: ShaderStageFlags,
        binding: u8,
        flags: DescriptorFlags,
    ) -> Self {
        Self { ty, stage_flags, binding, flags }
    }

    /// Whether this binding is a dynamic-offset uniform buffer
    pub fn is_dynamic_buffer(&self) -> bool {
        self.ty == DescriptorType::UniformBuffer && self.flags.contains(DescriptorFlags::DYNAMIC_OFFSET)
    }
}

/// Description of a descriptor set layout (blueprint for a set of bindings)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DescriptorSetLayoutDesc {
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutDesc {
    pub fn new(bindings: Vec<DescriptorSetLayoutBinding>) -> Self {
        Self { bindings }
    }
}

// ============================================================================
// Layout bit-mask
// ============================================================================

/// Which kind of resource occupies a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Buffer,
    DynamicBuffer,
    Sampler,
    InputAttachment,
}

impl BindingKind {
    fn letter(&self) -> char {
        match self {
            BindingKind::Buffer => 'B',
            BindingKind::DynamicBuffer => 'D',
            BindingKind::Sampler => 'S',
            BindingKind::InputAttachment => 'I',
        }
    }
}

/// Per-binding occupancy of a layout, one 64-bit mask per resource kind
///
/// Bit `n` of a mask is set when binding `n` holds a resource of that kind.
/// The four masks are disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayoutMask {
    pub buffer: u64,
    pub dynamic_buffer: u64,
    pub sampler: u64,
    pub input_attachment: u64,
}

impl LayoutMask {
    /// Encode a layout description
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if a binding is >= 64 or appears twice.
    pub fn from_desc(desc: &DescriptorSetLayoutDesc) -> Result<Self> {
        let mut mask = LayoutMask::default();
        for binding in &desc.bindings {
            if binding.binding >= MAX_DESCRIPTOR_BINDINGS {
                return Err(Error::InvalidResource(format!(
                    "binding {} exceeds the maximum of {} bindings per set",
                    binding.binding, MAX_DESCRIPTOR_BINDINGS
                )));
            }
            let bit = 1u64 << binding.binding;
            if mask.occupied() & bit != 0 {
                return Err(Error::InvalidResource(format!(
                    "binding {} declared twice in layout",
                    binding.binding
                )));
            }
            match binding.ty {
                DescriptorType::UniformBuffer if binding.is_dynamic_buffer() => mask.dynamic_buffer |= bit,
                DescriptorType::UniformBuffer => mask.buffer |= bit,
                DescriptorType::Sampler => mask.sampler |= bit,
                DescriptorType::InputAttachment => mask.input_attachment |= bit,
            }
        }
        Ok(mask)
    }

    /// Union of all kinds
    pub fn occupied(&self) -> u64 {
        self.buffer | self.dynamic_buffer | self.sampler | self.input_attachment
    }

    /// Highest occupied binding index, `None` for an empty layout
    pub fn max_binding_index(&self) -> Option<u8> {
        let occupied = self.occupied();
        if occupied == 0 {
            None
        } else {
            Some(63 - occupied.leading_zeros() as u8)
        }
    }

    /// Kind of the resource at `binding`, if any
    pub fn kind_of(&self, binding: u8) -> Option<BindingKind> {
        if binding >= MAX_DESCRIPTOR_BINDINGS {
            return None;
        }
        let bit = 1u64 << binding;
        if self.buffer & bit != 0 {
            Some(BindingKind::Buffer)
        } else if self.dynamic_buffer & bit != 0 {
            Some(BindingKind::DynamicBuffer)
        } else if self.sampler & bit != 0 {
            Some(BindingKind::Sampler)
        } else if self.input_attachment & bit != 0 {
            Some(BindingKind::InputAttachment)
        } else {
            None
        }
    }
}

impl fmt::Display for LayoutMask {
    /// One letter per binding up to the highest occupied one:
    /// `B` buffer, `D` dynamic buffer, `S` sampler, `I` input attachment, `-` empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(max) = self.max_binding_index() else {
            return write!(f, "<empty>");
        };
        for binding in 0..=max {
            let letter = self.kind_of(binding).map_or('-', |kind| kind.letter());
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}

// ============================================================================
// DescriptorSetLayout
// ============================================================================

/// A native descriptor set layout together with its mask and shape
///
/// The native layout is destroyed when the last reference is dropped.
pub struct DescriptorSetLayout {
    device: Arc<dyn DescriptorDevice>,
    native: NativeSetLayout,
    mask: LayoutMask,
    count: ResourceCount,
    desc: DescriptorSetLayoutDesc,
}

impl DescriptorSetLayout {
    /// Validate `desc` and create the native layout on `device`
    pub fn new(device: &Arc<dyn DescriptorDevice>, desc: DescriptorSetLayoutDesc) -> Result<Arc<Self>> {
        let mask = LayoutMask::from_desc(&desc)?;
        let count = ResourceCount::from_layout_mask(&mask);
        let native = device.create_descriptor_set_layout(&desc)?;

        crate::engine_debug!("galaxy3d::descriptors",
            "Created descriptor set layout {:?} [{}]", native, mask);

        Ok(Arc::new(Self {
            device: Arc::clone(device),
            native,
            mask,
            count,
            desc,
        }))
    }

    pub fn native(&self) -> NativeSetLayout {
        self.native
    }

    pub fn mask(&self) -> &LayoutMask {
        &self.mask
    }

    pub fn count(&self) -> &ResourceCount {
        &self.count
    }

    pub fn desc(&self) -> &DescriptorSetLayoutDesc {
        &self.desc
    }
}

impl fmt::Debug for DescriptorSetLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorSetLayout")
            .field("native", &self.native)
            .field("mask", &format_args!("{}", self.mask))
            .field("count", &self.count)
            .finish()
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        self.device.destroy_descriptor_set_layout(self.native);
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
