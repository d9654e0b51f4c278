//! Standard descriptor set layouts used by the renderer's shaders
//!
//! Set 0 holds per-view data, set 1 per-renderable data and set 2 material
//! parameters. Post-process, depth and SSR variants use reduced per-view sets.

use crate::descriptor::layout::{
    DescriptorFlags, DescriptorSetLayoutBinding, DescriptorSetLayoutDesc, DescriptorType,
    ShaderStageFlags,
};

/// Set index of each standard set
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorSetBindingPoints {
    PerView = 0,
    PerRenderable = 1,
    PerMaterial = 2,
}

/// Bindings of the per-view set
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerViewBindingPoints {
    FrameUniforms = 0,
    Lights = 1,
    Shadows = 2,
    RecordBuffer = 3,
    FroxelBuffer = 4,
    ShadowMap = 5,
    IblDfgLut = 6,
    IblSpecular = 7,
    Ssao = 8,
    Ssr = 9,
    Structure = 10,
    Fog = 11,
}

/// Bindings of the per-renderable set
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerRenderableBindingPoints {
    ObjectUniforms = 0,
    BonesUniforms = 1,
    MorphingUniforms = 2,
    MorphTargetPositions = 3,
    MorphTargetTangents = 4,
    BonesIndicesAndWeights = 5,
}

const PER_VIEW_NAMES: [&str; 12] = [
    "FrameUniforms",
    "LightsUniforms",
    "ShadowUniforms",
    "FroxelRecordUniforms",
    "FroxelsUniforms",
    "sampler0_shadowMap",
    "sampler0_iblDFG",
    "sampler0_iblSpecular",
    "sampler0_ssao",
    "sampler0_ssr",
    "sampler0_structure",
    "sampler0_fog",
];

const PER_RENDERABLE_NAMES: [&str; 6] = [
    "ObjectUniforms",
    "BonesUniforms",
    "MorphingUniforms",
    "sampler1_positions",
    "sampler1_tangents",
    "sampler1_indicesAndWeights",
];

fn frame_uniforms() -> DescriptorSetLayoutBinding {
    DescriptorSetLayoutBinding::new(
        DescriptorType::UniformBuffer,
        ShaderStageFlags::VERTEX_FRAGMENT,
        PerViewBindingPoints::FrameUniforms as u8,
        DescriptorFlags::empty(),
    )
}

fn fragment_sampler(binding: PerViewBindingPoints) -> DescriptorSetLayoutBinding {
    DescriptorSetLayoutBinding::new(
        DescriptorType::Sampler,
        ShaderStageFlags::FRAGMENT,
        binding as u8,
        DescriptorFlags::empty(),
    )
}

pub fn post_process_layout() -> DescriptorSetLayoutDesc {
    DescriptorSetLayoutDesc::new(vec![frame_uniforms()])
}

pub fn depth_variant_layout() -> DescriptorSetLayoutDesc {
    DescriptorSetLayoutDesc::new(vec![frame_uniforms()])
}

/// Frame uniforms plus the SSR history and structure samplers
pub fn ssr_variant_layout() -> DescriptorSetLayoutDesc {
    DescriptorSetLayoutDesc::new(vec![
        frame_uniforms(),
        fragment_sampler(PerViewBindingPoints::Ssr),
        fragment_sampler(PerViewBindingPoints::Structure),
    ])
}

/// Five uniform buffers (bindings 0-4) then seven fragment samplers (5-11)
pub fn per_view_layout() -> DescriptorSetLayoutDesc {
    use PerViewBindingPoints::*;

    let mut bindings: Vec<DescriptorSetLayoutBinding> = [FrameUniforms, Lights, Shadows, RecordBuffer, FroxelBuffer]
        .into_iter()
        .map(|binding| DescriptorSetLayoutBinding::new(
            DescriptorType::UniformBuffer,
            ShaderStageFlags::VERTEX_FRAGMENT,
            binding as u8,
            DescriptorFlags::empty(),
        ))
        .collect();
    bindings.extend(
        [ShadowMap, IblDfgLut, IblSpecular, Ssao, Ssr, Structure, Fog]
            .into_iter()
            .map(fragment_sampler),
    );
    DescriptorSetLayoutDesc::new(bindings)
}

/// Object and bone uniforms use dynamic offsets; morph and skinning data is
/// sampled in the vertex stage
pub fn per_renderable_layout() -> DescriptorSetLayoutDesc {
    use PerRenderableBindingPoints::*;

    let ubo = |binding: PerRenderableBindingPoints, flags| {
        DescriptorSetLayoutBinding::new(
            DescriptorType::UniformBuffer, ShaderStageFlags::VERTEX_FRAGMENT, binding as u8, flags)
    };
    let vertex_sampler = |binding: PerRenderableBindingPoints| {
        DescriptorSetLayoutBinding::new(
            DescriptorType::Sampler, ShaderStageFlags::VERTEX, binding as u8, DescriptorFlags::empty())
    };

    DescriptorSetLayoutDesc::new(vec![
        ubo(ObjectUniforms, DescriptorFlags::DYNAMIC_OFFSET),
        ubo(BonesUniforms, DescriptorFlags::DYNAMIC_OFFSET),
        ubo(MorphingUniforms, DescriptorFlags::empty()),
        vertex_sampler(MorphTargetPositions),
        vertex_sampler(MorphTargetTangents),
        vertex_sampler(BonesIndicesAndWeights),
    ])
}

/// Shader-side name of `binding` in the standard set `set`
///
/// The material set only exposes its parameter block at binding 0.
pub fn descriptor_name(set: DescriptorSetBindingPoints, binding: u8) -> Option<&'static str> {
    match set {
        DescriptorSetBindingPoints::PerView => PER_VIEW_NAMES.get(binding as usize).copied(),
        DescriptorSetBindingPoints::PerRenderable => PER_RENDERABLE_NAMES.get(binding as usize).copied(),
        DescriptorSetBindingPoints::PerMaterial => (binding == 0).then_some("MaterialParams"),
    }
}

#[cfg(test)]
#[path = "standard_layouts_tests.rs"]
mod tests;
