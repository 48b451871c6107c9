//! Uniform layouts and the model/backdrop render pipelines

use crate::environment::EnvironmentPalette;
use crate::primitives::Vertex;
use crate::DEPTH_FORMAT;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use glview_import::{AlphaMode, ImportedMaterial};

pub const AMBIENT_INTENSITY: f32 = 0.4;
pub const SPOT_POSITION: [f32; 3] = [10.0, 10.0, 10.0];
/// Half-angle of the spot cone in radians
pub const SPOT_ANGLE: f32 = 0.15;
/// Share of the cone that fades out, 0 = hard edge, 1 = fades from the axis
pub const SPOT_PENUMBRA: f32 = 1.0;
pub const SPOT_INTENSITY: f32 = 1.0;
pub const POINT_POSITION: [f32; 3] = [-10.0, -10.0, -10.0];
pub const POINT_INTENSITY: f32 = 0.3;

/// Per-frame uniforms shared by every pass (bind group 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    /// Model rotation; rigid, so it also transforms normals
    pub model: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub contact_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _pad: f32,
}

impl FrameUniforms {
    pub fn new(
        view_proj: Mat4,
        camera_pos: Vec3,
        model: Mat4,
        light_view_proj: Mat4,
        contact_view_proj: Mat4,
    ) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_view_proj: light_view_proj.to_cols_array_2d(),
            contact_view_proj: contact_view_proj.to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            _pad: 0.0,
        }
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Vec3::ZERO, Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

pub const MATERIAL_ALPHA_MASK: u32 = 1;
pub const MATERIAL_ALPHA_BLEND: u32 = 2;

/// Material uniform buffer data (bind group 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub alpha_cutoff: f32,
    pub flags: u32,
}

impl MaterialUniforms {
    pub fn from_imported(material: &ImportedMaterial) -> Self {
        let flags = match material.alpha_mode {
            AlphaMode::Opaque => 0,
            AlphaMode::Mask => MATERIAL_ALPHA_MASK,
            AlphaMode::Blend => MATERIAL_ALPHA_BLEND,
        };
        Self {
            base_color: material.base_color,
            metallic: material.metallic.clamp(0.0, 1.0),
            roughness: material.roughness.clamp(0.04, 1.0),
            alpha_cutoff: material.alpha_cutoff,
            flags,
        }
    }
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self::from_imported(&ImportedMaterial::default())
    }
}

/// A point light with radius-based attenuation. Radius 0 disables falloff.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PointLight {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// A spot light. Cone edges are stored as cosines.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpotLight {
    pub position: [f32; 3],
    pub radius: f32,
    pub direction: [f32; 3],
    pub cos_inner: f32,
    pub color: [f32; 3],
    pub cos_outer: f32,
    pub intensity: f32,
    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

impl SpotLight {
    /// Spot at `position` aimed at `target` with a half-angle and penumbra
    pub fn aimed(position: Vec3, target: Vec3, angle: f32, penumbra: f32, intensity: f32) -> Self {
        let inner = angle * (1.0 - penumbra.clamp(0.0, 1.0));
        Self {
            position: position.to_array(),
            radius: 0.0,
            direction: (target - position).normalize_or_zero().to_array(),
            cos_inner: inner.cos(),
            color: [1.0, 1.0, 1.0],
            cos_outer: angle.cos(),
            intensity,
            _pad0: 0.0,
            _pad1: 0.0,
            _pad2: 0.0,
        }
    }
}

/// Light and environment uniform buffer (bind group 2)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniforms {
    pub spot: SpotLight,
    pub point: PointLight,
    /// rgb tint, w = ambient intensity
    pub ambient_sky: [f32; 4],
    pub ambient_ground: [f32; 4],
    pub env_zenith: [f32; 4],
    pub env_horizon: [f32; 4],
    /// w = reflection strength
    pub env_ground: [f32; 4],
    /// x = shadows enabled, y = depth bias, z = shadow texel size
    pub shadow_params: [f32; 4],
}

impl LightUniforms {
    /// The viewer's fixed light rig under the given environment
    pub fn stage(palette: &EnvironmentPalette, shadows: bool, shadow_resolution: u32) -> Self {
        let rgb = |c: [f32; 3], w: f32| [c[0], c[1], c[2], w];
        Self {
            spot: SpotLight::aimed(
                Vec3::from_array(SPOT_POSITION),
                Vec3::ZERO,
                SPOT_ANGLE,
                SPOT_PENUMBRA,
                SPOT_INTENSITY,
            ),
            point: PointLight {
                position: POINT_POSITION,
                radius: 0.0,
                color: [1.0, 1.0, 1.0],
                intensity: POINT_INTENSITY,
            },
            ambient_sky: rgb(palette.ambient_sky, AMBIENT_INTENSITY),
            ambient_ground: rgb(palette.ambient_ground, AMBIENT_INTENSITY),
            env_zenith: rgb(palette.zenith, 1.0),
            env_horizon: rgb(palette.horizon, 1.0),
            env_ground: rgb(palette.ground, palette.reflection),
            shadow_params: [
                if shadows { 1.0 } else { 0.0 },
                0.0005,
                1.0 / shadow_resolution.max(1) as f32,
                0.0,
            ],
        }
    }
}

/// Bind group layouts plus the pipelines that shade the model and backdrop
pub struct RenderPipelines {
    pub opaque: wgpu::RenderPipeline,
    pub double_sided: wgpu::RenderPipeline,
    pub blend: wgpu::RenderPipeline,
    pub backdrop: wgpu::RenderPipeline,
    pub frame_layout: wgpu::BindGroupLayout,
    pub material_layout: wgpu::BindGroupLayout,
    pub light_layout: wgpu::BindGroupLayout,
}

impl RenderPipelines {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Model Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("model.wgsl").into()),
        });
        let backdrop_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Backdrop Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("backdrop.wgsl").into()),
        });

        // Bind group 0: frame uniforms (vertex + fragment)
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
            label: Some("Frame Bind Group Layout"),
        });

        // Bind group 1: material uniforms + base colour texture
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("Material Bind Group Layout"),
        });

        // Bind group 2: lights + spot shadow map
        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
            label: Some("Light Bind Group Layout"),
        });

        let model_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &material_layout, &light_layout],
            push_constant_ranges: &[],
        });

        let opaque = model_pipeline(
            device,
            &model_layout,
            &shader,
            format,
            ModelVariant::Opaque,
        );
        let double_sided = model_pipeline(
            device,
            &model_layout,
            &shader,
            format,
            ModelVariant::DoubleSided,
        );
        let blend = model_pipeline(device, &model_layout, &shader, format, ModelVariant::Blend);

        let backdrop_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Backdrop Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &light_layout],
            push_constant_ranges: &[],
        });

        let backdrop = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Backdrop Pipeline"),
            layout: Some(&backdrop_layout),
            vertex: wgpu::VertexState {
                module: &backdrop_shader,
                entry_point: Some("vs_backdrop"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &backdrop_shader,
                entry_point: Some("fs_backdrop"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            opaque,
            double_sided,
            blend,
            backdrop,
            frame_layout,
            material_layout,
            light_layout,
        }
    }

    /// Pipeline for a material
    pub fn for_material(&self, alpha_mode: AlphaMode, double_sided: bool) -> &wgpu::RenderPipeline {
        match ModelVariant::for_material(alpha_mode, double_sided) {
            ModelVariant::Opaque => &self.opaque,
            ModelVariant::DoubleSided => &self.double_sided,
            ModelVariant::Blend => &self.blend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelVariant {
    Opaque,
    DoubleSided,
    /// Alpha blended, drawn after opaque geometry without depth writes
    Blend,
}

impl ModelVariant {
    fn for_material(alpha_mode: AlphaMode, double_sided: bool) -> Self {
        match (alpha_mode, double_sided) {
            (AlphaMode::Blend, _) => ModelVariant::Blend,
            (_, true) => ModelVariant::DoubleSided,
            (_, false) => ModelVariant::Opaque,
        }
    }
}

pub(crate) fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn model_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    variant: ModelVariant,
) -> wgpu::RenderPipeline {
    let (label, cull_mode, depth_write_enabled) = match variant {
        ModelVariant::Opaque => ("Model Opaque Pipeline", Some(wgpu::Face::Back), true),
        ModelVariant::DoubleSided => ("Model Double-Sided Pipeline", None, true),
        ModelVariant::Blend => ("Model Blend Pipeline", None, false),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glview_core::EnvironmentPreset;

    #[test]
    fn test_uniform_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 32);
        assert_eq!(std::mem::size_of::<SpotLight>(), 64);
        assert_eq!(std::mem::size_of::<PointLight>(), 32);
        assert_eq!(std::mem::size_of::<LightUniforms>() % 16, 0);
    }

    #[test]
    fn test_stage_light_rig() {
        let palette = EnvironmentPalette::for_preset(EnvironmentPreset::City);
        let lights = LightUniforms::stage(&palette, true, 2048);

        assert_eq!(lights.spot.position, SPOT_POSITION);
        let d = Vec3::from_array(lights.spot.direction);
        assert!((d - Vec3::splat(-1.0).normalize()).length() < 1e-5);
        // Full penumbra: falloff starts on the axis
        assert!((lights.spot.cos_inner - 1.0).abs() < 1e-6);
        assert!((lights.spot.cos_outer - SPOT_ANGLE.cos()).abs() < 1e-6);
        assert_eq!(lights.point.position, POINT_POSITION);
        assert_eq!(lights.point.intensity, POINT_INTENSITY);
        assert_eq!(lights.ambient_sky[3], AMBIENT_INTENSITY);
        assert_eq!(lights.shadow_params[0], 1.0);
        assert!((lights.shadow_params[2] - 1.0 / 2048.0).abs() < 1e-9);

        let unlit = LightUniforms::stage(&palette, false, 2048);
        assert_eq!(unlit.shadow_params[0], 0.0);
    }

    #[test]
    fn test_material_flags() {
        let mut material = ImportedMaterial::default();
        assert_eq!(MaterialUniforms::from_imported(&material).flags, 0);
        material.alpha_mode = AlphaMode::Mask;
        assert_eq!(MaterialUniforms::from_imported(&material).flags, MATERIAL_ALPHA_MASK);
        material.alpha_mode = AlphaMode::Blend;
        assert_eq!(MaterialUniforms::from_imported(&material).flags, MATERIAL_ALPHA_BLEND);
    }

    #[test]
    fn test_variant_selection() {
        assert_eq!(ModelVariant::for_material(AlphaMode::Opaque, false), ModelVariant::Opaque);
        assert_eq!(ModelVariant::for_material(AlphaMode::Mask, true), ModelVariant::DoubleSided);
        assert_eq!(ModelVariant::for_material(AlphaMode::Blend, false), ModelVariant::Blend);
    }
}
