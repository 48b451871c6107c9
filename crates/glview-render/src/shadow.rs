//! Spot light shadow mapping
//!
//! Renders the model's depth from the spot light into a single depth
//! texture. The model shader samples it with a comparison sampler.

use crate::context::create_depth_texture;
use crate::gpu_model::GpuModel;
use crate::pipeline::{SPOT_ANGLE, SPOT_POSITION};
use crate::primitives::Vertex;
use crate::DEPTH_FORMAT;
use glam::{Mat4, Vec3};

pub const DEFAULT_SHADOW_RESOLUTION: u32 = 2048;

pub struct ShadowPass {
    pub pipeline: wgpu::RenderPipeline,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub resolution: u32,
    pub enabled: bool,
}

impl ShadowPass {
    pub fn new(device: &wgpu::Device, frame_layout: &wgpu::BindGroupLayout, resolution: u32) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Depth Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_shadow"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Double-sided materials must still cast
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let resolution = clamp_resolution(resolution);
        let (texture, view) = create_depth_texture(device, resolution, resolution, "Shadow Map");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            pipeline,
            texture,
            view,
            sampler,
            resolution,
            enabled: true,
        }
    }

    /// Recreate the depth texture. Bind groups referencing the old view must
    /// be rebuilt by the caller.
    pub fn set_resolution(&mut self, device: &wgpu::Device, resolution: u32) {
        let resolution = clamp_resolution(resolution);
        if resolution == self.resolution {
            return;
        }
        let (texture, view) = create_depth_texture(device, resolution, resolution, "Shadow Map");
        self.texture = texture;
        self.view = view;
        self.resolution = resolution;
        log::debug!("Shadow map resolution set to {}", resolution);
    }

    /// View-projection of the spot light. The frustum matches the cone.
    pub fn light_view_projection() -> Mat4 {
        let eye = Vec3::from_array(SPOT_POSITION);
        let distance = eye.length();
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(2.0 * SPOT_ANGLE, 1.0, distance * 0.5, distance * 2.0);
        proj * view
    }

    /// Clear the map and, when enabled, draw the model into it.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame_bind_group: &wgpu::BindGroup,
        model: Option<&GpuModel>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let (true, Some(model)) = (self.enabled, model) {
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, frame_bind_group, &[]);
            model.draw_geometry(&mut pass);
        }
    }
}

fn clamp_resolution(resolution: u32) -> u32 {
    resolution.clamp(256, 8192)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_centred_in_light_view() {
        let p = ShadowPass::light_view_projection().project_point3(Vec3::ZERO);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn test_fitted_model_inside_light_frustum() {
        // A model fitted to radius 1.25 stays within the cone
        let vp = ShadowPass::light_view_projection();
        for corner in [
            Vec3::new(1.25, 0.0, 0.0),
            Vec3::new(0.0, 1.25, 0.0),
            Vec3::new(0.0, 0.0, -1.25),
            Vec3::new(-0.8, -0.8, 0.5),
        ] {
            let p = vp.project_point3(corner);
            assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0, "{:?} -> {:?}", corner, p);
            assert!(p.z > 0.0 && p.z < 1.0);
        }
    }

    #[test]
    fn test_resolution_clamped() {
        assert_eq!(clamp_resolution(16), 256);
        assert_eq!(clamp_resolution(2048), 2048);
        assert_eq!(clamp_resolution(100_000), 8192);
    }
}
