//! Soft contact shadow under the model
//!
//! The model is drawn from below with an orthographic projection spanning the
//! ground square, writing darkness that fades with height. Two blur passes
//! soften the capture, and a transparent ground quad samples it.

use crate::gpu_model::GpuModel;
use crate::pipeline::uniform_entry;
use crate::primitives::{Mesh, Vertex};
use crate::DEPTH_FORMAT;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

pub const CONTACT_PLANE_Y: f32 = -1.4;
/// Edge length of the ground square
pub const CONTACT_SIZE: f32 = 10.0;
pub const CONTACT_OPACITY: f32 = 0.4;
pub const CONTACT_BLUR: f32 = 2.5;
/// Height above the plane beyond which geometry casts nothing
pub const CONTACT_FAR: f32 = 4.5;
pub const CONTACT_RESOLUTION: u32 = 512;

const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BlurUniforms {
    direction: [f32; 2],
    radius: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GroundUniforms {
    plane_y: f32,
    half_size: f32,
    opacity: f32,
    _pad: f32,
}

/// Orthographic projection looking up from the plane. World x maps to clip
/// x, world z to clip -y, height above the plane to depth in `0..=1`.
pub fn contact_projection(plane_y: f32, half_size: f32, far: f32) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(1.0 / half_size, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0 / far, 0.0),
        Vec4::new(0.0, -1.0 / half_size, 0.0, 0.0),
        Vec4::new(0.0, 0.0, -plane_y / far, 1.0),
    )
}

/// Blur radius in capture texels
fn blur_radius_texels(blur: f32, resolution: u32) -> f32 {
    blur * resolution as f32 / 256.0
}

pub struct ContactShadow {
    capture_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    ground_pipeline: wgpu::RenderPipeline,
    capture_view: wgpu::TextureView,
    scratch_view: wgpu::TextureView,
    blur_horizontal: wgpu::BindGroup,
    blur_vertical: wgpu::BindGroup,
    ground_bind_group: wgpu::BindGroup,
    ground_vertices: wgpu::Buffer,
    ground_indices: wgpu::Buffer,
    ground_index_count: u32,
}

impl ContactShadow {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        frame_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let contact_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Contact Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("contact.wgsl").into()),
        });
        let blur_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("blur.wgsl").into()),
        });

        let sampled_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("Contact Sampled Bind Group Layout"),
        });

        let capture_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Contact Capture Pipeline Layout"),
            bind_group_layouts: &[frame_layout],
            push_constant_ranges: &[],
        });
        let blur_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Contact Blur Pipeline Layout"),
            bind_group_layouts: &[&sampled_layout],
            push_constant_ranges: &[],
        });
        let ground_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Ground Pipeline Layout"),
            bind_group_layouts: &[frame_layout, &sampled_layout],
            push_constant_ranges: &[],
        });

        // Darkest sample wins where geometry overlaps
        let max_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Max,
            },
            alpha: wgpu::BlendComponent::REPLACE,
        };

        let capture_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Contact Capture Pipeline"),
            layout: Some(&capture_layout),
            vertex: wgpu::VertexState {
                module: &contact_shader,
                entry_point: Some("vs_contact"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &contact_shader,
                entry_point: Some("fs_contact"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CAPTURE_FORMAT,
                    blend: Some(max_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let blur_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Contact Blur Pipeline"),
            layout: Some(&blur_layout),
            vertex: wgpu::VertexState {
                module: &blur_shader,
                entry_point: Some("vs_fullscreen"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &blur_shader,
                entry_point: Some("fs_blur"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CAPTURE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let ground_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Ground Pipeline"),
            layout: Some(&ground_layout),
            vertex: wgpu::VertexState {
                module: &contact_shader,
                entry_point: Some("vs_ground"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &contact_shader,
                entry_point: Some("fs_ground"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let capture_view = create_capture_texture(device, "Contact Capture");
        let scratch_view = create_capture_texture(device, "Contact Blur Scratch");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Contact Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let radius = blur_radius_texels(CONTACT_BLUR, CONTACT_RESOLUTION);
        let sampled_group = |label: &str, view: &wgpu::TextureView, uniforms: &[u8]| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: uniforms,
                usage: wgpu::BufferUsages::UNIFORM,
            });
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &sampled_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffer.as_entire_binding(),
                    },
                ],
            })
        };

        // capture -> scratch horizontally, scratch -> capture vertically
        let blur_horizontal = sampled_group(
            "Contact Blur Horizontal",
            &capture_view,
            bytemuck::bytes_of(&BlurUniforms {
                direction: [1.0, 0.0],
                radius,
                _pad: 0.0,
            }),
        );
        let blur_vertical = sampled_group(
            "Contact Blur Vertical",
            &scratch_view,
            bytemuck::bytes_of(&BlurUniforms {
                direction: [0.0, 1.0],
                radius,
                _pad: 0.0,
            }),
        );
        let ground_bind_group = sampled_group(
            "Ground Bind Group",
            &capture_view,
            bytemuck::bytes_of(&GroundUniforms {
                plane_y: CONTACT_PLANE_Y,
                half_size: CONTACT_SIZE / 2.0,
                opacity: CONTACT_OPACITY,
                _pad: 0.0,
            }),
        );

        let quad = Mesh::ground_quad(CONTACT_PLANE_Y, CONTACT_SIZE / 2.0);
        let ground_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ground Vertices"),
            contents: bytemuck::cast_slice(&quad.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ground_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ground Indices"),
            contents: bytemuck::cast_slice(&quad.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            capture_pipeline,
            blur_pipeline,
            ground_pipeline,
            capture_view,
            scratch_view,
            blur_horizontal,
            blur_vertical,
            ground_bind_group,
            ground_vertices,
            ground_indices,
            ground_index_count: quad.indices.len() as u32,
        }
    }

    pub fn projection() -> Mat4 {
        contact_projection(CONTACT_PLANE_Y, CONTACT_SIZE / 2.0, CONTACT_FAR)
    }

    /// Capture and blur. Without a model the capture is cleared to no shadow.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame_bind_group: &wgpu::BindGroup,
        model: Option<&GpuModel>,
    ) {
        {
            let mut pass = begin_capture_pass(encoder, "Contact Capture Pass", &self.capture_view);
            if let Some(model) = model {
                pass.set_pipeline(&self.capture_pipeline);
                pass.set_bind_group(0, frame_bind_group, &[]);
                model.draw_geometry(&mut pass);
            }
        }
        if model.is_none() {
            return;
        }
        {
            let mut pass = begin_capture_pass(encoder, "Contact Blur H Pass", &self.scratch_view);
            pass.set_pipeline(&self.blur_pipeline);
            pass.set_bind_group(0, &self.blur_horizontal, &[]);
            pass.draw(0..3, 0..1);
        }
        {
            let mut pass = begin_capture_pass(encoder, "Contact Blur V Pass", &self.capture_view);
            pass.set_pipeline(&self.blur_pipeline);
            pass.set_bind_group(0, &self.blur_vertical, &[]);
            pass.draw(0..3, 0..1);
        }
    }

    /// Draw the shadowed ground quad into the main pass.
    pub fn draw_ground(&self, pass: &mut wgpu::RenderPass<'_>, frame_bind_group: &wgpu::BindGroup) {
        pass.set_pipeline(&self.ground_pipeline);
        pass.set_bind_group(0, frame_bind_group, &[]);
        pass.set_bind_group(1, &self.ground_bind_group, &[]);
        pass.set_vertex_buffer(0, self.ground_vertices.slice(..));
        pass.set_index_buffer(self.ground_indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.ground_index_count, 0, 0..1);
    }
}

fn create_capture_texture(device: &wgpu::Device, label: &str) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: CONTACT_RESOLUTION,
            height: CONTACT_RESOLUTION,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: CAPTURE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn begin_capture_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    view: &wgpu::TextureView,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_plane_maps_to_zero_depth() {
        let proj = ContactShadow::projection();
        let p = proj.project_point3(Vec3::new(0.0, CONTACT_PLANE_Y, 0.0));
        assert!(p.z.abs() < 1e-6);
        let top = proj.project_point3(Vec3::new(0.0, CONTACT_PLANE_Y + CONTACT_FAR, 0.0));
        assert!((top.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_square_edges_map_to_clip_edges() {
        let proj = ContactShadow::projection();
        let half = CONTACT_SIZE / 2.0;
        let p = proj.project_point3(Vec3::new(half, 0.0, half));
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!((p.y + 1.0).abs() < 1e-6);
        let q = proj.project_point3(Vec3::new(-half, 0.0, -half));
        assert!((q.x + 1.0).abs() < 1e-6);
        assert!((q.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_texture_uv_matches_ground_uv() {
        // Ground shader: uv = (xz / half + 1) / 2. Capture: u = (x + 1) / 2, v = (1 - y) / 2.
        let proj = ContactShadow::projection();
        let half = CONTACT_SIZE / 2.0;
        let world = Vec3::new(1.5, 0.0, -3.0);
        let clip = proj.project_point3(world);
        let capture_uv = ((clip.x + 1.0) / 2.0, (1.0 - clip.y) / 2.0);
        let ground_uv = ((world.x / half + 1.0) / 2.0, (world.z / half + 1.0) / 2.0);
        assert!((capture_uv.0 - ground_uv.0).abs() < 1e-6);
        assert!((capture_uv.1 - ground_uv.1).abs() < 1e-6);
    }

    #[test]
    fn test_blur_radius_scales_with_resolution() {
        assert_eq!(blur_radius_texels(2.5, 256), 2.5);
        assert_eq!(blur_radius_texels(2.5, 512), 5.0);
    }
}
