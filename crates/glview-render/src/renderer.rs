//! Model renderer: one decoded model under the fixed light rig

use crate::camera::OrbitCamera;
use crate::capture::{is_bgra, read_texture, swizzle_bgra, CapturedFrame};
use crate::contact_shadow::ContactShadow;
use crate::context::{create_depth_texture, RenderContext, RenderError};
use crate::environment::EnvironmentPalette;
use crate::gpu_model::GpuModel;
use crate::pipeline::{FrameUniforms, LightUniforms, RenderPipelines};
use crate::shadow::{ShadowPass, DEFAULT_SHADOW_RESOLUTION};
use crate::texture::{material_sampler, GpuTexture};
use glam::Mat4;
use glview_core::{EnvironmentPreset, ViewerConfig};
use glview_import::{ImportResult, MeshBounds, ModelStats};
use wgpu::util::DeviceExt;

/// Renderer settings taken from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererOptions {
    pub environment: EnvironmentPreset,
    pub shadows: bool,
    pub shadow_resolution: u32,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            environment: EnvironmentPreset::default(),
            shadows: true,
            shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
        }
    }
}

impl From<&ViewerConfig> for RendererOptions {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            environment: config.environment,
            shadows: config.shadows,
            shadow_resolution: config.shadow_resolution,
        }
    }
}

pub struct ModelRenderer {
    format: wgpu::TextureFormat,
    pipelines: RenderPipelines,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
    shadow: ShadowPass,
    contact: ContactShadow,
    white: GpuTexture,
    sampler: wgpu::Sampler,
    model: Option<GpuModel>,
    model_rotation: f32,
    environment: EnvironmentPreset,
}

impl ModelRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        options: RendererOptions,
    ) -> Self {
        let pipelines = RenderPipelines::new(device, format);
        let mut shadow =
            ShadowPass::new(device, &pipelines.frame_layout, options.shadow_resolution);
        shadow.enabled = options.shadows;
        let contact = ContactShadow::new(device, format, &pipelines.frame_layout);

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Uniforms"),
            contents: bytemuck::cast_slice(&[FrameUniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &pipelines.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let lights = light_uniforms(options.environment, &shadow);
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Uniforms"),
            contents: bytemuck::cast_slice(&[lights]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_bind_group = create_light_bind_group(device, &pipelines, &light_buffer, &shadow);

        let white = GpuTexture::white(device, queue);
        let sampler = material_sampler(device);

        log::debug!(
            "Model renderer ready ({:?}, environment {}, shadows {})",
            format,
            options.environment,
            options.shadows
        );

        Self {
            format,
            pipelines,
            frame_buffer,
            frame_bind_group,
            light_buffer,
            light_bind_group,
            shadow,
            contact,
            white,
            sampler,
            model: None,
            model_rotation: 0.0,
            environment: options.environment,
        }
    }

    /// Renderer targeting a window surface
    pub fn for_context(context: &RenderContext, options: RendererOptions) -> Self {
        Self::new(&context.device, &context.queue, context.format(), options)
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Upload a decoded model, replacing the current one.
    pub fn load_model(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, result: &ImportResult) {
        self.model = Some(GpuModel::upload(
            device,
            queue,
            result,
            &self.pipelines,
            &self.white,
            &self.sampler,
        ));
        self.model_rotation = 0.0;
    }

    /// Drop the model's GPU resources.
    pub fn clear_model(&mut self) {
        if self.model.take().is_some() {
            log::debug!("Released model GPU resources");
        }
        self.model_rotation = 0.0;
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Bounds in model space, before rotation
    pub fn model_bounds(&self) -> Option<MeshBounds> {
        self.model.as_ref().and_then(|m| m.bounds)
    }

    pub fn model_stats(&self) -> Option<&ModelStats> {
        self.model.as_ref().map(|m| &m.stats)
    }

    /// Rotation about +Y in radians
    pub fn set_model_rotation(&mut self, angle: f32) {
        self.model_rotation = angle.rem_euclid(std::f32::consts::TAU);
    }

    pub fn model_rotation(&self) -> f32 {
        self.model_rotation
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.model_rotation)
    }

    pub fn environment(&self) -> EnvironmentPreset {
        self.environment
    }

    pub fn set_environment(&mut self, preset: EnvironmentPreset) {
        self.environment = preset;
    }

    pub fn shadows_enabled(&self) -> bool {
        self.shadow.enabled
    }

    pub fn set_shadows(&mut self, enabled: bool) {
        self.shadow.enabled = enabled;
    }

    pub fn set_shadow_resolution(&mut self, device: &wgpu::Device, resolution: u32) {
        self.shadow.set_resolution(device, resolution);
        self.light_bind_group =
            create_light_bind_group(device, &self.pipelines, &self.light_buffer, &self.shadow);
    }

    /// Draw the frame into `target_view`.
    pub fn render_to(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        depth_view: &wgpu::TextureView,
        camera: &OrbitCamera,
        target_view: &wgpu::TextureView,
    ) {
        let frame = FrameUniforms::new(
            camera.view_projection_matrix(),
            camera.position(),
            self.model_matrix(),
            ShadowPass::light_view_projection(),
            ContactShadow::projection(),
        );
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[frame]));
        queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[light_uniforms(self.environment, &self.shadow)]),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Model Render Encoder"),
        });

        let model = self.model.as_ref();
        self.shadow.record(&mut encoder, &self.frame_bind_group, model);
        self.contact.record(&mut encoder, &self.frame_bind_group, model);

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Model Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipelines.backdrop);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(1, &self.light_bind_group, &[]);
            pass.draw(0..3, 0..1);

            if let Some(model) = model {
                let mut ground_drawn = false;
                for (mesh, material) in model.draw_order() {
                    let blended = material.alpha_mode == glview_import::AlphaMode::Blend;
                    // Ground goes between opaque and blended geometry
                    if blended && !ground_drawn {
                        self.contact.draw_ground(&mut pass, &self.frame_bind_group);
                        ground_drawn = true;
                    }
                    pass.set_pipeline(
                        self.pipelines
                            .for_material(material.alpha_mode, material.double_sided),
                    );
                    pass.set_bind_group(0, &self.frame_bind_group, &[]);
                    pass.set_bind_group(1, &material.bind_group, &[]);
                    pass.set_bind_group(2, &self.light_bind_group, &[]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
                if !ground_drawn {
                    self.contact.draw_ground(&mut pass, &self.frame_bind_group);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Render one frame offscreen at `width` x `height` and read it back.
    pub fn capture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        camera: &OrbitCamera,
    ) -> Result<CapturedFrame, RenderError> {
        let width = width.max(1);
        let height = height.max(1);

        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Capture Color Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let (_depth_texture, depth_view) =
            create_depth_texture(device, width, height, "Capture Depth Texture");

        let mut camera = camera.clone();
        camera.aspect = width as f32 / height as f32;
        self.render_to(device, queue, &depth_view, &camera, &color_view);

        let mut rgba = read_texture(device, queue, &color_texture, width, height)?;
        if is_bgra(self.format) {
            swizzle_bgra(&mut rgba);
        }
        Ok(CapturedFrame {
            width,
            height,
            rgba,
        })
    }
}

fn light_uniforms(environment: EnvironmentPreset, shadow: &ShadowPass) -> LightUniforms {
    LightUniforms::stage(
        &EnvironmentPalette::for_preset(environment),
        shadow.enabled,
        shadow.resolution,
    )
}

fn create_light_bind_group(
    device: &wgpu::Device,
    pipelines: &RenderPipelines,
    light_buffer: &wgpu::Buffer,
    shadow: &ShadowPass,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Light Bind Group"),
        layout: &pipelines.light_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&shadow.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&shadow.sampler),
            },
        ],
    })
}
