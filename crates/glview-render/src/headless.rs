//! Window-less GPU context for offscreen rendering

use crate::context::{request_device, RenderError};

/// Device and queue with no surface. Pair with
/// [`ModelRenderer::capture`](crate::ModelRenderer::capture) to render
/// straight to an image.
pub struct HeadlessContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
}

impl HeadlessContext {
    pub async fn new() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;
        log::debug!("Headless adapter: {}", adapter.get_info().name);

        let (device, queue) = request_device(&adapter, "glview headless device").await?;

        Ok(Self {
            device,
            queue,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
        })
    }

    /// Blocking constructor for command-line use
    pub fn create() -> Result<Self, RenderError> {
        pollster::block_on(Self::new())
    }
}
