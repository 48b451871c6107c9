//! GPU textures for imported images, with a white fallback

use glview_import::ImportedTexture;
use wgpu::util::DeviceExt;

/// A GPU-resident texture and its view
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    /// Upload tightly packed sRGB RGBA8 pixels.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Upload an imported image. Returns `None` for images whose pixel data
    /// does not match their dimensions or exceeds the device limit.
    pub fn from_imported(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        imported: &ImportedTexture,
    ) -> Option<Self> {
        let max = device.limits().max_texture_dimension_2d;
        if !pixels_match(imported) || imported.width > max || imported.height > max {
            log::warn!(
                "Skipping texture '{}' ({}x{}, {} bytes)",
                imported.name,
                imported.width,
                imported.height,
                imported.rgba.len()
            );
            return None;
        }
        Some(Self::from_rgba(
            device,
            queue,
            &imported.name,
            imported.width,
            imported.height,
            &imported.rgba,
        ))
    }

    /// 1x1 white, used where a material has no base colour texture
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba(device, queue, "Default White", 1, 1, &[255, 255, 255, 255])
    }
}

fn pixels_match(imported: &ImportedTexture) -> bool {
    imported.width > 0
        && imported.height > 0
        && imported.rgba.len() as u64 == imported.width as u64 * imported.height as u64 * 4
}

/// Repeating trilinear sampler for base colour textures
pub fn material_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Material Sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_match() {
        let texture = |width, height, len| ImportedTexture {
            name: "t".into(),
            width,
            height,
            rgba: vec![0; len],
        };
        assert!(pixels_match(&texture(2, 2, 16)));
        assert!(!pixels_match(&texture(2, 2, 12)));
        assert!(!pixels_match(&texture(0, 0, 0)));
    }
}
