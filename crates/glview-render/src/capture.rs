//! Reading rendered frames back to the CPU

use crate::context::RenderError;
use std::io::Cursor;
use std::path::Path;

pub const SCREENSHOT_FILE_NAME: &str = "model-screenshot.png";

/// A rendered frame as tightly packed RGBA8 pixels
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl CapturedFrame {
    pub fn to_image(&self) -> Result<image::RgbaImage, RenderError> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .ok_or_else(|| RenderError::ImageEncode("pixel buffer does not match frame size".into()))
    }

    /// PNG-encoded bytes
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut out = Cursor::new(Vec::new());
        self.to_image()?
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| RenderError::ImageEncode(e.to_string()))?;
        Ok(out.into_inner())
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        self.to_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| RenderError::ImageEncode(e.to_string()))
    }
}

/// Swap red and blue in place, turning BGRA rows into RGBA.
pub fn swizzle_bgra(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

pub(crate) fn is_bgra(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}

/// Bytes per row after padding to wgpu's copy alignment
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

/// Copy a 4-byte-per-pixel texture into a tightly packed buffer.
pub(crate) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, RenderError> {
    let unpadded_bytes_per_row = width * 4;
    let padded = padded_bytes_per_row(width);

    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Pixel Readback Buffer"),
        size: (padded * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging_buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = staging_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    rx.recv()
        .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?
        .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?;

    let data = buffer_slice.get_mapped_range();
    let pixels = strip_row_padding(&data, unpadded_bytes_per_row, padded, height);
    drop(data);
    staging_buffer.unmap();

    Ok(pixels)
}

fn strip_row_padding(data: &[u8], row_bytes: u32, padded_row_bytes: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((row_bytes * height) as usize);
    for row in 0..height {
        let start = (row * padded_row_bytes) as usize;
        let end = start + row_bytes as usize;
        pixels.extend_from_slice(&data[start..end]);
    }
    pixels
}
