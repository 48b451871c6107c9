//! glview Render - wgpu renderer for a single decoded glTF model
//!
//! Shades the model with a metallic/roughness BRDF under a fixed rig: a
//! shadow-casting spot light, a dim point light and an environment-tinted
//! ambient. A blurred contact shadow grounds the model and a gradient
//! backdrop fills the rest of the frame.

mod camera;
mod capture;
mod contact_shadow;
mod context;
mod environment;
mod gpu_model;
mod headless;
mod pipeline;
mod primitives;
mod renderer;
mod shadow;
mod texture;

/// Depth buffer format for every pass
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub use camera::{OrbitCamera, DAMPING_FACTOR, MAX_DISTANCE, MAX_PITCH, MIN_DISTANCE};
pub use capture::{swizzle_bgra, CapturedFrame, SCREENSHOT_FILE_NAME};
pub use contact_shadow::{
    contact_projection, ContactShadow, CONTACT_BLUR, CONTACT_FAR, CONTACT_OPACITY,
    CONTACT_PLANE_Y, CONTACT_SIZE,
};
pub use context::{RenderContext, RenderError};
pub use environment::EnvironmentPalette;
pub use gpu_model::{GpuMaterial, GpuMesh, GpuModel};
pub use headless::HeadlessContext;
pub use pipeline::{
    FrameUniforms, LightUniforms, MaterialUniforms, PointLight, RenderPipelines, SpotLight,
    AMBIENT_INTENSITY, POINT_INTENSITY, POINT_POSITION, SPOT_ANGLE, SPOT_INTENSITY,
    SPOT_PENUMBRA, SPOT_POSITION,
};
pub use primitives::{Mesh, Vertex};
pub use renderer::{ModelRenderer, RendererOptions};
pub use shadow::{ShadowPass, DEFAULT_SHADOW_RESOLUTION};
pub use texture::GpuTexture;

#[cfg(test)]
mod tests {
    #[test]
    fn model_shader_wgsl_parses() {
        let source = include_str!("model.wgsl");
        naga::front::wgsl::parse_str(source).expect("model.wgsl failed to parse");
    }

    #[test]
    fn shadow_shader_wgsl_parses() {
        let source = include_str!("shadow.wgsl");
        naga::front::wgsl::parse_str(source).expect("shadow.wgsl failed to parse");
    }

    #[test]
    fn backdrop_shader_wgsl_parses() {
        let source = include_str!("backdrop.wgsl");
        naga::front::wgsl::parse_str(source).expect("backdrop.wgsl failed to parse");
    }

    #[test]
    fn contact_shader_wgsl_parses() {
        let source = include_str!("contact.wgsl");
        naga::front::wgsl::parse_str(source).expect("contact.wgsl failed to parse");
    }

    #[test]
    fn blur_shader_wgsl_parses() {
        let source = include_str!("blur.wgsl");
        naga::front::wgsl::parse_str(source).expect("blur.wgsl failed to parse");
    }
}
