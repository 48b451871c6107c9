//! Headless model-to-PNG render command

use super::read_model;
use anyhow::{Context, Result};
use glview_core::{EnvironmentPreset, ViewerConfig};
use glview_import::decode_glb;
use glview_render::{HeadlessContext, ModelRenderer, OrbitCamera, RendererOptions};
use glview_viewer::viewport::FIT_RADIUS;
use std::path::PathBuf;

pub struct RenderArgs {
    pub file: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: Option<f32>,
    pub environment: Option<EnvironmentPreset>,
    pub no_shadows: bool,
}

pub fn run(args: RenderArgs, config: &ViewerConfig) -> Result<()> {
    let (name, bytes) = read_model(&args.file)?;
    let mut model = decode_glb(&bytes).with_context(|| format!("Failed to decode {}", name))?;
    model.fit_to_radius(FIT_RADIUS);
    let stats = model.stats();
    println!(
        "Loaded {}: {} meshes, {} triangles",
        name, stats.meshes, stats.triangles
    );

    let ctx = HeadlessContext::create().context("Failed to create headless render context")?;

    let mut options = RendererOptions::from(config);
    if let Some(environment) = args.environment {
        options.environment = environment;
    }
    if args.no_shadows {
        options.shadows = false;
    }

    let mut renderer = ModelRenderer::new(&ctx.device, &ctx.queue, ctx.format, options);
    renderer.load_model(&ctx.device, &ctx.queue, &model);

    let camera = camera_for(&args);
    let frame = renderer
        .capture(&ctx.device, &ctx.queue, args.width, args.height, &camera)
        .context("Failed to render frame")?;
    frame
        .save_png(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Rendered {}x{} to {}",
        frame.width,
        frame.height,
        args.output.display()
    );
    Ok(())
}

fn camera_for(args: &RenderArgs) -> OrbitCamera {
    let mut camera = OrbitCamera::new();
    camera.aspect = args.width.max(1) as f32 / args.height.max(1) as f32;
    let distance = args.distance.unwrap_or(camera.distance);
    camera.set_orbit(args.yaw.to_radians(), args.pitch.to_radians(), distance);
    camera
}
