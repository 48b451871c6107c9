//! glview CLI - open, render and inspect GLB models

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{inspect, render, view};
use glview_core::{EnvironmentPreset, ViewerConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glview")]
#[command(about = "Interactive viewer for GLB 3D models", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of the global and project config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the viewer window
    View {
        /// Model to upload on startup
        file: Option<PathBuf>,
    },

    /// Render a model to a PNG image (headless)
    Render {
        /// Path to a .glb file
        file: PathBuf,

        /// Output image path
        #[arg(short, long, default_value = "render.png")]
        output: PathBuf,

        /// Image width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value = "720")]
        height: u32,

        /// Camera horizontal angle in degrees
        #[arg(long, default_value = "0")]
        yaw: f32,

        /// Camera vertical angle in degrees
        #[arg(long, default_value = "0")]
        pitch: f32,

        /// Camera orbit distance
        #[arg(long)]
        distance: Option<f32>,

        /// Environment preset (city, studio, sunset, night)
        #[arg(long)]
        environment: Option<EnvironmentPreset>,

        /// Disable the spot light shadow
        #[arg(long)]
        no_shadows: bool,
    },

    /// Print model statistics
    Inspect {
        /// Path to a .glb file
        file: PathBuf,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => ViewerConfig::load().context("Failed to load config"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::View { file } => view::run(config, file),
        Commands::Render {
            file,
            output,
            width,
            height,
            yaw,
            pitch,
            distance,
            environment,
            no_shadows,
        } => render::run(
            render::RenderArgs {
                file,
                output,
                width,
                height,
                yaw,
                pitch,
                distance,
                environment,
                no_shadows,
            },
            &config,
        ),
        Commands::Inspect { file, format } => inspect::run(&file, &format),
    }
}
