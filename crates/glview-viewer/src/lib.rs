//! glview Viewer - interactive GLB model viewer
//!
//! A winit window with a wgpu-rendered model viewport and egui panels for
//! upload, model info, export actions and notifications. The upload and
//! reference lifecycle lives in `glview-session`; this crate wires it to the
//! window, the decode jobs and the renderer.

pub mod app;
mod clock;
mod export;
pub mod panels;
pub mod picking;
pub mod viewport;

pub use app::run;
pub use export::{unique_path, write_export};
