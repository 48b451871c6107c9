//! Interactive viewer command

use anyhow::Result;
use glview_core::ViewerConfig;
use std::path::PathBuf;

pub fn run(config: ViewerConfig, file: Option<PathBuf>) -> Result<()> {
    log::info!(
        "Opening viewer ({}x{}, exports to {})",
        config.window_width,
        config.window_height,
        config.export_dir.display()
    );
    glview_viewer::run(config, file)
}
