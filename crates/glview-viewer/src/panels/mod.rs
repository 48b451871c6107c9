//! GUI panels for the viewer

mod model_info;
mod overlays;
mod render_stats;
mod toasts;
mod toolbar;
mod upload_panel;

pub use model_info::{features_ui, model_info_ui, technical_details_ui, welcome_card};
pub use overlays::{drop_overlay, empty_placeholder, failed_overlay, hint_overlay, loading_overlay};
pub use render_stats::RenderStats;
pub use toasts::toasts_ui;
pub use toolbar::{toolbar_ui, ToolbarState};
pub use upload_panel::upload_panel;
