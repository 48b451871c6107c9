//! Viewport action buttons

use crate::viewport::ViewportAction;

/// What the toolbar needs to know to enable its buttons
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolbarState {
    /// A decoded model is on screen
    pub has_model: bool,
    /// An original file is available to download again
    pub has_file: bool,
}

pub fn toolbar_ui(ui: &mut egui::Ui, state: ToolbarState) -> Option<ViewportAction> {
    let mut action = None;

    if ui.button("Reset View").clicked() {
        action = Some(ViewportAction::ResetCamera);
    }
    if ui
        .add_enabled(state.has_model, egui::Button::new("Screenshot"))
        .clicked()
    {
        action = Some(ViewportAction::Screenshot);
    }
    if state.has_file && ui.button("Download GLB").clicked() {
        action = Some(ViewportAction::DownloadOriginal);
    }
    if ui
        .add_enabled(state.has_file, egui::Button::new("Clear Model"))
        .clicked()
    {
        action = Some(ViewportAction::ClearModel);
    }

    action
}
