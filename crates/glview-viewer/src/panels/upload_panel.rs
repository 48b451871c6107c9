//! Upload card: drop target, browse button and format badges

use glview_core::MAX_UPLOAD_BYTES;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(96, 140, 255);

/// Draw the upload card. Returns true when "Choose GLB File" was clicked.
pub fn upload_panel(ui: &mut egui::Ui, drag_over: bool, uploading: bool) -> bool {
    let stroke = if drag_over {
        egui::Stroke::new(2.0, ACCENT)
    } else {
        egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color)
    };
    let fill = if drag_over {
        ACCENT.linear_multiply(0.12)
    } else {
        ui.visuals().faint_bg_color
    };

    let mut browse = false;
    egui::Frame::group(ui.style())
        .stroke(stroke)
        .fill(fill)
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(egui::Margin::same(16.0))
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                if uploading {
                    ui.spinner();
                    ui.heading("Loading Model...");
                } else {
                    ui.heading("Upload 3D Model");
                }
                ui.add_space(4.0);
                ui.label("Drag & drop your GLB file here, or click to browse");
                ui.add_space(8.0);

                browse = ui
                    .add_enabled(!uploading, egui::Button::new("Choose GLB File"))
                    .clicked();

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    badge(ui, "GLB Format");
                    badge(ui, &format!("Max {}MB", MAX_UPLOAD_BYTES / (1024 * 1024)));
                });
            });
        });
    browse
}

fn badge(ui: &mut egui::Ui, text: &str) {
    egui::Frame::none()
        .fill(ui.visuals().extreme_bg_color)
        .rounding(egui::Rounding::same(4.0))
        .inner_margin(egui::Margin::symmetric(6.0, 2.0))
        .show(ui, |ui| {
            ui.small(text);
        });
}
