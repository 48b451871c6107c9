//! Viewport overlays: placeholder, loading, failure, drop target and hints

use crate::viewport::ViewportAction;
use glview_import::LoadProgress;

const MUTED: egui::Color32 = egui::Color32::from_rgb(150, 155, 170);

fn centered<R>(
    ctx: &egui::Context,
    id: &str,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> R {
    egui::Area::new(egui::Id::new(id))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .order(egui::Order::Middle)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style())
                .inner_margin(egui::Margin::same(20.0))
                .show(ui, |ui| ui.vertical_centered(add_contents).inner)
                .inner
        })
        .inner
}

/// Shown while no model is loaded
pub fn empty_placeholder(ctx: &egui::Context) {
    centered(ctx, "viewport_placeholder", |ui| {
        ui.heading("No Model Loaded");
        ui.colored_label(MUTED, "Upload a GLB file to view your 3D model");
    });
}

pub fn loading_overlay(ctx: &egui::Context, progress: &LoadProgress) {
    centered(ctx, "viewport_loading", |ui| {
        ui.spinner();
        ui.heading("Loading 3D Model");
        match progress.percent() {
            Some(percent) => {
                ui.label(format!("{}% complete", percent));
                ui.add(
                    egui::ProgressBar::new(progress.fraction().unwrap_or(0.0))
                        .desired_width(220.0),
                );
            }
            None => {
                ui.colored_label(MUTED, "Preparing...");
                ui.add(egui::ProgressBar::new(0.0).desired_width(220.0).animate(true));
            }
        }
    });
}

/// Decode failure with a retry button
pub fn failed_overlay(ctx: &egui::Context, message: &str) -> Option<ViewportAction> {
    centered(ctx, "viewport_failed", |ui| {
        ui.heading("Could not display model");
        ui.colored_label(MUTED, message);
        ui.add_space(8.0);
        ui.button("Choose another file")
            .clicked()
            .then_some(ViewportAction::RetryUpload)
    })
}

/// Whole-window highlight while a file is dragged over
pub fn drop_overlay(ctx: &egui::Context) {
    let rect = ctx.screen_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("drop_overlay"),
    ));
    let accent = egui::Color32::from_rgb(96, 140, 255);
    painter.rect_filled(rect.shrink(8.0), 12.0, accent.gamma_multiply(0.15));
    painter.rect_stroke(rect.shrink(8.0), 12.0, egui::Stroke::new(3.0, accent));
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        "Drop GLB file to upload",
        egui::FontId::proportional(24.0),
        egui::Color32::WHITE,
    );
}

/// Control hints along the bottom of the viewport
pub fn hint_overlay(ctx: &egui::Context) {
    egui::Area::new(egui::Id::new("viewport_hints"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -12.0])
        .order(egui::Order::Background)
        .interactable(false)
        .show(ctx, |ui| {
            ui.colored_label(
                MUTED,
                "Click & drag to rotate • Scroll to zoom • Right-click & drag to pan",
            );
        });
}
