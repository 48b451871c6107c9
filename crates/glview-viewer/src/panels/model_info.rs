//! Side panel sections: model details, features and technical details

use glview_core::{format_size, MAX_UPLOAD_BYTES};
use glview_import::ModelStats;
use glview_session::ModelFile;

pub fn model_info_ui(ui: &mut egui::Ui, file: &ModelFile, stats: Option<&ModelStats>) {
    ui.heading("Model Info");
    ui.separator();

    egui::Grid::new("model_info")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Name:");
            ui.label(&file.name);
            ui.end_row();

            ui.label("Size:");
            ui.monospace(format_size(file.size()));
            ui.end_row();

            ui.label("Hash:");
            ui.monospace(file.hash.short())
                .on_hover_text(file.hash.to_prefixed_hex());
            ui.end_row();

            if let Some(stats) = stats {
                ui.label("Meshes:");
                ui.monospace(stats.meshes.to_string());
                ui.end_row();

                ui.label("Vertices:");
                ui.monospace(stats.vertices.to_string());
                ui.end_row();

                ui.label("Triangles:");
                ui.monospace(stats.triangles.to_string());
                ui.end_row();

                ui.label("Materials:");
                ui.monospace(stats.materials.to_string());
                ui.end_row();
            }
        });
}

pub fn features_ui(ui: &mut egui::Ui) {
    ui.collapsing("Features", |ui| {
        for feature in [
            "Drag & drop GLB upload",
            "Orbit, zoom and pan controls",
            "Auto-rotation with hover pause",
            "Spot light shadows and contact shadow",
            "Environment lighting presets",
            "Screenshot and GLB download",
        ] {
            ui.label(format!("• {}", feature));
        }
    });
}

pub fn technical_details_ui(ui: &mut egui::Ui) {
    ui.collapsing("Technical Details", |ui| {
        egui::Grid::new("technical_details")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                for (label, value) in [
                    ("Supported Format", "GLB".to_string()),
                    ("Max File Size", format!("{}MB", MAX_UPLOAD_BYTES / (1024 * 1024))),
                    ("Renderer", "wgpu".to_string()),
                    ("UI", "egui".to_string()),
                ] {
                    ui.label(label);
                    ui.monospace(value);
                    ui.end_row();
                }
            });
    });
}

/// Onboarding card shown only while nothing is loaded
pub fn welcome_card(ui: &mut egui::Ui) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(12.0))
        .show(ui, |ui| {
            ui.strong("Ready to Explore 3D Models?");
            ui.label(
                "Upload a .glb file to inspect it from every angle, \
                 take a screenshot or download it again.",
            );
        });
}
