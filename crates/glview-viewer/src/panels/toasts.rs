//! Toast stack in the bottom-right corner

use glview_session::{ToastVariant, Toasts};
use std::time::Instant;

const TOAST_WIDTH: f32 = 300.0;
const MARGIN: f32 = 16.0;

pub fn toasts_ui(ctx: &egui::Context, toasts: &Toasts) {
    if toasts.is_empty() {
        return;
    }
    let now = Instant::now();

    egui::Area::new(egui::Id::new("toasts"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-MARGIN, -MARGIN])
        .order(egui::Order::Foreground)
        .interactable(false)
        .show(ctx, |ui| {
            ui.set_width(TOAST_WIDTH);
            for toast in toasts.iter() {
                let alpha = toast.alpha(now, toasts.ttl());
                let (fill, text) = match toast.variant {
                    ToastVariant::Default => (
                        egui::Color32::from_rgb(32, 36, 44),
                        egui::Color32::from_rgb(230, 235, 245),
                    ),
                    ToastVariant::Destructive => (
                        egui::Color32::from_rgb(150, 32, 40),
                        egui::Color32::WHITE,
                    ),
                };

                egui::Frame::none()
                    .fill(fill.gamma_multiply(alpha))
                    .rounding(egui::Rounding::same(6.0))
                    .inner_margin(egui::Margin::same(10.0))
                    .show(ui, |ui| {
                        ui.set_width(TOAST_WIDTH);
                        let text = text.gamma_multiply(alpha);
                        ui.label(egui::RichText::new(&toast.title).strong().color(text));
                        if !toast.description.is_empty() {
                            ui.label(egui::RichText::new(&toast.description).color(text));
                        }
                    });
                ui.add_space(6.0);
            }
        });
}
