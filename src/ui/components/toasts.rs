use eframe::egui;

use crate::ui::state::{Toast, ToastKind};

pub fn render(ctx: &egui::Context, toasts: &[Toast]) {
    if toasts.is_empty() {
        return;
    }

    egui::Area::new(egui::Id::new("toasts"))
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .show(ctx, |ui| {
            for toast in toasts {
                let color = match toast.kind {
                    ToastKind::Success => egui::Color32::from_rgb(46, 160, 67),
                    ToastKind::Error => egui::Color32::from_rgb(218, 54, 51),
                };
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.colored_label(color, &toast.text);
                });
                ui.add_space(4.0);
            }
        });
}
