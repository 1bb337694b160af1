use eframe::egui;

use crate::common::RoomSession;

/// Room bar. Returns true when "Leave Room" was clicked.
pub fn render(ui: &mut egui::Ui, session: &RoomSession, realtime_connected: bool) -> bool {
    let mut leave = false;
    ui.horizontal(|ui| {
        ui.heading(format!("Room: {}", session.room_id));
        ui.separator();
        ui.label(format!("User: {}", session.user_name));
        ui.separator();

        let (color, status) = if realtime_connected {
            (egui::Color32::GREEN, "live")
        } else {
            (egui::Color32::GRAY, "offline")
        };
        ui.colored_label(color, "●");
        ui.label(egui::RichText::new(status).weak());

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Leave Room").clicked() {
                leave = true;
            }
        });
    });
    leave
}
