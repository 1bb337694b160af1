use eframe::egui;

use crate::common::time::time_ago;
use crate::ui::state::AppState;

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    let typing_height = 24.0;
    let available = (ui.available_height() - typing_height).max(0.0);

    egui::ScrollArea::vertical()
        .max_height(available)
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if state.messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet").weak());
            }

            for message in &state.messages {
                let own = state.is_own_message(message);
                let align = if own { egui::Align::Max } else { egui::Align::Min };

                ui.with_layout(egui::Layout::top_down(align), |ui| {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_max_width(ui.available_width() * 0.7);
                        // Tin của mình không hiện tên người gửi
                        if !own {
                            ui.label(egui::RichText::new(&message.sender).strong());
                        }
                        ui.label(&message.content);
                        ui.label(egui::RichText::new(time_ago(&message.timestamp)).small().weak());
                    });
                });
                ui.add_space(4.0);
            }
        });

    match &state.typing_user {
        Some(sender) => {
            ui.label(egui::RichText::new(format!("{sender} is typing...")).italics().weak());
        }
        None => {
            ui.add_space(typing_height);
        }
    }
}
