use eframe::egui;

#[derive(Default)]
pub struct InputActions {
    pub changed: bool,
    pub submit: bool,
}

pub fn render(ui: &mut egui::Ui, input_text: &mut String, enabled: bool) -> InputActions {
    let mut actions = InputActions::default();
    ui.horizontal(|ui| {
        let response = ui.add_enabled(
            enabled,
            egui::TextEdit::singleline(input_text)
                .hint_text("Type your message here...")
                .desired_width(ui.available_width() - 80.0),
        );
        actions.changed = response.changed();

        if ui.add_enabled(enabled, egui::Button::new("Send")).clicked() {
            actions.submit = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            actions.submit = true;
            response.request_focus();
        }
    });
    actions
}
