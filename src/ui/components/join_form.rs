use eframe::egui;

use crate::ui::state::JoinForm;

#[derive(Default)]
pub struct JoinFormActions {
    pub create: bool,
    pub join: bool,
}

pub fn render(ui: &mut egui::Ui, form: &mut JoinForm, busy: bool) -> JoinFormActions {
    let mut actions = JoinFormActions::default();

    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.heading("Join Room / Create Room");
        ui.add_space(16.0);

        ui.label("Your name");
        ui.add(egui::TextEdit::singleline(&mut form.user_name).hint_text("Enter your name"));
        ui.add_space(8.0);

        ui.label("Room ID");
        let room_field =
            ui.add(egui::TextEdit::singleline(&mut form.room_id).hint_text("Enter room id"));
        ui.add_space(16.0);

        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Join Room")).clicked() {
                actions.join = true;
            }
            if ui.add_enabled(!busy, egui::Button::new("Create Room")).clicked() {
                actions.create = true;
            }
        });

        // Enter ở ô Room ID = Join
        if !busy && room_field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            actions.join = true;
        }

        if busy {
            ui.add_space(8.0);
            ui.spinner();
        }
    });

    actions
}
