use std::time::Instant;

use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{NetworkCommand, NetworkEvent};

use super::components::{
    chat_area, header,
    input_bar::{self, InputActions},
    join_form::{self, JoinFormActions},
    toasts,
};
use super::state::{AppState, JoinForm, Screen};

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
        form: JoinForm,
    ) -> Self {
        Self {
            state: AppState::new(form),
            command_sender,
            event_receiver,
        }
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            if let Some(command) = self.state.apply(event) {
                self.send_command(command);
            }
        }
    }

    fn send_command(&mut self, command: NetworkCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
            self.state.command_failed(err.into_inner());
        }
    }

    fn join_screen(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.pending_request.is_some();
        let JoinFormActions { create, join } = join_form::render(ui, &mut self.state.form, busy);

        let command = if create {
            self.state.create_room()
        } else if join {
            self.state.join_room()
        } else {
            None
        };
        if let Some(command) = command {
            self.send_command(command);
        }
    }

    fn room_screen(&mut self, ui: &mut egui::Ui) {
        if header::render(ui, &self.state.session, self.state.realtime_connected) {
            let command = self.state.logout();
            self.send_command(command);
            return;
        }
        ui.separator();

        let input_height = 36.0;
        let chat_height = (ui.available_height() - input_height).max(0.0);
        ui.allocate_ui(egui::vec2(ui.available_width(), chat_height), |ui| {
            chat_area::render(ui, &self.state);
        });

        ui.separator();
        let enabled = self.state.realtime_connected;
        let InputActions { changed, submit } =
            input_bar::render(ui, &mut self.state.input_text, enabled);

        if changed {
            if let Some(command) = self.state.input_changed() {
                self.send_command(command);
            }
        }
        if submit {
            if let Some(command) = self.state.send_message() {
                self.send_command(command);
            }
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();
        self.state.prune_toasts(Instant::now());

        egui::CentralPanel::default().show(ctx, |ui| match self.state.screen {
            Screen::Join => self.join_screen(ui),
            Screen::Room => self.room_screen(ui),
        });

        toasts::render(ctx, &self.state.toasts);

        ctx.request_repaint();
    }
}

impl Drop for ChatApp {
    fn drop(&mut self) {
        self.state.cancel_connection();
    }
}
