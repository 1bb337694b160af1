use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::common::{ChatMessage, ConnectionId, NetworkCommand, NetworkEvent, RealtimeEvent, RoomSession};
use crate::error::ChatError;
use crate::session::validate_input;

const TOAST_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Join,
    Room,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomRequest {
    Create,
    Join,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinForm {
    pub user_name: String,
    pub room_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
    pub shown_at: Instant,
}

struct LiveConnection {
    id: ConnectionId,
    cancel: CancellationToken,
}

/// Trạng thái cục bộ của UI.
pub struct AppState {
    pub screen: Screen,
    pub form: JoinForm,
    pub session: RoomSession,
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    pub typing_user: Option<String>,
    pub toasts: Vec<Toast>,
    pub pending_request: Option<RoomRequest>,
    pub realtime_connected: bool,
    connection: Option<LiveConnection>,
    last_connection_id: ConnectionId,
}

impl AppState {
    pub fn new(form: JoinForm) -> Self {
        Self {
            screen: Screen::Join,
            form,
            session: RoomSession::default(),
            messages: Vec::new(),
            input_text: String::new(),
            typing_user: None,
            toasts: Vec::new(),
            pending_request: None,
            realtime_connected: false,
            connection: None,
            last_connection_id: ConnectionId::default(),
        }
    }

    pub fn create_room(&mut self) -> Option<NetworkCommand> {
        self.request_room(RoomRequest::Create)
    }

    pub fn join_room(&mut self) -> Option<NetworkCommand> {
        self.request_room(RoomRequest::Join)
    }

    fn request_room(&mut self, request: RoomRequest) -> Option<NetworkCommand> {
        if self.pending_request.is_some() {
            return None;
        }
        if let Err(err) = validate_input(&self.form.room_id, &self.form.user_name) {
            self.toast(ToastKind::Error, err.to_string());
            return None;
        }

        self.pending_request = Some(request);
        let room_id = self.form.room_id.trim().to_string();
        let user_name = self.form.user_name.trim().to_string();
        Some(match request {
            RoomRequest::Create => NetworkCommand::CreateRoom { room_id, user_name },
            RoomRequest::Join => NetworkCommand::JoinRoom { room_id, user_name },
        })
    }

    pub fn apply(&mut self, event: NetworkEvent) -> Option<NetworkCommand> {
        match event {
            NetworkEvent::RoomCreated(session) => {
                self.pending_request = None;
                self.toast(ToastKind::Success, "Room created");
                Some(self.enter_room(session))
            }
            NetworkEvent::RoomJoined(session) => {
                self.pending_request = None;
                self.toast(ToastKind::Success, "Joined room");
                Some(self.enter_room(session))
            }
            NetworkEvent::RoomRejected(err) => {
                let request = self.pending_request.take();
                let text = match (&err, request) {
                    (ChatError::Network(_), Some(RoomRequest::Create)) => {
                        "Error in creating room".to_string()
                    }
                    (ChatError::Network(_), Some(RoomRequest::Join)) => {
                        "Error in joining room".to_string()
                    }
                    _ => err.to_string(),
                };
                self.toast(ToastKind::Error, text);
                None
            }
            NetworkEvent::Realtime { id, event } => {
                self.apply_realtime(id, event);
                None
            }
        }
    }

    fn apply_realtime(&mut self, id: ConnectionId, event: RealtimeEvent) {
        if !self.is_current(id) {
            log::debug!("Discarding {event:?} from stale connection {id}");
            return;
        }

        match event {
            RealtimeEvent::History(history) => self.messages = history,
            RealtimeEvent::Connected => {
                self.realtime_connected = true;
                self.toast(ToastKind::Success, "Connected");
            }
            RealtimeEvent::MessageReceived(message) => self.messages.push(message),
            RealtimeEvent::Typing(sender) => {
                if sender != self.session.user_name {
                    self.typing_user = Some(sender);
                }
            }
            RealtimeEvent::TypingCleared => self.typing_user = None,
            RealtimeEvent::ServerError(message) => self.toast(ToastKind::Error, message),
            RealtimeEvent::Failed(err) => {
                self.realtime_connected = false;
                self.connection = None;
                self.toast(ToastKind::Error, err.to_string());
            }
            RealtimeEvent::Dropped => {
                self.realtime_connected = false;
                self.typing_user = None;
                self.connection = None;
                self.toast(
                    ToastKind::Error,
                    format!("{}; leave and join again to reconnect", ChatError::TransportDrop),
                );
            }
            RealtimeEvent::Closed => {
                self.realtime_connected = false;
                self.connection = None;
            }
        }
    }

    fn is_current(&self, id: ConnectionId) -> bool {
        self.session.connected
            && self
                .connection
                .as_ref()
                .is_some_and(|connection| connection.id == id)
    }

    pub fn enter_room(&mut self, session: RoomSession) -> NetworkCommand {
        self.cancel_connection();

        self.session = session.clone();
        self.screen = Screen::Room;
        self.messages.clear();
        self.input_text.clear();
        self.typing_user = None;
        self.realtime_connected = false;

        self.last_connection_id = self.last_connection_id.next();
        let cancel = CancellationToken::new();
        self.connection = Some(LiveConnection {
            id: self.last_connection_id,
            cancel: cancel.clone(),
        });

        NetworkCommand::Connect {
            id: self.last_connection_id,
            session,
            cancel,
        }
    }

    // Ô nhập trống thì giữ nguyên, không gửi.
    pub fn send_message(&mut self) -> Option<NetworkCommand> {
        if !self.can_publish() || self.input_text.trim().is_empty() {
            return None;
        }
        Some(NetworkCommand::SendMessage(std::mem::take(
            &mut self.input_text,
        )))
    }

    pub fn input_changed(&mut self) -> Option<NetworkCommand> {
        self.can_publish().then_some(NetworkCommand::SendTyping)
    }

    fn can_publish(&self) -> bool {
        self.session.is_live() && self.realtime_connected && self.connection.is_some()
    }

    /// Rời phòng: hủy kết nối, xóa session, quay về màn hình join.
    pub fn logout(&mut self) -> NetworkCommand {
        self.cancel_connection();
        self.session.clear();
        self.messages.clear();
        self.input_text.clear();
        self.typing_user = None;
        self.realtime_connected = false;
        self.screen = Screen::Join;
        NetworkCommand::Disconnect
    }

    pub fn cancel_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.cancel.cancel();
        }
    }

    /// Hoàn tác khi tầng mạng không nhận lệnh.
    pub fn command_failed(&mut self, command: NetworkCommand) {
        match command {
            NetworkCommand::CreateRoom { .. } | NetworkCommand::JoinRoom { .. } => {
                self.pending_request = None;
            }
            NetworkCommand::Connect { id, .. } => {
                if self.is_current(id) {
                    self.cancel_connection();
                    self.realtime_connected = false;
                }
            }
            NetworkCommand::SendMessage(content) => {
                if self.input_text.is_empty() {
                    self.input_text = content;
                }
            }
            // Không toast cho mỗi phím gõ.
            NetworkCommand::SendTyping | NetworkCommand::Disconnect => return,
        }
        self.toast(ToastKind::Error, "Network task is not running");
    }

    pub fn toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        self.toasts.push(Toast {
            kind,
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    pub fn prune_toasts(&mut self, now: Instant) {
        self.toasts
            .retain(|toast| now.duration_since(toast.shown_at) < TOAST_LIFETIME);
    }

    pub fn is_own_message(&self, message: &ChatMessage) -> bool {
        message.sender == self.session.user_name
    }
}
