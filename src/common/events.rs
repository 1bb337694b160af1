use crate::error::ChatError;

use super::types::{ChatMessage, ConnectionId, RoomSession};

/// Sự kiện từ tầng mạng gửi lên UI.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    RoomCreated(RoomSession),
    RoomJoined(RoomSession),
    RoomRejected(ChatError),
    Realtime {
        id: ConnectionId,
        event: RealtimeEvent,
    },
}

/// Sự kiện của một kết nối realtime.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    History(Vec<ChatMessage>),
    Connected,
    MessageReceived(ChatMessage),
    Typing(String),
    TypingCleared,
    ServerError(String),
    Failed(ChatError),
    Dropped,
    Closed,
}
