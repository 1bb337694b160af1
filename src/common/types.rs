use serde::{Deserialize, Serialize};

/// Domain model đại diện một tin nhắn chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub content: String,
    #[serde(rename = "timeStamp", alias = "timestamp", default)]
    pub timestamp: String,
    #[serde(rename = "roomId", default)]
    pub room_id: String,
}

impl ChatMessage {
    pub fn outgoing(session: &RoomSession, content: impl Into<String>) -> Self {
        Self {
            sender: session.user_name.clone(),
            content: content.into(),
            timestamp: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
            room_id: session.room_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Phòng và người dùng hiện tại của client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSession {
    pub room_id: String,
    pub user_name: String,
    pub connected: bool,
}

impl RoomSession {
    pub fn connected(room_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            user_name: user_name.into(),
            connected: true,
        }
    }

    pub fn is_live(&self) -> bool {
        self.connected && !self.room_id.is_empty() && !self.user_name.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSignal {
    pub sender_name: String,
}

/// Identifies one connect request so that late events from an older
/// connection can be told apart from the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
