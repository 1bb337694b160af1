use tokio_util::sync::CancellationToken;

use super::types::{ConnectionId, RoomSession};

/// Lệnh UI gửi xuống tầng mạng.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    CreateRoom {
        room_id: String,
        user_name: String,
    },
    JoinRoom {
        room_id: String,
        user_name: String,
    },
    /// Tải lịch sử rồi mở kết nối realtime cho `session`.
    /// - cancel: hủy token này để đóng kết nối
    Connect {
        id: ConnectionId,
        session: RoomSession,
        cancel: CancellationToken,
    },
    SendMessage(String),
    SendTyping,
    Disconnect,
}
