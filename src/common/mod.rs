pub mod commands;
pub mod events;
pub mod time;
pub mod types;

pub use commands::NetworkCommand;
pub use events::{NetworkEvent, RealtimeEvent};
pub use types::{ChatMessage, ConnectionId, Room, RoomSession, TypingSignal};
