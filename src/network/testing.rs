//! In-memory stand-ins for the backend and the WebSocket transport.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::common::{ChatMessage, Room};
use crate::error::ChatError;

use super::rest::RoomBackend;
use super::stomp::{Command, Frame};
use super::transport::{Connector, WsLink};

#[derive(Debug, Default)]
struct BackendState {
    rooms: HashSet<String>,
    history: HashMap<String, Vec<ChatMessage>>,
    fail_history: bool,
}

/// Backend double. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
    calls: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn with_rooms(rooms: &[&str]) -> Self {
        let backend = Self::default();
        backend
            .state
            .lock()
            .unwrap()
            .rooms
            .extend(rooms.iter().map(|room| room.to_string()));
        backend
    }

    pub fn with_history(self, room_id: &str, messages: Vec<ChatMessage>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.rooms.insert(room_id.to_string());
            state.history.insert(room_id.to_string(), messages);
        }
        self
    }

    pub fn failing_history(self) -> Self {
        self.state.lock().unwrap().fail_history = true;
        self
    }

    pub fn has_room(&self, room_id: &str) -> bool {
        self.state.lock().unwrap().rooms.contains(room_id)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoomBackend for FakeBackend {
    async fn create_room(&self, room_id: &str) -> Result<Room, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if !state.rooms.insert(room_id.to_string()) {
            return Err(ChatError::RoomExists);
        }
        Ok(Room {
            room_id: room_id.to_string(),
            messages: Vec::new(),
        })
    }

    async fn join_room(&self, room_id: &str) -> Result<Room, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if !state.rooms.contains(room_id) {
            return Err(ChatError::RoomNotFound("Room not found!!".to_string()));
        }
        Ok(Room {
            room_id: room_id.to_string(),
            messages: Vec::new(),
        })
    }

    async fn load_messages(&self, room_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_history {
            return Err(ChatError::HistoryLoad("500 Internal Server Error".to_string()));
        }
        Ok(state.history.get(room_id).cloned().unwrap_or_default())
    }
}

/// Hands every opened link's far end to the test as a [`FakeServer`].
#[derive(Debug)]
pub struct FakeConnector {
    servers: mpsc::UnboundedSender<FakeServer>,
    attempts: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FakeServer>) {
        let (servers, rx) = mpsc::unbounded_channel();
        (
            Self {
                servers,
                attempts: AtomicUsize::new(0),
            },
            rx,
        )
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    async fn connect(&self, _url: &Url) -> Result<WsLink, ChatError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        let close = CancellationToken::new();

        self.servers
            .send(FakeServer {
                to_client: Some(to_client),
                from_client,
                close: close.clone(),
            })
            .map_err(|_| ChatError::Transport("connection refused".to_string()))?;

        Ok(WsLink {
            outbound,
            inbound,
            close,
        })
    }
}

/// The broker side of a fake link.
#[derive(Debug)]
pub struct FakeServer {
    to_client: Option<mpsc::UnboundedSender<String>>,
    from_client: mpsc::UnboundedReceiver<String>,
    pub close: CancellationToken,
}

impl FakeServer {
    /// Next frame the client sent, or `None` once the client let go of the
    /// link.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            let raw = self.from_client.recv().await?;
            if let Some(frame) = Frame::decode(&raw).unwrap() {
                return Some(frame);
            }
        }
    }

    pub async fn expect(&mut self, command: Command) -> Frame {
        let frame = self
            .next_frame()
            .await
            .unwrap_or_else(|| panic!("link closed while waiting for {command}"));
        assert_eq!(frame.command, command, "unexpected frame {frame:?}");
        frame
    }

    /// Completes the handshake and swallows both SUBSCRIBE frames.
    pub async fn accept(&mut self) {
        self.expect(Command::Connect).await;
        self.push(Frame::new(Command::Connected).header("version", "1.2"));
        self.expect(Command::Subscribe).await;
        self.expect(Command::Subscribe).await;
    }

    pub fn push(&self, frame: Frame) {
        self.push_raw(&frame.encode());
    }

    pub fn push_raw(&self, raw: &str) {
        if let Some(to_client) = &self.to_client {
            let _ = to_client.send(raw.to_string());
        }
    }

    pub fn deliver_message(&self, message: &ChatMessage) {
        self.push(
            Frame::new(Command::Message)
                .header("subscription", super::connection::MESSAGE_SUBSCRIPTION)
                .header(
                    "destination",
                    super::connection::message_topic(&message.room_id),
                )
                .with_body(serde_json::to_string(message).unwrap()),
        );
    }

    pub fn deliver_typing(&self, sender: &str) {
        self.push(
            Frame::new(Command::Message)
                .header("subscription", super::connection::TYPING_SUBSCRIPTION)
                .with_body(sender),
        );
    }

    pub fn drop_transport(&mut self) {
        self.to_client = None;
    }
}

pub fn message(sender: &str, content: &str, room_id: &str) -> ChatMessage {
    ChatMessage {
        sender: sender.to_string(),
        content: content.to_string(),
        timestamp: "2025-03-01T10:15:00".to_string(),
        room_id: room_id.to_string(),
    }
}
