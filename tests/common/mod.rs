//! An in-process stand-in for the chat backend: the three room endpoints
//! plus a minimal STOMP broker on `/chat`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};

use rust_room_chat::common::{ChatMessage, NetworkEvent, Room};
use rust_room_chat::config::AppConfig;
use rust_room_chat::network::stomp::{Command, Frame};

pub const STAMP: &str = "2025-03-01T10:15:00";

#[derive(Clone)]
pub struct MockBackend {
    rooms: Arc<Mutex<HashMap<String, Vec<ChatMessage>>>>,
    frames: Arc<Mutex<Vec<String>>>,
    bus: broadcast::Sender<(String, String)>,
}

#[derive(Deserialize)]
struct RoomBody {
    #[serde(rename = "roomId")]
    room_id: String,
}

impl MockBackend {
    pub fn new() -> Self {
        let (bus, _) = broadcast::channel(64);
        Self {
            rooms: Arc::default(),
            frames: Arc::default(),
            bus,
        }
    }

    pub fn with_room(self, room_id: &str, history: Vec<ChatMessage>) -> Self {
        self.rooms
            .lock()
            .unwrap()
            .insert(room_id.to_string(), history);
        self
    }

    /// Every client frame the broker received, as `COMMAND destination-or-id`.
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    /// Waits until the broker has seen a frame matching `line`.
    pub async fn wait_for_frame(&self, line: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.frames().iter().any(|frame| frame == line) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("broker never saw {line:?}; got {:?}", self.frames()));
    }

    pub async fn serve(self) -> SocketAddr {
        let app = Router::new()
            .route("/create-room", post(create_room))
            .route("/join-room", post(join_room))
            .route("/messages/:room_id", get(messages))
            .route("/chat", get(chat))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }
}

pub fn config_for(addr: SocketAddr) -> AppConfig {
    AppConfig {
        backend_url: format!("http://{addr}"),
        ..AppConfig::default()
    }
}

pub fn message(sender: &str, content: &str, room_id: &str) -> ChatMessage {
    ChatMessage {
        sender: sender.to_string(),
        content: content.to_string(),
        timestamp: STAMP.to_string(),
        room_id: room_id.to_string(),
    }
}

pub async fn next_event(events: &mut mpsc::Receiver<NetworkEvent>) -> NetworkEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a network event")
        .expect("network task stopped")
}

async fn create_room(State(state): State<MockBackend>, Json(body): Json<RoomBody>) -> Response {
    let mut rooms = state.rooms.lock().unwrap();
    if rooms.contains_key(&body.room_id) {
        return (StatusCode::BAD_REQUEST, "Room already exists!").into_response();
    }
    rooms.insert(body.room_id.clone(), Vec::new());
    Json(Room {
        room_id: body.room_id,
        messages: Vec::new(),
    })
    .into_response()
}

async fn join_room(State(state): State<MockBackend>, Json(body): Json<RoomBody>) -> Response {
    let rooms = state.rooms.lock().unwrap();
    match rooms.get(&body.room_id) {
        Some(messages) => Json(Room {
            room_id: body.room_id,
            messages: messages.clone(),
        })
        .into_response(),
        None => (StatusCode::BAD_REQUEST, "Room not found!!").into_response(),
    }
}

async fn messages(State(state): State<MockBackend>, Path(room_id): Path<String>) -> Response {
    let rooms = state.rooms.lock().unwrap();
    match rooms.get(&room_id) {
        Some(messages) => Json(messages.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn chat(ws: WebSocketUpgrade, State(state): State<MockBackend>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| broker(socket, state))
}

async fn broker(mut socket: WebSocket, state: MockBackend) {
    let mut bus = state.bus.subscribe();
    // destination -> subscription id
    let mut subscriptions: HashMap<String, String> = HashMap::new();
    let mut message_ids = 0u64;

    loop {
        tokio::select! {
            biased;
            incoming = socket.recv() => {
                let Some(Ok(incoming)) = incoming else { break };
                let Message::Text(raw) = incoming else { continue };
                let Ok(Some(frame)) = Frame::decode(&raw) else { continue };

                let target = frame
                    .get("destination")
                    .or_else(|| frame.get("id"))
                    .unwrap_or_default()
                    .to_string();
                state.frames.lock().unwrap().push(format!("{} {target}", frame.command).trim().to_string());

                match frame.command {
                    Command::Connect => {
                        let connected = Frame::new(Command::Connected).header("version", "1.2");
                        if socket.send(Message::Text(connected.encode())).await.is_err() {
                            break;
                        }
                    }
                    Command::Subscribe => {
                        if let Some(id) = frame.get("id") {
                            subscriptions.insert(target, id.to_string());
                        }
                    }
                    Command::Unsubscribe => subscriptions.retain(|_, id| *id != target),
                    Command::Send => state.route(&target, &frame.body),
                    Command::Disconnect => {
                        if let Some(receipt) = frame.get("receipt") {
                            let reply = Frame::new(Command::Receipt).header("receipt-id", receipt);
                            let _ = socket.send(Message::Text(reply.encode())).await;
                        }
                        break;
                    }
                    _ => {}
                }
            }
            Ok((destination, body)) = bus.recv() => {
                let Some(id) = subscriptions.get(&destination) else { continue };
                message_ids += 1;
                let frame = Frame::new(Command::Message)
                    .header("subscription", id.clone())
                    .header("destination", destination)
                    .header("message-id", message_ids.to_string())
                    .with_body(body);
                if socket.send(Message::Text(frame.encode())).await.is_err() {
                    break;
                }
            }
        }
    }
}

impl MockBackend {
    fn route(&self, destination: &str, body: &str) {
        if let Some(room_id) = destination.strip_prefix("/app/sendMessage/") {
            let Ok(mut message) = serde_json::from_str::<ChatMessage>(body) else {
                return;
            };
            message.room_id = room_id.to_string();
            message.timestamp = STAMP.to_string();
            if let Some(history) = self.rooms.lock().unwrap().get_mut(room_id) {
                history.push(message.clone());
            }
            let Ok(json) = serde_json::to_string(&message) else {
                return;
            };
            let _ = self.bus.send((format!("/topic/room/{room_id}"), json));
        } else if let Some(room_id) = destination.strip_prefix("/app/typing/") {
            let _ = self
                .bus
                .send((format!("/topic/typing/{room_id}"), body.to_string()));
        }
    }
}
