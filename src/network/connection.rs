use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::common::{ChatMessage, RoomSession};
use crate::error::ChatError;

use super::stomp::{Command, Frame};
use super::transport::{Connector, WsLink};

pub const MESSAGE_SUBSCRIPTION: &str = "sub-0";
pub const TYPING_SUBSCRIPTION: &str = "sub-1";

pub fn message_topic(room_id: &str) -> String {
    format!("/topic/room/{room_id}")
}

pub fn typing_topic(room_id: &str) -> String {
    format!("/topic/typing/{room_id}")
}

pub fn send_message_destination(room_id: &str) -> String {
    format!("/app/sendMessage/{room_id}")
}

pub fn typing_destination(room_id: &str) -> String {
    format!("/app/typing/{room_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
}

/// What the broker pushed to us, already routed by subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message(ChatMessage),
    Typing(String),
    ServerError(String),
    Dropped,
}

/// One STOMP session over one transport, bound to one room and user.
#[derive(Debug)]
pub struct RealtimeConnection {
    session: RoomSession,
    link: WsLink,
    state: ConnectionState,
}

impl RealtimeConnection {
    /// Opens the transport, performs the STOMP handshake and subscribes to
    /// the room's message and typing topics. Cancelling `cancel` at any point
    /// aborts with [`ChatError::Cancelled`].
    pub async fn open<C: Connector>(
        connector: &C,
        url: &Url,
        session: RoomSession,
        cancel: &CancellationToken,
    ) -> Result<Self, ChatError> {
        if !session.is_live() {
            return Err(ChatError::InvalidInput);
        }

        let link = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            link = connector.connect(url) => link?,
        };

        let mut connection = Self {
            session,
            link,
            state: ConnectionState::Connecting,
        };
        connection.handshake(url, cancel).await?;
        Ok(connection)
    }

    async fn handshake(&mut self, url: &Url, cancel: &CancellationToken) -> Result<(), ChatError> {
        self.send_frame(Frame::connect(url.host_str().unwrap_or("localhost")))?;

        loop {
            let raw = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ChatError::Cancelled),
                raw = self.link.inbound.recv() => raw.ok_or_else(|| {
                    ChatError::Transport("connection closed during handshake".to_string())
                })?,
            };

            let Some(frame) = Frame::decode(&raw)? else {
                continue;
            };
            match frame.command {
                Command::Connected => {
                    log::debug!(
                        "STOMP session established (version {})",
                        frame.get("version").unwrap_or("1.0")
                    );
                    break;
                }
                Command::Error => return Err(ChatError::Transport(error_text(&frame))),
                other => log::debug!("Ignoring {other} before CONNECTED"),
            }
        }

        let room_id = self.session.room_id.clone();
        self.send_frame(Frame::subscribe(
            MESSAGE_SUBSCRIPTION,
            &message_topic(&room_id),
        ))?;
        self.send_frame(Frame::subscribe(TYPING_SUBSCRIPTION, &typing_topic(&room_id)))?;
        self.state = ConnectionState::Connected;
        Ok(())
    }

    pub fn session(&self) -> &RoomSession {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn send_frame(&self, frame: Frame) -> Result<(), ChatError> {
        log::debug!(
            "STOMP -> {} {}",
            frame.command,
            frame.get("destination").or(frame.get("id")).unwrap_or_default()
        );
        self.link
            .outbound
            .send(frame.encode())
            .map_err(|_| ChatError::TransportDrop)
    }

    fn ensure_connected(&self) -> Result<(), ChatError> {
        if self.state == ConnectionState::Connected && self.session.is_live() {
            Ok(())
        } else {
            Err(ChatError::TransportDrop)
        }
    }

    pub fn publish_message(&self, content: &str) -> Result<(), ChatError> {
        self.ensure_connected()?;
        let message = ChatMessage::outgoing(&self.session, content);
        let body =
            serde_json::to_string(&message).map_err(|err| ChatError::Protocol(err.to_string()))?;
        self.send_frame(Frame::send(
            &send_message_destination(&self.session.room_id),
            "application/json",
            body,
        ))
    }

    pub fn publish_typing(&self) -> Result<(), ChatError> {
        self.ensure_connected()?;
        self.send_frame(Frame::send(
            &typing_destination(&self.session.room_id),
            "text/plain",
            self.session.user_name.clone(),
        ))
    }

    /// Waits for the next frame worth reporting. Heart-beats, receipts and
    /// undecodable frames are skipped. Cancel safe.
    pub async fn next_inbound(&mut self) -> Inbound {
        loop {
            let Some(raw) = self.link.inbound.recv().await else {
                self.state = ConnectionState::Idle;
                return Inbound::Dropped;
            };

            match Frame::decode(&raw) {
                Ok(Some(frame)) => {
                    if let Some(inbound) = self.route(frame) {
                        return inbound;
                    }
                }
                Ok(None) => log::trace!("heart-beat"),
                Err(err) => log::warn!("Skipping malformed frame: {err}"),
            }
        }
    }

    fn route(&self, frame: Frame) -> Option<Inbound> {
        match frame.command {
            Command::Message => {
                let room_id = &self.session.room_id;
                let subscription = match frame.get("subscription") {
                    Some(id) => id.to_string(),
                    None => match frame.get("destination") {
                        Some(dest) if dest == message_topic(room_id) => {
                            MESSAGE_SUBSCRIPTION.to_string()
                        }
                        Some(dest) if dest == typing_topic(room_id) => {
                            TYPING_SUBSCRIPTION.to_string()
                        }
                        _ => String::new(),
                    },
                };

                match subscription.as_str() {
                    MESSAGE_SUBSCRIPTION => match serde_json::from_str::<ChatMessage>(&frame.body)
                    {
                        Ok(message) => Some(Inbound::Message(message)),
                        Err(err) => {
                            log::warn!("Dropping undecodable chat message: {err}");
                            None
                        }
                    },
                    TYPING_SUBSCRIPTION => Some(Inbound::Typing(frame.body.trim().to_string())),
                    other => {
                        log::debug!("MESSAGE for unknown subscription `{other}`");
                        None
                    }
                }
            }
            Command::Error => Some(Inbound::ServerError(error_text(&frame))),
            Command::Receipt => {
                log::debug!("RECEIPT {}", frame.get("receipt-id").unwrap_or_default());
                None
            }
            other => {
                log::debug!("Ignoring unexpected {other} frame");
                None
            }
        }
    }

    /// Unsubscribes both topics, says DISCONNECT and shuts the transport.
    pub fn close(mut self) {
        if self.state == ConnectionState::Connected {
            let receipt = format!("disconnect-{}", Uuid::new_v4());
            let goodbye = [
                Frame::unsubscribe(MESSAGE_SUBSCRIPTION),
                Frame::unsubscribe(TYPING_SUBSCRIPTION),
                Frame::disconnect(&receipt),
            ];
            for frame in goodbye {
                if let Err(err) = self.send_frame(frame) {
                    log::debug!("Transport already gone while closing: {err}");
                    break;
                }
            }
        }
        self.link.close.cancel();
        self.state = ConnectionState::Idle;
    }
}

impl Drop for RealtimeConnection {
    fn drop(&mut self) {
        self.link.close.cancel();
    }
}

fn error_text(frame: &Frame) -> String {
    match frame.get("message") {
        Some(message) if !message.is_empty() => message.to_string(),
        _ if !frame.body.trim().is_empty() => frame.body.trim().to_string(),
        _ => "broker sent ERROR".to_string(),
    }
}
