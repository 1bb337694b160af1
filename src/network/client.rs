use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::common::{ConnectionId, NetworkCommand, NetworkEvent, RealtimeEvent, RoomSession};
use crate::config::AppConfig;
use crate::error::ChatError;
use crate::session;

use super::connection::{Inbound, RealtimeConnection};
use super::rest::RoomBackend;
use super::transport::Connector;
use super::typing::TypingTracker;

struct ActiveConnection {
    id: ConnectionId,
    cancel: CancellationToken,
    connection: RealtimeConnection,
}

enum ActiveSignal {
    Inbound(Inbound),
    Cancelled,
}

/// The network task: one dispatcher that owns the REST backend, the single
/// live realtime connection and the typing timer, and serializes everything
/// that happens to them.
pub struct ChatClient<B, C> {
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
    backend: B,
    connector: C,
    websocket_url: Url,
    typing: TypingTracker,
    typing_throttle: Duration,
    last_typing_sent: Option<Instant>,
    active: Option<ActiveConnection>,
}

impl<B: RoomBackend, C: Connector> ChatClient<B, C> {
    pub fn new(
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
        backend: B,
        connector: C,
        config: &AppConfig,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            event_sender,
            command_receiver,
            backend,
            connector,
            websocket_url: config.websocket_url()?,
            typing: TypingTracker::new(config.typing_expiry()),
            typing_throttle: config.typing_throttle(),
            last_typing_sent: None,
            active: None,
        })
    }

    pub async fn run(mut self) {
        log::info!("Network event loop started ({})", self.websocket_url);

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
                signal = next_signal(&mut self.active) => {
                    self.handle_signal(signal).await;
                }
                expired = self.typing.expired() => {
                    log::debug!("{} stopped typing", expired.sender_name);
                    if let Some(id) = self.active.as_ref().map(|active| active.id) {
                        self.emit(id, RealtimeEvent::TypingCleared).await;
                    }
                }
            }
        }

        self.teardown("command channel closed").await;
        log::info!("Network event loop stopped");
    }

    async fn handle_command(&mut self, command: NetworkCommand) {
        match command {
            NetworkCommand::CreateRoom { room_id, user_name } => {
                let event = match session::create_room(&self.backend, &room_id, &user_name).await {
                    Ok(session) => NetworkEvent::RoomCreated(session),
                    Err(err) => {
                        log::warn!("Create room {room_id} failed: {err}");
                        NetworkEvent::RoomRejected(err)
                    }
                };
                self.send_event(event).await;
            }
            NetworkCommand::JoinRoom { room_id, user_name } => {
                let event = match session::join_room(&self.backend, &room_id, &user_name).await {
                    Ok(session) => NetworkEvent::RoomJoined(session),
                    Err(err) => {
                        log::warn!("Join room {room_id} failed: {err}");
                        NetworkEvent::RoomRejected(err)
                    }
                };
                self.send_event(event).await;
            }
            NetworkCommand::Connect {
                id,
                session,
                cancel,
            } => self.connect(id, session, cancel).await,
            NetworkCommand::SendMessage(content) => self.send_message(&content),
            NetworkCommand::SendTyping => self.send_typing(),
            NetworkCommand::Disconnect => self.teardown("logout").await,
        }
    }

    async fn connect(&mut self, id: ConnectionId, session: RoomSession, cancel: CancellationToken) {
        // Never two subscription pairs at once.
        self.teardown("replaced by a new connection").await;

        if !session.is_live() {
            log::warn!("Refusing to connect {id} without a live session");
            self.emit(id, RealtimeEvent::Failed(ChatError::InvalidInput))
                .await;
            return;
        }

        log::info!(
            "Connecting {id} to room {} as {}",
            session.room_id,
            session.user_name
        );

        let history = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.emit(id, RealtimeEvent::Closed).await;
                return;
            }
            history = self.backend.load_messages(&session.room_id) => history,
        };
        let history = history.unwrap_or_else(|err| {
            log::warn!("{err}; starting room {} with empty history", session.room_id);
            Vec::new()
        });
        self.emit(id, RealtimeEvent::History(history)).await;

        match RealtimeConnection::open(&self.connector, &self.websocket_url, session, &cancel).await
        {
            Ok(connection) => {
                log::info!("Realtime connection {id} established");
                self.active = Some(ActiveConnection {
                    id,
                    cancel,
                    connection,
                });
                self.emit(id, RealtimeEvent::Connected).await;
            }
            Err(ChatError::Cancelled) => {
                log::info!("Connection {id} cancelled before it was established");
                self.emit(id, RealtimeEvent::Closed).await;
            }
            Err(err) => {
                log::warn!("Connection {id} failed: {err}");
                self.emit(id, RealtimeEvent::Failed(err)).await;
            }
        }
    }

    fn send_message(&mut self, content: &str) {
        if content.trim().is_empty() {
            return;
        }
        let Some(active) = &self.active else {
            log::warn!("Dropping message: not connected");
            return;
        };
        if let Err(err) = active.connection.publish_message(content) {
            log::warn!("Failed to publish message on {}: {err}", active.id);
        }
    }

    fn send_typing(&mut self) {
        let Some(active) = &self.active else {
            return;
        };

        if !self.typing_throttle.is_zero() {
            let now = Instant::now();
            if let Some(last) = self.last_typing_sent {
                if now.duration_since(last) < self.typing_throttle {
                    return;
                }
            }
            self.last_typing_sent = Some(now);
        }

        if let Err(err) = active.connection.publish_typing() {
            log::warn!("Failed to publish typing status on {}: {err}", active.id);
        }
    }

    async fn handle_signal(&mut self, signal: ActiveSignal) {
        let Some(active) = &self.active else {
            return;
        };
        let id = active.id;

        match signal {
            ActiveSignal::Cancelled => self.teardown("closed by the UI").await,
            ActiveSignal::Inbound(Inbound::Message(message)) => {
                log::debug!("{id}: message from {}", message.sender);
                self.emit(id, RealtimeEvent::MessageReceived(message)).await;
            }
            ActiveSignal::Inbound(Inbound::Typing(sender)) => {
                let current_user = active.connection.session().user_name.clone();
                if let Some(signal) = self.typing.observe(&sender, &current_user) {
                    self.emit(id, RealtimeEvent::Typing(signal.sender_name)).await;
                }
            }
            ActiveSignal::Inbound(Inbound::ServerError(message)) => {
                log::warn!("{id}: broker error: {message}");
                self.emit(id, RealtimeEvent::ServerError(message)).await;
            }
            ActiveSignal::Inbound(Inbound::Dropped) => {
                log::warn!("{id}: transport dropped; not reconnecting");
                self.active = None;
                self.typing.clear();
                self.last_typing_sent = None;
                self.emit(id, RealtimeEvent::Dropped).await;
            }
        }
    }

    /// Closes the live connection, if any, and forgets the typing state.
    async fn teardown(&mut self, reason: &str) {
        self.typing.clear();
        self.last_typing_sent = None;

        let Some(active) = self.active.take() else {
            return;
        };
        log::info!("Closing connection {}: {reason}", active.id);
        active.cancel.cancel();
        active.connection.close();
        self.emit(active.id, RealtimeEvent::Closed).await;
    }

    async fn emit(&mut self, id: ConnectionId, event: RealtimeEvent) {
        self.send_event(NetworkEvent::Realtime { id, event }).await;
    }

    async fn send_event(&mut self, event: NetworkEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::debug!("UI is gone, dropping event: {err}");
        }
    }
}

async fn next_signal(active: &mut Option<ActiveConnection>) -> ActiveSignal {
    let Some(active) = active.as_mut() else {
        return std::future::pending().await;
    };

    tokio::select! {
        biased;
        () = active.cancel.cancelled() => ActiveSignal::Cancelled,
        inbound = active.connection.next_inbound() => ActiveSignal::Inbound(inbound),
    }
}
