use thiserror::Error;

/// Every failure the client can run into. None of them are fatal: the UI
/// turns them into a toast or an empty state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Room id and user name are both required")]
    InvalidInput,
    #[error("Room already exists")]
    RoomExists,
    #[error("{0}")]
    RoomNotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Failed to load history: {0}")]
    HistoryLoad(String),
    #[error("Realtime connection failed: {0}")]
    Transport(String),
    #[error("Realtime connection dropped")]
    TransportDrop,
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<url::ParseError> for ChatError {
    fn from(err: url::ParseError) -> Self {
        Self::Network(format!("invalid backend url: {err}"))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ChatError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
