use std::future::Future;

use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

use crate::common::{ChatMessage, Room};
use crate::config::AppConfig;
use crate::error::ChatError;

/// The backend's room endpoints.
pub trait RoomBackend: Send + Sync {
    fn create_room(&self, room_id: &str) -> impl Future<Output = Result<Room, ChatError>> + Send;

    fn join_room(&self, room_id: &str) -> impl Future<Output = Result<Room, ChatError>> + Send;

    fn load_messages(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, ChatError>> + Send;
}

#[derive(Serialize)]
struct RoomRequest<'a> {
    #[serde(rename = "roomId")]
    room_id: &'a str,
}

/// HTTP client for the room endpoints.
#[derive(Debug, Clone)]
pub struct RoomApi {
    http: reqwest::Client,
    base: Url,
}

impl RoomApi {
    pub fn new(config: &AppConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base: config.backend_base()?,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ChatError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ChatError::Network(format!("{} cannot be a base url", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_room(&self, path: &str, room_id: &str) -> Result<reqwest::Response, ChatError> {
        let url = self.endpoint(&[path])?;
        log::debug!("POST {url} roomId={room_id}");
        Ok(self
            .http
            .post(url)
            .json(&RoomRequest { room_id })
            .send()
            .await?)
    }
}

impl RoomBackend for RoomApi {
    async fn create_room(&self, room_id: &str) -> Result<Room, ChatError> {
        let response = self.post_room("create-room", room_id).await?;
        match response.status() {
            status if status.is_success() => Ok(response.json::<Room>().await?),
            StatusCode::BAD_REQUEST => Err(ChatError::RoomExists),
            status => Err(ChatError::Network(format!("create-room returned {status}"))),
        }
    }

    async fn join_room(&self, room_id: &str) -> Result<Room, ChatError> {
        let response = self.post_room("join-room", room_id).await?;
        match response.status() {
            status if status.is_success() => Ok(response.json::<Room>().await?),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                let message = if body.trim().is_empty() {
                    format!("Room {room_id} not found")
                } else {
                    body.trim().to_string()
                };
                Err(ChatError::RoomNotFound(message))
            }
            status => Err(ChatError::Network(format!("join-room returned {status}"))),
        }
    }

    async fn load_messages(&self, room_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let url = self.endpoint(&["messages", room_id])?;
        log::debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ChatError::HistoryLoad(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::HistoryLoad(format!(
                "messages returned {}",
                response.status()
            )));
        }

        response
            .json::<Vec<ChatMessage>>()
            .await
            .map_err(|err| ChatError::HistoryLoad(err.to_string()))
    }
}
