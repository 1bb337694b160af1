//! Entering a room: input validation plus the create/join calls that turn a
//! room id and user name into a connected [`RoomSession`].

use crate::common::RoomSession;
use crate::error::ChatError;
use crate::network::rest::RoomBackend;

/// Both fields must be present before anything goes over the network.
pub fn validate_input(room_id: &str, user_name: &str) -> Result<(), ChatError> {
    if room_id.trim().is_empty() || user_name.trim().is_empty() {
        return Err(ChatError::InvalidInput);
    }
    Ok(())
}

pub async fn create_room<B: RoomBackend>(
    backend: &B,
    room_id: &str,
    user_name: &str,
) -> Result<RoomSession, ChatError> {
    validate_input(room_id, user_name)?;
    let room = backend.create_room(room_id.trim()).await?;
    log::info!("Created room {} as {}", room.room_id, user_name.trim());
    Ok(RoomSession::connected(room.room_id, user_name.trim()))
}

pub async fn join_room<B: RoomBackend>(
    backend: &B,
    room_id: &str,
    user_name: &str,
) -> Result<RoomSession, ChatError> {
    validate_input(room_id, user_name)?;
    let room = backend.join_room(room_id.trim()).await?;
    log::info!("Joined room {} as {}", room.room_id, user_name.trim());
    Ok(RoomSession::connected(room.room_id, user_name.trim()))
}
