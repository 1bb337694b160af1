pub mod client;
pub mod connection;
pub mod rest;
pub mod stomp;
pub mod transport;
pub mod typing;

#[cfg(test)]
pub mod testing;

pub use client::ChatClient;
pub use rest::{RoomApi, RoomBackend};
pub use transport::{Connector, WebSocketConnector};
