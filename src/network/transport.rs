use std::future::Future;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ChatError;

/// An open text transport, bridged onto channels so the dispatcher never
/// touches the socket directly.
///
/// `inbound` yields every text message in arrival order and closes when the
/// transport goes away. Cancelling `close` shuts the transport down.
#[derive(Debug)]
pub struct WsLink {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
    pub close: CancellationToken,
}

/// Opens transports. Production uses [`WebSocketConnector`]; tests plug in
/// channel-backed fakes.
pub trait Connector: Send + Sync {
    fn connect(&self, url: &Url) -> impl Future<Output = Result<WsLink, ChatError>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    async fn connect(&self, url: &Url) -> Result<WsLink, ChatError> {
        log::debug!("Connecting to websocket '{url}'...");
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        log::debug!("WebSocket handshake has been successfully completed");

        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();
        let close = CancellationToken::new();

        tokio::spawn({
            let close = close.clone();
            async move {
                loop {
                    tokio::select! {
                        () = close.cancelled() => break,
                        next = outbound_rx.recv() => match next {
                            Some(text) => {
                                log::trace!("ws -> {text:?}");
                                if let Err(err) = write.send(Message::Text(text.into())).await {
                                    log::warn!("WebSocket write failed: {err}");
                                    close.cancel();
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
                // Flush anything queued right before the close was requested.
                while let Ok(text) = outbound_rx.try_recv() {
                    if write.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                if let Err(err) = write.close().await {
                    log::debug!("WebSocket close: {err}");
                }
            }
        });

        tokio::spawn({
            let close = close.clone();
            async move {
                loop {
                    let next = tokio::select! {
                        () = close.cancelled() => break,
                        next = read.next() => next,
                    };
                    match next {
                        Some(Ok(Message::Text(text))) => {
                            log::trace!("ws <- {text:?}");
                            if inbound_tx.send(text.as_str().to_owned()).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Binary(bytes))) => {
                            match String::from_utf8(bytes.to_vec()) {
                                Ok(text) => {
                                    if inbound_tx.send(text).is_err() {
                                        break;
                                    }
                                }
                                Err(err) => log::warn!("Dropping non-UTF-8 binary frame: {err}"),
                            }
                        }
                        Some(Ok(Message::Close(reason))) => {
                            log::info!("WebSocket closed by server: {reason:?}");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            log::warn!("WebSocket read failed: {err}");
                            break;
                        }
                        None => break,
                    }
                }
                close.cancel();
            }
        });

        Ok(WsLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
            close,
        })
    }
}
