//! Opening the underlying channel.
//!
//! A [`Connector`] turns a URL into a [`Channel`]: a pair of text-frame
//! queues. The transport never sees the socket itself, which keeps the
//! reconnect state machine testable without a server.

use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tracing::{debug, warn};

use crate::error::TransportError;

/// An open duplex channel of text frames.
///
/// Dropping `outbound` closes the channel from our side. `inbound` yields
/// `None` once the peer is gone.
#[derive(Debug)]
pub struct Channel {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

impl Channel {
    /// Build a connected pair: the channel for the transport, and the
    /// peer end (what the transport sends, and a way to push frames in).
    pub fn pair() -> (
        Channel,
        (mpsc::UnboundedReceiver<String>, mpsc::UnboundedSender<String>),
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        (
            Channel {
                outbound: out_tx,
                inbound: in_rx,
            },
            (out_rx, in_tx),
        )
    }
}

pub trait Connector: Send + Sync {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Channel, TransportError>>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Channel, TransportError>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(TransportError::from_tungstenite)?;
            let (mut ws_write, mut ws_read) = ws_stream.split();
            let (channel, (mut outbound, inbound)) = Channel::pair();

            // Writer: transport -> socket. Ends when the transport drops its sender.
            tokio::spawn(async move {
                while let Some(text) = outbound.recv().await {
                    if let Err(e) = ws_write.send(tungstenite::Message::Text(text.into())).await {
                        warn!(error = %e, "websocket write failed");
                        break;
                    }
                }
                let _ = ws_write.close().await;
            });

            // Reader: socket -> transport. Ends on close, error, or when the
            // transport stops listening.
            tokio::spawn(async move {
                while let Some(msg) = ws_read.next().await {
                    match msg {
                        Ok(tungstenite::Message::Text(text)) => {
                            if inbound.send(text.as_str().to_owned()).is_err() {
                                break;
                            }
                        }
                        Ok(tungstenite::Message::Close(frame)) => {
                            debug!(?frame, "websocket closed by peer");
                            break;
                        }
                        Ok(tungstenite::Message::Binary(bytes)) => {
                            debug!(len = bytes.len(), "ignoring binary frame");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "websocket read failed");
                            break;
                        }
                    }
                }
            });

            Ok(channel)
        })
    }
}
