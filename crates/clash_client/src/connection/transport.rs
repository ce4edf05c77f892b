//! Transport seam between the connection manager and the network.
//!
//! A [`Connector`] performs the authenticated handshake and hands back a
//! [`Link`]: a pair of channels feeding and draining the socket. The manager
//! never touches the socket directly, which keeps it testable without a
//! server.

use crate::error::ClientError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::fmt::Debug;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Frames travelling from the client to the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Frame(String),
    Close,
}

/// Frames travelling from the socket to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Frame(String),
    /// The socket is gone; carries the reason. Always the last item.
    Closed(String),
}

/// An open, authenticated connection.
#[derive(Debug)]
pub struct Link {
    pub outbound: mpsc::UnboundedSender<Outbound>,
    pub inbound: mpsc::UnboundedReceiver<Inbound>,
}

/// Opens authenticated real-time connections.
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    async fn open(&self, url: &str, token: &str) -> Result<Link, ClientError>;
}

/// [`Connector`] over a WebSocket using `tokio-tungstenite`.
///
/// The token travels as an `Authorization: Bearer` header and as a `token`
/// query parameter, since browsers' socket clients can only use the latter.
#[derive(Debug, Default, Clone)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn url_with_token(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}token={}", urlencoding::encode(token))
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, url: &str, token: &str) -> Result<Link, ClientError> {
        let mut request = url_with_token(url, token)
            .into_client_request()
            .map_err(|e| ClientError::Handshake(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| ClientError::Handshake(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (ws_stream, response) = connect_async(request)
            .await
            .map_err(|e| ClientError::Handshake(e.to_string()))?;
        info!("🔗 WebSocket handshake with {} completed ({})", url, response.status());

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<Inbound>();

        tokio::spawn(async move {
            while let Some(outbound) = outbound_rx.recv().await {
                match outbound {
                    Outbound::Frame(frame) => {
                        if let Err(e) = ws_sender.send(Message::text(frame)).await {
                            warn!("⚠️ Failed to send frame: {}", e);
                            break;
                        }
                    }
                    Outbound::Close => {
                        let _ = ws_sender.send(Message::Close(None)).await;
                        let _ = ws_sender.close().await;
                        break;
                    }
                }
            }
            debug!("Writer task finished");
        });

        tokio::spawn(async move {
            let reason = loop {
                match ws_receiver.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if inbound_tx.send(Inbound::Frame(text.to_string())).is_err() {
                            break "client dropped the connection".to_string();
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => {
                            if inbound_tx.send(Inbound::Frame(text)).is_err() {
                                break "client dropped the connection".to_string();
                            }
                        }
                        Err(_) => warn!("📦 Dropping non UTF-8 binary frame ({} bytes)", bytes.len()),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        break frame
                            .map(|frame| frame.reason.to_string())
                            .filter(|reason| !reason.is_empty())
                            .unwrap_or_else(|| "closed by server".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break e.to_string(),
                    None => break "stream ended".to_string(),
                }
            };
            let _ = inbound_tx.send(Inbound::Closed(reason));
        });

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
