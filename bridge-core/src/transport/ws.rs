// transport/ws.rs
// ====
// WebSocket RPC channel
// One request in flight at a time; the connection handle serializes calls.
// ====

use crate::transport::endpoint::Endpoint;
use crate::transport::errors::TransportError;
use crate::transport::traits::{Dialer, RpcChannel};
use crate::transport::wire::{RequestFrame, ResponseFrame};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

const PING_PAYLOAD: &[u8] = b"bridge-health";

pub struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    peer: String,
}

impl WsChannel {
    pub fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>, peer: impl Into<String>) -> Self {
        Self {
            stream,
            peer: peer.into(),
        }
    }

    /// Next data frame, answering server pings on the way.
    async fn next_text(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(bin))) => {
                    let text = String::from_utf8(bin)
                        .map_err(|e| TransportError::Malformed(e.to_string()))?;
                    return Ok(Some(text));
                }
                Some(Ok(Message::Ping(payload))) => {
                    // Server -> Client Ping: respond with Pong
                    self.stream.send(Message::Pong(payload)).await?;
                }
                Some(Ok(Message::Pong(payload))) => {
                    if payload == PING_PAYLOAD {
                        return Ok(None);
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "close frame".to_string());
                    return Err(TransportError::Closed(reason));
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Err(TransportError::Closed("stream ended".into())),
            }
        }
    }
}

#[async_trait]
impl RpcChannel for WsChannel {
    async fn round_trip(&mut self, request: &RequestFrame) -> Result<ResponseFrame, TransportError> {
        let payload = serde_json::to_string(request)?;
        self.stream.send(Message::Text(payload)).await?;

        loop {
            let Some(text) = self.next_text().await? else {
                continue;
            };
            let response: ResponseFrame = serde_json::from_str(&text)?;
            if response.id < request.id {
                // Late answer to a call that already timed out.
                debug!(stale = response.id, current = request.id, "discarding stale response");
                continue;
            }
            if response.id > request.id {
                return Err(TransportError::Protocol(format!(
                    "response id {} ahead of request id {}",
                    response.id, request.id
                )));
            }
            return Ok(response);
        }
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.stream.send(Message::Ping(PING_PAYLOAD.to_vec())).await?;
        loop {
            if self.next_text().await?.is_none() {
                return Ok(());
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Ok(()) => {
                info!(peer = %self.peer, "WS channel closed");
                Ok(())
            }
            Err(tokio_tungstenite::tungstenite::Error::AlreadyClosed)
            | Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Dials `ws://host:port`.
#[derive(Debug, Clone, Default)]
pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> Result<Box<dyn RpcChannel>, TransportError> {
        let url = endpoint
            .to_url()
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let (stream, _) = match tokio::time::timeout(timeout, connect_async(url.as_str())).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                warn!(%endpoint, error = %e, "WS connect failed");
                return Err(TransportError::Unreachable(e.to_string()));
            }
            Err(_) => {
                warn!(%endpoint, ?timeout, "WS connect timed out");
                return Err(TransportError::Unreachable(format!(
                    "connect to {} timed out after {:?}",
                    endpoint, timeout
                )));
            }
        };
        info!(%endpoint, "WS channel established");
        Ok(Box::new(WsChannel::new(stream, endpoint.to_string())))
    }
}
