// transport/errors.rs

use thiserror::Error;

/// Error types for the RPC channel
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Terminal unreachable: {0}")]
    Unreachable(String),

    #[error("Channel closed: {0}")]
    Closed(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Errors after which the channel cannot carry further calls.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Malformed(_) | TransportError::Protocol(_))
    }
}

// Convert from common error types
impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Malformed(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                TransportError::Closed(err.to_string())
            }
            WsError::Io(io) => TransportError::Unreachable(io.to_string()),
            other => TransportError::WebSocket(other.to_string()),
        }
    }
}
