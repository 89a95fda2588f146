use std::io;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The only transport this client speaks is `wss`.
    #[error("not supported protocol {0}")]
    UnsupportedProtocol(String),

    /// The authentication handshake did not yield a session token.
    #[error("websocket authentication failed: {0}")]
    Handshake(String),

    /// A send/receive/close failure on a broken or closed socket. Never
    /// retried; propagates to the caller as-is.
    #[error(transparent)]
    Transport(#[from] tungstenite::Error),

    #[error("failed to encode {operation} request")]
    Encode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The server replied, but not with JSON. Distinct from [`Transport`]
    /// so callers can tell garbage replies from a broken socket.
    ///
    /// [`Transport`]: ClientError::Transport
    #[error("received invalid JSON response for {operation}")]
    InvalidResponse {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub(crate) fn receive_timeout(operation: &'static str) -> Self {
        ClientError::Transport(tungstenite::Error::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("timed out waiting for {operation} response"),
        )))
    }
}
