use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{Transport, WssTransport};

/// Owns exactly one authenticated websocket and exposes blocking-style send
/// and receive primitives. No reconnection, no heartbeat, no multiplexing:
/// one socket, one in-flight request at a time.
pub struct Connection<T> {
    transport: T,
    session_token: Option<String>,
    default_headers: HashMap<String, String>,
    total_api_calls: u64,
}

impl Connection<WssTransport> {
    /// Opens the socket described by `config` and immediately runs the
    /// authentication handshake.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        info!(host = %config.host, "connecting to the diagnostics API");
        let transport = WssTransport::open(config).await?;
        let mut conn = Connection::from_transport(transport);
        conn.authenticate().await?;
        Ok(conn)
    }
}

impl<T: Transport> Connection<T> {
    /// Wraps an already-open transport without authenticating it.
    pub fn from_transport(transport: T) -> Self {
        Connection {
            transport,
            session_token: None,
            default_headers: HashMap::new(),
            total_api_calls: 0,
        }
    }

    /// Consumes the server's post-connect no-op message and stores the
    /// session token it carries. On failure the session token stays unset.
    pub async fn authenticate(&mut self) -> Result<(), ClientError> {
        info!("authenticating websocket connection");
        let frame = self.transport.recv_text().await?;
        let noop: Value = serde_json::from_str(&frame)
            .map_err(|e| ClientError::Handshake(format!("handshake reply is not valid JSON: {e}")))?;
        let token = noop
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Handshake("handshake reply has no token field".to_string()))?;
        self.session_token = Some(token.to_string());
        Ok(())
    }

    /// Session token issued during the handshake, if authentication has
    /// completed.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn total_api_calls(&self) -> u64 {
        self.total_api_calls
    }

    pub fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    #[cfg(test)]
    pub(crate) fn transport_ref(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Merges `headers` into the default header map. Existing keys are
    /// overwritten, unrelated keys kept.
    pub fn set_default_headers(&mut self, headers: HashMap<String, String>) {
        self.default_headers.extend(headers);
    }

    /// Writes a single text frame. A failure on a closed or broken socket
    /// propagates as a transport error; there is no retry.
    pub async fn send_message(&mut self, message: String) -> Result<(), ClientError> {
        debug!("sending websocket message");
        self.transport.send_text(message).await?;
        self.total_api_calls += 1;
        Ok(())
    }

    /// Reads a single text frame. Timing is the caller's business; no
    /// deadline is applied at this layer.
    pub async fn receive_message(&mut self) -> Result<String, ClientError> {
        debug!("receiving websocket message");
        self.transport.recv_text().await
    }

    /// Closes the socket. Not idempotent: closing twice, or sending after
    /// close, surfaces as a transport error.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        info!("closing websocket connection");
        self.transport.close().await
    }
}

/// Convenience alias for closing an externally supplied connection, kept for
/// symmetry with [`Connection::connect`].
pub async fn disconnect<T: Transport>(connection: &mut Connection<T>) -> Result<(), ClientError> {
    info!("disconnecting from the API client");
    connection.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    #[tokio::test]
    async fn authenticate_stores_the_session_token() {
        let transport = MockTransport::scripted([r#"{"token":"sess-1"}"#]);
        let mut conn = Connection::from_transport(transport);
        conn.authenticate().await.unwrap();
        assert_eq!(conn.session_token(), Some("sess-1"));
    }

    #[tokio::test]
    async fn handshake_without_token_field_fails() {
        let transport = MockTransport::scripted([r#"{"noop":true}"#]);
        let mut conn = Connection::from_transport(transport);
        let err = conn.authenticate().await.unwrap_err();
        assert!(matches!(err, ClientError::Handshake(_)));
        assert_eq!(conn.session_token(), None);
    }

    #[tokio::test]
    async fn handshake_with_garbage_fails() {
        let transport = MockTransport::scripted(["hello there"]);
        let mut conn = Connection::from_transport(transport);
        let err = conn.authenticate().await.unwrap_err();
        assert!(matches!(err, ClientError::Handshake(_)));
        assert_eq!(conn.session_token(), None);
    }

    #[tokio::test]
    async fn send_counts_api_calls() {
        let transport = MockTransport::scripted([r#"{"token":"sess-1"}"#]);
        let mut conn = Connection::from_transport(transport);
        conn.authenticate().await.unwrap();
        assert_eq!(conn.total_api_calls(), 0);
        conn.send_message("{}".to_string()).await.unwrap();
        conn.send_message("{}".to_string()).await.unwrap();
        assert_eq!(conn.total_api_calls(), 2);
    }

    #[tokio::test]
    async fn default_headers_merge_rather_than_replace() {
        let transport = MockTransport::scripted([]);
        let mut conn = Connection::from_transport(transport);
        conn.set_default_headers(HashMap::from([
            ("x-a".to_string(), "1".to_string()),
            ("x-b".to_string(), "2".to_string()),
        ]));
        conn.set_default_headers(HashMap::from([("x-b".to_string(), "3".to_string())]));
        assert_eq!(conn.default_headers().get("x-a"), Some(&"1".to_string()));
        assert_eq!(conn.default_headers().get("x-b"), Some(&"3".to_string()));
    }
}
