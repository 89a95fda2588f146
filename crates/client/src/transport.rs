use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{
    connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// One text frame in, one text frame out. This is the seam the connection
/// and runner are tested through with a scripted peer.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send_text(&mut self, frame: String) -> Result<(), ClientError>;
    async fn recv_text(&mut self) -> Result<String, ClientError>;
    async fn close(&mut self) -> Result<(), ClientError>;
}

/// Production transport: one TLS websocket opened with the API token in the
/// handshake's Authorization header.
pub struct WssTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WssTransport {
    pub async fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let url = config.url()?;
        let mut request = url.as_str().into_client_request()?;
        let auth = HeaderValue::from_str(&format!("Token {}", config.api_token))
            .map_err(tungstenite::http::Error::from)
            .map_err(tungstenite::Error::HttpFormat)?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let connector = if config.accept_invalid_certs {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| tungstenite::Error::Tls(e.into()))?;
            Some(Connector::NativeTls(tls))
        } else {
            None
        };

        let (ws, response) = connect_async_tls_with_config(request, None, false, connector).await?;
        debug!(status = %response.status(), %url, "websocket opened");
        Ok(WssTransport { ws })
    }
}

impl Transport for WssTransport {
    async fn send_text(&mut self, frame: String) -> Result<(), ClientError> {
        self.ws.send(Message::Text(frame)).await?;
        Ok(())
    }

    async fn recv_text(&mut self) -> Result<String, ClientError> {
        loop {
            let msg = self
                .ws
                .next()
                .await
                .ok_or(ClientError::Transport(tungstenite::Error::ConnectionClosed))??;
            match msg {
                Message::Text(text) => return Ok(text),
                Message::Close(_) => {
                    return Err(ClientError::Transport(tungstenite::Error::ConnectionClosed))
                }
                // Control frames are not part of the request/response
                // exchange; keep reading.
                other => debug!(?other, "skipping non-text frame"),
            }
        }
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.ws.close(None).await?;
        Ok(())
    }
}
