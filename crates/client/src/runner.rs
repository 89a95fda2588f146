use serde_json::{Map, Value};
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use edgediag_core::{DiagnosticsRequest, DiagnosticsTest, ParamTable, ResponseFormat};

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::transport::Transport;

const OPERATION: &str = "run Diagnostics";

/// Builds runDiagnostics requests and drives the send / wait / receive
/// exchange over an authenticated [`Connection`].
pub struct DiagnosticsRunner {
    params: ParamTable,
    pub response_delay: std::time::Duration,
    pub receive_timeout: std::time::Duration,
}

impl DiagnosticsRunner {
    pub fn new(params: ParamTable) -> Self {
        DiagnosticsRunner {
            params,
            response_delay: crate::config::DEFAULT_RESPONSE_DELAY,
            receive_timeout: crate::config::DEFAULT_RECEIVE_TIMEOUT,
        }
    }

    /// Takes delay and deadline settings from a client config.
    pub fn with_timing(mut self, config: &ClientConfig) -> Self {
        self.response_delay = config.response_delay;
        self.receive_timeout = config.receive_timeout;
        self
    }

    /// Default parameters for `test` with the free-form parameter applied.
    pub fn test_parameters(&self, test: DiagnosticsTest, raw: Option<&str>) -> Map<String, Value> {
        self.params.resolve(test, raw)
    }

    /// Assembles a complete request stamped with the connection's current
    /// session token. Requests cannot be built before authentication.
    pub fn build_request<T: Transport>(
        &self,
        conn: &Connection<T>,
        test: DiagnosticsTest,
        raw: Option<&str>,
        logical_id: &str,
        html: bool,
    ) -> Result<DiagnosticsRequest, ClientError> {
        let token = conn.session_token().ok_or_else(|| {
            ClientError::Handshake("connection has no session token yet".to_string())
        })?;
        let format = if html {
            ResponseFormat::Html
        } else {
            ResponseFormat::Json
        };
        Ok(DiagnosticsRequest::new(
            test,
            self.params.resolve(test, raw),
            logical_id,
            format,
            token,
        ))
    }

    /// Sends the request, waits the fixed response delay, then issues exactly
    /// one receive bounded by the configured deadline.
    pub async fn execute<T: Transport>(
        &self,
        conn: &mut Connection<T>,
        request: &DiagnosticsRequest,
    ) -> Result<Value, ClientError> {
        let frame = serde_json::to_string(request).map_err(|e| ClientError::Encode {
            operation: OPERATION,
            source: e,
        })?;
        conn.send_message(frame).await?;

        debug!(delay = ?self.response_delay, "waiting before receiving diagnostics response");
        sleep(self.response_delay).await;

        let reply = timeout(self.receive_timeout, conn.receive_message())
            .await
            .map_err(|_| ClientError::receive_timeout(OPERATION))??;
        serde_json::from_str(&reply).map_err(|e| ClientError::InvalidResponse {
            operation: OPERATION,
            source: e,
        })
    }

    /// Builds and executes a test in one go.
    pub async fn run_test<T: Transport>(
        &self,
        conn: &mut Connection<T>,
        test: DiagnosticsTest,
        raw: Option<&str>,
        logical_id: &str,
    ) -> Result<Value, ClientError> {
        info!(test = %test, logical_id, "running diagnostics test");
        let request = self.build_request(conn, test, raw, logical_id, false)?;
        self.execute(conn, &request).await
    }
}
