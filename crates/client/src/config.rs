use std::env;
use std::time::Duration;

use crate::error::ClientError;

/// Constant portion of the diagnostics endpoint URL.
pub const DEFAULT_URL_PATH: &str = "/ws/";

/// The one scheme the orchestrator accepts.
pub const SUPPORTED_SCHEME: &str = "wss";

/// How long to wait after sending a request before receiving the reply.
pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_secs(30);

/// Deadline on the single receive call that follows the response delay.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: Option<u16>,
    pub url_path: String,
    pub scheme: String,
    pub api_token: String,
    /// The orchestrator demo endpoints run with self-signed certificates, so
    /// verification is off by default. Flip this for anything real.
    pub accept_invalid_certs: bool,
    pub response_delay: Duration,
    pub receive_timeout: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            url_path: DEFAULT_URL_PATH.to_string(),
            scheme: SUPPORTED_SCHEME.to_string(),
            api_token: api_token.into(),
            accept_invalid_certs: true,
            response_delay: DEFAULT_RESPONSE_DELAY,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }

    /// Reads `VCO_HOST` and `VCO_API_TOKEN` (required), plus optional
    /// overrides for port, timing, and certificate checking.
    pub fn from_env() -> Result<Self, env::VarError> {
        let host = env::var("VCO_HOST")?;
        let api_token = env::var("VCO_API_TOKEN")?;
        let mut cfg = ClientConfig::new(host, api_token);

        if let Ok(v) = env::var("VCO_PORT") {
            if let Ok(p) = v.parse::<u16>() {
                cfg.port = Some(p);
            }
        }
        if let Ok(v) = env::var("EDGEDIAG_RESPONSE_DELAY_SECS") {
            if let Ok(s) = v.parse::<u64>() {
                cfg.response_delay = Duration::from_secs(s);
            }
        }
        if let Ok(v) = env::var("EDGEDIAG_RECEIVE_TIMEOUT_SECS") {
            if let Ok(s) = v.parse::<u64>() {
                cfg.receive_timeout = Duration::from_secs(s);
            }
        }
        if let Ok(v) = env::var("EDGEDIAG_VERIFY_CERTS") {
            if v == "1" || v.eq_ignore_ascii_case("true") {
                cfg.accept_invalid_certs = false;
            }
        }

        Ok(cfg)
    }

    /// Composes the full endpoint URL, rejecting unsupported schemes before
    /// any network activity happens.
    pub fn url(&self) -> Result<String, ClientError> {
        if self.scheme != SUPPORTED_SCHEME {
            return Err(ClientError::UnsupportedProtocol(self.scheme.clone()));
        }
        let authority = match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        };
        Ok(format!("{}://{}{}", self.scheme, authority, self.url_path))
    }
}
