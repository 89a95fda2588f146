use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The single remote-procedure action this client issues.
pub const RUN_DIAGNOSTICS_ACTION: &str = "runDiagnostics";

/// Closed set of diagnostics tests the orchestrator supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticsTest {
    ArpDump,
    ClearArp,
    DnsTest,
    RestartDnsmasq,
}

impl DiagnosticsTest {
    pub const ALL: [DiagnosticsTest; 4] = [
        DiagnosticsTest::ArpDump,
        DiagnosticsTest::ClearArp,
        DiagnosticsTest::DnsTest,
        DiagnosticsTest::RestartDnsmasq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticsTest::ArpDump => "ARP_DUMP",
            DiagnosticsTest::ClearArp => "CLEAR_ARP",
            DiagnosticsTest::DnsTest => "DNS_TEST",
            DiagnosticsTest::RestartDnsmasq => "RESTART_DNSMASQ",
        }
    }
}

impl fmt::Display for DiagnosticsTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a command string does not name a supported test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTest(pub String);

impl fmt::Display for UnknownTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown diagnostics test: {}", self.0)
    }
}

impl std::error::Error for UnknownTest {}

impl FromStr for DiagnosticsTest {
    type Err = UnknownTest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARP_DUMP" => Ok(DiagnosticsTest::ArpDump),
            "CLEAR_ARP" => Ok(DiagnosticsTest::ClearArp),
            "DNS_TEST" => Ok(DiagnosticsTest::DnsTest),
            "RESTART_DNSMASQ" => Ok(DiagnosticsTest::RestartDnsmasq),
            other => Err(UnknownTest(other.to_string())),
        }
    }
}

/// Wire values for the `resformat` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseFormat {
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "HTML")]
    Html,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        ResponseFormat::Json
    }
}

/// Inner `data` object of a runDiagnostics request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    #[serde(rename = "logicalId")]
    pub logical_id: String,
    pub test: DiagnosticsTest,
    // The server distinguishes an absent key from an empty object, so empty
    // parameters are dropped from the wire entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    pub resformat: ResponseFormat,
}

/// A complete runDiagnostics request, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsRequest {
    pub action: String,
    pub data: RequestData,
    pub token: String,
}

impl DiagnosticsRequest {
    /// Builds a fresh request value. `session_token` must be the token issued
    /// by the server during the authentication handshake.
    pub fn new(
        test: DiagnosticsTest,
        parameters: Map<String, Value>,
        logical_id: impl Into<String>,
        format: ResponseFormat,
        session_token: impl Into<String>,
    ) -> Self {
        let parameters = if parameters.is_empty() {
            None
        } else {
            Some(parameters)
        };
        DiagnosticsRequest {
            action: RUN_DIAGNOSTICS_ACTION.to_string(),
            data: RequestData {
                logical_id: logical_id.into(),
                test,
                parameters,
                resformat: format,
            },
            token: session_token.into(),
        }
    }
}
