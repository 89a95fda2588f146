use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};

use crate::request::DiagnosticsTest;

/// Per-test parameter, shaped at construction time so a mismatched parameter
/// key can never reach the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestParameter {
    /// ARP_DUMP: number of table entries to return.
    ArpCount(String),
    /// CLEAR_ARP: interface whose ARP cache is flushed.
    Interface(String),
    /// DNS_TEST: hostname to resolve.
    DnsName(String),
    /// RESTART_DNSMASQ takes no parameter.
    None,
}

impl TestParameter {
    /// Interprets the free-form command-line parameter for a given test.
    pub fn new(test: DiagnosticsTest, raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return TestParameter::None;
        };
        match test {
            DiagnosticsTest::ArpDump => TestParameter::ArpCount(raw.to_string()),
            DiagnosticsTest::ClearArp => TestParameter::Interface(raw.to_string()),
            DiagnosticsTest::DnsTest => TestParameter::DnsName(raw.to_string()),
            DiagnosticsTest::RestartDnsmasq => TestParameter::None,
        }
    }

    fn apply(&self, params: &mut Map<String, Value>) {
        let (key, value) = match self {
            TestParameter::ArpCount(count) => ("count", count),
            TestParameter::Interface(interface) => ("interface", interface),
            TestParameter::DnsName(name) => ("name", name),
            TestParameter::None => return,
        };
        params.insert(key.to_string(), Value::String(value.clone()));
    }
}

/// Default parameter objects keyed by test name, normally loaded from the
/// orchestrator's `runDiagnosticsDefaultParameters.json`.
#[derive(Debug, Clone, Default)]
pub struct ParamTable {
    defaults: BTreeMap<String, Map<String, Value>>,
}

impl ParamTable {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let defaults = serde_json::from_value(value)?;
        Ok(ParamTable { defaults })
    }

    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let defaults = serde_json::from_reader(file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(ParamTable { defaults })
    }

    /// Returns a fresh parameter object for `test`: the table's defaults for
    /// that test (empty when absent) with the typed parameter applied on top.
    pub fn resolve(&self, test: DiagnosticsTest, raw: Option<&str>) -> Map<String, Value> {
        let mut params = self
            .defaults
            .get(test.as_str())
            .cloned()
            .unwrap_or_default();
        TestParameter::new(test, raw).apply(&mut params);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_applies_the_typed_key() {
        let table = ParamTable::default();
        let params = table.resolve(DiagnosticsTest::ArpDump, Some("100"));
        assert_eq!(params.get("count"), Some(&json!("100")));

        let params = table.resolve(DiagnosticsTest::ClearArp, Some("GE5"));
        assert_eq!(params.get("interface"), Some(&json!("GE5")));

        let params = table.resolve(DiagnosticsTest::DnsTest, Some("example.com"));
        assert_eq!(params.get("name"), Some(&json!("example.com")));
    }

    #[test]
    fn restart_dnsmasq_resolves_to_empty() {
        let table = ParamTable::default();
        assert!(table.resolve(DiagnosticsTest::RestartDnsmasq, None).is_empty());
        // A stray parameter on a parameterless test is dropped, not sent.
        assert!(
            table
                .resolve(DiagnosticsTest::RestartDnsmasq, Some("GE5"))
                .is_empty()
        );
    }

    #[test]
    fn table_defaults_survive_an_override() {
        let table = ParamTable::from_value(json!({
            "ARP_DUMP": { "count": "10", "verbose": true }
        }))
        .unwrap();
        let params = table.resolve(DiagnosticsTest::ArpDump, Some("100"));
        assert_eq!(params.get("count"), Some(&json!("100")));
        assert_eq!(params.get("verbose"), Some(&json!(true)));

        // Each resolve starts from a fresh copy of the defaults.
        let params = table.resolve(DiagnosticsTest::ArpDump, None);
        assert_eq!(params.get("count"), Some(&json!("10")));
    }

    #[test]
    fn rejects_a_malformed_table() {
        assert!(ParamTable::from_value(json!({ "ARP_DUMP": [1, 2] })).is_err());
    }
}
