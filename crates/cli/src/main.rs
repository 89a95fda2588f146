use std::io::Write as _;
use std::str::FromStr;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use edgediag_client::{ClientConfig, Connection, DiagnosticsRunner};
use edgediag_core::{DiagnosticsTest, ParamTable};

/// Optional table of per-test default parameters, orchestrator format.
const PARAMS_FILE: &str = "runDiagnosticsDefaultParameters.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = ClientConfig::from_env()
        .context("VCO_HOST and VCO_API_TOKEN must be set in the environment")?;

    let params = match ParamTable::from_path(PARAMS_FILE) {
        Ok(table) => table,
        Err(e) => {
            info!(error = %e, "no default parameter table; starting with empty defaults");
            ParamTable::default()
        }
    };
    let runner = DiagnosticsRunner::new(params).with_timing(&config);

    let mut conn = Connection::connect(&config).await?;

    println!("Remote Diagnostics websocket client demo.");
    println!(
        "Commands: ARP_DUMP|CLEAR_ARP|DNS_TEST|RESTART_DNSMASQ <logicalId> [param], EXIT to quit."
    );
    println!("e.g. `ARP_DUMP edge-42 100`, `CLEAR_ARP edge-42 GE5`, `RESTART_DNSMASQ edge-42`.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            continue;
        };
        let cmd = cmd.to_uppercase();
        if cmd == "EXIT" {
            break;
        }

        let test = match DiagnosticsTest::from_str(&cmd) {
            Ok(test) => test,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        let Some(logical_id) = words.next() else {
            println!("usage: {cmd} <logicalId> [param]");
            continue;
        };
        let param = words.next();

        // A failed test ends the command, never the session.
        match runner.run_test(&mut conn, test, param, logical_id).await {
            Ok(response) => {
                println!("Received response:");
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            Err(e) => error!(error = %e, "diagnostics test failed"),
        }
    }

    if let Err(e) = conn.close().await {
        warn!(error = %e, "error while closing the websocket");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,tungstenite=warn"))
        .unwrap();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
