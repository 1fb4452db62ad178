//! The depot server daemon.
//!
//! Loads configuration (first CLI argument or `DEPOT_CONFIG`, otherwise
//! defaults plus environment overrides), runs the listener, and answers
//! publish requests from the terminal: each REQUEST prints a banner and
//! waits for a y/n from the operator. `--example-config` prints a
//! default configuration file and exits.

use depot_protocol::config::DepotConfig;
use depot_protocol::error::Result;
use depot_protocol::service::DepotServer;
use depot_protocol::storage::{ApprovalGate, ApprovalRequest, Decision};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "depotd failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    if std::env::args().nth(1).as_deref() == Some("--example-config") {
        print!("{}", DepotConfig::example_config());
        return Ok(());
    }

    let config = load_config()?;
    depot_protocol::logging::init(&config.logging);
    config.validate_strict()?;

    let (gate, requests) = ApprovalGate::channel(16);
    tokio::spawn(console_operator(requests));

    let server = DepotServer::bind(&config, gate).await?;
    server.run().await
}

fn load_config() -> Result<DepotConfig> {
    if let Some(path) = std::env::args().nth(1) {
        return DepotConfig::from_file(path);
    }
    if let Ok(path) = std::env::var("DEPOT_CONFIG") {
        return DepotConfig::from_file(path);
    }
    DepotConfig::from_env()
}

/// Serve publish decisions from the terminal, one at a time. Sessions
/// queue on the gate's channel; only the requesting session waits.
async fn console_operator(mut requests: mpsc::Receiver<ApprovalRequest>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(request) = requests.recv().await {
        println!();
        println!("====== Publish Approval Request ======");
        println!("User: {}", request.user());
        println!("File: {}", request.filename());
        println!("Approve publishing to the repository? (y/n): ");

        let decision = loop {
            match lines.next_line().await {
                Ok(Some(answer)) => match answer.trim() {
                    "y" | "Y" => break Decision::Approved,
                    "n" | "N" => break Decision::Denied,
                    other => println!("Please answer y or n (got {other:?})"),
                },
                // stdin gone: deny rather than leave the session hanging.
                Ok(None) | Err(_) => {
                    warn!("stdin closed, denying pending request");
                    break Decision::Denied;
                }
            }
        };

        info!(
            user = request.user(),
            file = request.filename(),
            ?decision,
            "operator decided"
        );
        request.respond(decision);
    }
}
