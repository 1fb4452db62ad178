//! End-to-end session scenarios over real TCP.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use depot_protocol::config::{DepotConfig, StorageConfig};
use depot_protocol::error::DepotError;
use depot_protocol::service::{DepotClient, DepotServer};
use depot_protocol::storage::{ApprovalGate, ApprovalRequest, Decision};
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Bring up a server on an ephemeral port with a fresh storage root.
/// The TempDir must stay alive for the duration of the test.
async fn spawn_server(gate: ApprovalGate) -> (SocketAddr, TempDir, mpsc::Sender<()>) {
    let tmp = TempDir::new().expect("tempdir");
    let config = DepotConfig::default_with_overrides(|c| {
        c.server.address = "127.0.0.1:0".to_string();
        c.storage = StorageConfig::under_root(tmp.path());
    });

    let server = DepotServer::bind(&config, gate).await.expect("bind");
    let addr = server.local_addr().expect("addr");

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(server.run_with_shutdown(shutdown_rx));

    (addr, tmp, shutdown_tx)
}

async fn login(addr: SocketAddr, user: &str, pass: &str) -> DepotClient {
    let mut client = DepotClient::connect(addr).await.expect("connect");
    client.login(user, pass).await.expect("login");
    client
}

#[tokio::test]
async fn upload_approve_download_roundtrip_is_byte_identical() {
    let (addr, _tmp, _shutdown) = spawn_server(ApprovalGate::auto(Decision::Approved)).await;
    let mut client = login(addr, "cl1", "cl1pass").await;

    // Binary content spanning several transfer chunks.
    let content: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();

    let reply = client.put("blob.bin", &content).await.unwrap();
    assert_eq!(reply, "OK uploaded (pending admin approval)");

    assert_eq!(client.request_publish("blob.bin").await.unwrap(), "APPROVED");
    assert_eq!(client.get("blob.bin").await.unwrap(), content);

    client.exit().await.unwrap();
}

#[tokio::test]
async fn empty_file_roundtrips() {
    let (addr, _tmp, _shutdown) = spawn_server(ApprovalGate::auto(Decision::Approved)).await;
    let mut client = login(addr, "cl1", "cl1pass").await;

    client.put("empty.txt", b"").await.unwrap();
    assert_eq!(client.request_publish("empty.txt").await.unwrap(), "APPROVED");
    assert_eq!(client.get("empty.txt").await.unwrap(), b"");

    client.exit().await.unwrap();
}

#[tokio::test]
async fn wrong_password_gets_auth_fail_and_a_dead_connection() {
    let (addr, _tmp, _shutdown) = spawn_server(ApprovalGate::auto(Decision::Denied)).await;

    let mut client = DepotClient::connect(addr).await.unwrap();
    assert!(matches!(
        client.login("bob", "wrongpass").await,
        Err(DepotError::AuthFailed)
    ));

    // The server tears the connection down; nothing further is answered.
    let _ = client.send_raw_line("LIST").await;
    assert!(client.recv_raw_line().await.is_err());
}

#[tokio::test]
async fn pending_upload_is_invisible_until_approved() {
    let (addr, _tmp, _shutdown) = spawn_server(ApprovalGate::auto(Decision::Approved)).await;
    let mut client = login(addr, "cl1", "cl1pass").await;

    client.put("report.txt", b"hello").await.unwrap();

    // Not listed, not downloadable, while quarantined.
    assert!(client.list().await.unwrap().is_empty());
    assert!(client.get("report.txt").await.is_err());

    client.request_publish("report.txt").await.unwrap();
    assert_eq!(client.list().await.unwrap(), vec!["report.txt"]);
    assert_eq!(client.get("report.txt").await.unwrap(), b"hello");

    client.exit().await.unwrap();
}

#[tokio::test]
async fn denial_keeps_the_file_requestable_until_approved() {
    // Operator script: deny twice, then approve.
    let (gate, mut rx) = ApprovalGate::channel(4);
    tokio::spawn(async move {
        let verdicts = [Decision::Denied, Decision::Denied, Decision::Approved];
        for verdict in verdicts {
            let req: ApprovalRequest = rx.recv().await.expect("request");
            req.respond(verdict);
        }
    });

    let (addr, _tmp, _shutdown) = spawn_server(gate).await;
    let mut client = login(addr, "cl2", "cl2pass").await;

    client.put("draft.txt", b"v1").await.unwrap();

    assert_eq!(client.request_publish("draft.txt").await.unwrap(), "DENIED");
    assert_eq!(client.request_publish("draft.txt").await.unwrap(), "DENIED");
    assert_eq!(client.request_publish("draft.txt").await.unwrap(), "APPROVED");

    assert_eq!(client.get("draft.txt").await.unwrap(), b"v1");
    client.exit().await.unwrap();
}

#[tokio::test]
async fn two_users_can_quarantine_the_same_filename() {
    let (addr, _tmp, _shutdown) = spawn_server(ApprovalGate::auto(Decision::Approved)).await;

    let mut alice = login(addr, "cl1", "cl1pass").await;
    let mut bob = login(addr, "cl2", "cl2pass").await;

    alice.put("same.txt", b"from cl1").await.unwrap();
    bob.put("same.txt", b"from cl2").await.unwrap();

    // Publishing one does not consume the other's quarantined copy.
    assert_eq!(alice.request_publish("same.txt").await.unwrap(), "APPROVED");
    assert_eq!(bob.request_publish("same.txt").await.unwrap(), "APPROVED");

    // Last publish wins in the flat repository namespace.
    assert_eq!(alice.get("same.txt").await.unwrap(), b"from cl2");

    alice.exit().await.unwrap();
    bob.exit().await.unwrap();
}

#[tokio::test]
async fn request_for_a_never_uploaded_file_reports_not_found() {
    let (addr, _tmp, _shutdown) = spawn_server(ApprovalGate::auto(Decision::Approved)).await;
    let mut client = login(addr, "cl3", "cl3pass").await;

    let reply = client.request_publish("ghost.txt").await.unwrap();
    assert_eq!(reply, "ERR no such file");

    client.exit().await.unwrap();
}

#[tokio::test]
async fn server_drains_and_stops_on_shutdown_signal() {
    let (addr, _tmp, shutdown) = spawn_server(ApprovalGate::auto(Decision::Denied)).await;

    // A whole session completes before the signal.
    let client = login(addr, "cl1", "cl1pass").await;
    client.exit().await.unwrap();

    shutdown.send(()).await.unwrap();

    // Give the accept loop a moment to wind down, then expect refusal.
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(DepotClient::connect(addr).await.is_err());
}
