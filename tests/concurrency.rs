//! Session isolation under concurrency.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use depot_protocol::config::{DepotConfig, StorageConfig};
use depot_protocol::service::{DepotClient, DepotServer};
use depot_protocol::storage::{ApprovalGate, Decision};
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

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

#[tokio::test]
async fn a_session_blocked_on_approval_does_not_block_others() {
    let (gate, mut requests) = ApprovalGate::channel(4);
    let (addr, _tmp, _shutdown) = spawn_server(gate).await;

    let mut waiting = DepotClient::connect(addr).await.unwrap();
    waiting.login("cl1", "cl1pass").await.unwrap();
    waiting.put("pending.txt", b"wait for it").await.unwrap();

    // Park cl1 on the operator decision.
    let parked = tokio::spawn(async move {
        let verdict = waiting.request_publish("pending.txt").await.unwrap();
        (waiting, verdict)
    });
    let pending = requests.recv().await.unwrap();
    assert_eq!(pending.user(), "cl1");

    // While cl1 waits, cl2's session is fully functional.
    let mut other = DepotClient::connect(addr).await.unwrap();
    other.login("cl2", "cl2pass").await.unwrap();
    assert!(other.list().await.unwrap().is_empty());
    other.put("unrelated.txt", b"busy").await.unwrap();
    other.exit().await.unwrap();

    // Release the parked session.
    pending.respond(Decision::Approved);
    let (client, verdict) = parked.await.unwrap();
    assert_eq!(verdict, "APPROVED");
    client.exit().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_upload_and_publish_independently() {
    let (addr, _tmp, _shutdown) = spawn_server(ApprovalGate::auto(Decision::Approved)).await;

    let users = ["cl1", "cl2", "cl3"];
    let mut tasks = JoinSet::new();

    for (i, user) in users.into_iter().enumerate() {
        tasks.spawn(async move {
            let mut client = DepotClient::connect(addr).await.unwrap();
            client
                .login(user, &format!("{user}pass"))
                .await
                .unwrap();

            let name = format!("file-{user}.bin");
            let content = vec![i as u8 + 1; 10_000];

            client.put(&name, &content).await.unwrap();
            assert_eq!(client.request_publish(&name).await.unwrap(), "APPROVED");
            assert_eq!(client.get(&name).await.unwrap(), content);

            client.exit().await.unwrap();
            name
        });
    }

    let mut published = Vec::new();
    while let Some(res) = tasks.join_next().await {
        published.push(res.unwrap());
    }
    published.sort();

    // Every file made it through its own session.
    let mut check = DepotClient::connect(addr).await.unwrap();
    check.login("cl1", "cl1pass").await.unwrap();
    let mut listed = check.list().await.unwrap();
    listed.sort();
    assert_eq!(listed, published);
    check.exit().await.unwrap();
}

#[tokio::test]
async fn one_failed_session_does_not_disturb_another() {
    let (addr, _tmp, _shutdown) = spawn_server(ApprovalGate::auto(Decision::Denied)).await;

    let mut good = DepotClient::connect(addr).await.unwrap();
    good.login("cl1", "cl1pass").await.unwrap();

    // A second connection dies mid-handshake.
    let bad = DepotClient::connect(addr).await.unwrap();
    drop(bad);

    // And a third fails auth outright.
    let mut rejected = DepotClient::connect(addr).await.unwrap();
    assert!(rejected.login("cl1", "nope").await.is_err());

    // The healthy session never noticed.
    good.put("survivor.txt", b"ok").await.unwrap();
    assert!(good.list().await.unwrap().is_empty());
    good.exit().await.unwrap();
}
