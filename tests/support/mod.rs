// Shared helpers for booting isolated game processes inside integration tests.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use rps_duel::AppSettings;
use serde_json::Value;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub type PeerSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Fast rounds so a full countdown fits comfortably in a test.
pub fn settings(local_name: &str) -> AppSettings {
    AppSettings {
        local_name: local_name.to_string(),
        peer_url: None,
        countdown_start: 2,
        tick_interval: Duration::from_millis(50),
        handshake_timeout: Duration::from_secs(2),
        console: false,
    }
}

// Bind an ephemeral port, serve the app on the current runtime, and return `host:port`.
pub async fn spawn_app(settings: AppSettings) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        rps_duel::run(listener, settings).await.expect("server failed");
    });
    addr.to_string()
}

pub async fn snapshot(client: &reqwest::Client, addr: &str) -> Value {
    client
        .get(format!("http://{addr}/snapshot"))
        .send()
        .await
        .expect("snapshot request should succeed")
        .json()
        .await
        .expect("snapshot should be json")
}

// Poll the snapshot route until the predicate holds or the deadline passes.
pub async fn wait_for_snapshot(
    client: &reqwest::Client,
    addr: &str,
    predicate: impl Fn(&Value) -> bool,
) -> Value {
    for _ in 0..150 {
        let current = snapshot(client, addr).await;
        if predicate(&current) {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("snapshot did not reach the expected state in time");
}

pub async fn post_intent(client: &reqwest::Client, addr: &str, intent: Value) -> reqwest::StatusCode {
    client
        .post(format!("http://{addr}/intents"))
        .json(&intent)
        .send()
        .await
        .expect("intent request should succeed")
        .status()
}

pub async fn post_leave(client: &reqwest::Client, addr: &str) -> reqwest::StatusCode {
    client
        .post(format!("http://{addr}/leave"))
        .send()
        .await
        .expect("leave request should succeed")
        .status()
}

// Connect as the remote peer and complete the hello exchange.
pub async fn connect_peer(addr: &str, display_name: &str) -> (PeerSocket, Value) {
    let (mut socket, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}/peer"))
        .await
        .expect("peer should connect");
    send_frame(
        &mut socket,
        serde_json::json!({ "type": "Hello", "data": { "display_name": display_name } }),
    )
    .await;
    let hello = recv_frame(&mut socket).await;
    (socket, hello)
}

pub async fn send_frame(socket: &mut PeerSocket, frame: Value) {
    socket
        .send(Message::text(frame.to_string()))
        .await
        .expect("frame should be sent");
}

pub async fn recv_frame(socket: &mut PeerSocket) -> Value {
    let deadline = Duration::from_secs(3);
    loop {
        let message = tokio::time::timeout(deadline, socket.next())
            .await
            .expect("frame should arrive in time")
            .expect("socket should stay open")
            .expect("frame should be readable");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("frames are json");
        }
    }
}

// Drain the socket until the other side hangs up.
pub async fn expect_closed(socket: &mut PeerSocket) {
    let deadline = Duration::from_secs(3);
    loop {
        let next = tokio::time::timeout(deadline, socket.next())
            .await
            .expect("socket should close in time");
        match next {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
            Some(Ok(_)) => continue,
        }
    }
}
