#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use gamerhub_common::wire::{ClientEvent, JoinCommunity, SendMessage, ServerEvent};
use hub_api::config::Config;
use hub_api::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn test_state() -> AppState {
    AppState::new(Config {
        port: 0,
        worker_id: 0,
        genres: None,
    })
}

/// Start a real TCP server for the full router. Returns (addr, state); the
/// server runs in the background for the rest of the test.
pub async fn spawn_server() -> (SocketAddr, AppState) {
    let state = test_state();
    let app = hub_api::routes::router().with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

pub async fn connect_ws(addr: SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/gateway");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

pub async fn emit(ws: &mut WsStream, event: &ClientEvent) {
    let json = serde_json::to_string(event).unwrap();
    ws.send(tungstenite::Message::Text(json.into()))
        .await
        .expect("send event");
}

pub async fn join(ws: &mut WsStream, genre: &str, user_id: &str) {
    emit(
        ws,
        &ClientEvent::JoinCommunity(JoinCommunity {
            genre_name: genre.to_string(),
            user_id: user_id.to_string(),
        }),
    )
    .await;
}

pub async fn send_message(ws: &mut WsStream, genre: &str, content: &str, user_id: &str) {
    emit(
        ws,
        &ClientEvent::SendMessage(SendMessage {
            genre: genre.to_string(),
            content: content.to_string(),
            user_id: user_id.to_string(),
        }),
    )
    .await;
}

/// Read the next `receive-message` event, failing after a timeout.
pub async fn recv_event(ws: &mut WsStream) -> ServerEvent {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for server event")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(&text).expect("parse server event");
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Assert that no event is delivered within the window.
pub async fn assert_silent(ws: &mut WsStream, window: Duration) {
    let result = time::timeout(window, ws.next()).await;
    match result {
        Err(_) => {} // Timed out with nothing delivered, as expected.
        Ok(frame) => panic!("expected silence, got {frame:?}"),
    }
}

/// Poll until `condition` holds, failing after a few seconds. Used to wait
/// for server-side state that a ws frame mutates asynchronously.
pub async fn wait_until<F>(condition: F)
where
    F: Fn() -> bool,
{
    let deadline = time::Instant::now() + Duration::from_secs(3);
    while !condition() {
        if time::Instant::now() > deadline {
            panic!("condition not reached in time");
        }
        time::sleep(Duration::from_millis(10)).await;
    }
}
