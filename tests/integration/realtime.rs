//! Websocket feed over a real socket

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use presence_server::services::hub::HubHandle;

use crate::common::{call, make_app, TestApp};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, client_type: &str) -> Client {
    let url = format!("ws://{}/ws/dashboard?type={}", addr, client_type);
    let (socket, _) = connect_async(url).await.expect("websocket handshake failed");
    socket
}

async fn wait_for_subscribers(hub: &HubHandle, expected: usize) {
    for _ in 0..200 {
        if hub.subscriber_count().await.unwrap() == expected {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("hub never reached {} subscribers", expected);
}

async fn next_json(socket: &mut Client) -> Value {
    let read = async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("stream ended before a text frame: {:?}", other),
            }
        }
    };
    timeout(Duration::from_secs(5), read)
        .await
        .expect("no frame within 5s")
}

#[tokio::test]
async fn test_check_in_is_pushed_and_close_unregisters() {
    let app = make_app().await;
    let addr = serve(&app).await;

    let mut socket = connect(addr, "admin").await;
    wait_for_subscribers(&app.hub, 1).await;

    let (status, _) = call(
        &app.router,
        "POST",
        "/api/kiosk/check-in",
        None,
        Some(json!({ "employee_id": "EMP001", "kiosk_id": "KIOSK-LOBBY" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let frame = next_json(&mut socket).await;
    assert_eq!(frame["type"], "attendance_update");
    assert_eq!(frame["payload"]["type"], "check_in");
    assert_eq!(frame["payload"]["employee_id"], "EMP001");
    assert_eq!(frame["payload"]["user_id"], app.user_id.to_string());

    socket.close(None).await.unwrap();
    wait_for_subscribers(&app.hub, 0).await;
}

#[tokio::test]
async fn test_hub_shutdown_closes_client_stream() {
    let app = make_app().await;
    let addr = serve(&app).await;

    let mut socket = connect(addr, "kiosk").await;
    wait_for_subscribers(&app.hub, 1).await;

    app.hub.shutdown().await;

    let ended = timeout(Duration::from_secs(5), async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "client stream stayed open after hub shutdown");
    assert!(app.hub.stats().await.is_err());
}
