mod common;

use common::{serve, ScriptedClient, FIRST_EXPLANATION, NO_TOPIC, TOPIC_CONFIRMED};
use feynomenon::tutor::prompts::{FAREWELL, GREETING};
use feynomenon::tutor::{SessionId, TutorService};
use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start(client: &Arc<ScriptedClient>) -> (TutorService, SocketAddr) {
    let tutor = TutorService::new(client.clone());
    let addr = serve(tutor.clone()).await;
    (tutor, addr)
}

async fn connect(addr: SocketAddr, session_id: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}/ws/{}", addr, session_id))
        .await
        .unwrap();
    socket
}

async fn say(socket: &mut Socket, message: &str) {
    let frame = json!({ "message": message }).to_string();
    socket.send(Message::text(frame)).await.unwrap();
}

/// Next JSON frame from the server, skipping control frames.
async fn next_frame(socket: &mut Socket) -> Value {
    loop {
        let message = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("no frame within 5s")
            .expect("socket closed")
            .unwrap();
        match message {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

/// The server closes the socket without sending any further data.
async fn assert_closed(socket: &mut Socket) {
    loop {
        match timeout(Duration::from_secs(5), socket.next()).await.expect("socket stayed open") {
            None | Some(Ok(Message::Close(_))) | Some(Err(_)) => return,
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(other)) => panic!("expected close, got {:?}", other),
        }
    }
}

async fn wait_for_session_count(tutor: &TutorService, expected: usize) {
    for _ in 0..100 {
        if tutor.session_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(tutor.session_count().await, expected);
}

#[tokio::test]
async fn test_unknown_id_gets_greeting() {
    let client = ScriptedClient::with_replies(&[]);
    let (tutor, addr) = start(&client).await;
    let mut socket = connect(addr, "ws-new").await;

    assert_eq!(
        next_frame(&mut socket).await,
        json!({
            "type": "message",
            "response": GREETING,
            "phase": "topic_gathering",
            "topic_identified": false
        })
    );
    assert!(tutor.contains(&SessionId::from("ws-new")).await);
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_existing_id_gets_no_greeting() {
    let client = ScriptedClient::with_replies(&[NO_TOPIC]);
    let (tutor, addr) = start(&client).await;
    tutor.get_or_create(SessionId::from("ws-known")).await.unwrap();

    let mut socket = connect(addr, "ws-known").await;
    say(&mut socket, "not sure").await;

    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["response"], NO_TOPIC);
    assert_eq!(frame["topic_identified"], false);
}

#[tokio::test]
async fn test_tutoring_flow_ends_with_close() {
    let client = ScriptedClient::with_replies(&[TOPIC_CONFIRMED, FIRST_EXPLANATION]);
    let (tutor, addr) = start(&client).await;
    let mut socket = connect(addr, "ws-flow").await;
    next_frame(&mut socket).await;

    say(&mut socket, "black holes").await;
    assert_eq!(
        next_frame(&mut socket).await,
        json!({
            "type": "message",
            "response": FIRST_EXPLANATION,
            "phase": "feynman_tutoring",
            "topic_identified": true,
            "topic": "Black Holes"
        })
    );

    say(&mut socket, "quit").await;
    assert_eq!(
        next_frame(&mut socket).await,
        json!({
            "type": "message",
            "response": FAREWELL,
            "phase": "feynman_tutoring",
            "session_ended": true
        })
    );
    assert_closed(&mut socket).await;

    wait_for_session_count(&tutor, 0).await;
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_client_disconnect_deletes_session() {
    let client = ScriptedClient::with_replies(&[]);
    let (tutor, addr) = start(&client).await;
    let mut socket = connect(addr, "ws-bye").await;
    next_frame(&mut socket).await;
    assert_eq!(tutor.session_count().await, 1);

    socket.close(None).await.unwrap();

    wait_for_session_count(&tutor, 0).await;
}

#[tokio::test]
async fn test_remote_error_is_recoverable() {
    let client = ScriptedClient::with_replies(&[]);
    client.push_failure("429 quota exceeded");
    let (tutor, addr) = start(&client).await;
    let mut socket = connect(addr, "ws-quota").await;
    next_frame(&mut socket).await;

    say(&mut socket, "hello").await;
    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["recoverable"], true);

    // Same socket, same session, next turn succeeds.
    client.push_reply(NO_TOPIC);
    say(&mut socket, "hello").await;
    assert_eq!(next_frame(&mut socket).await["response"], NO_TOPIC);
    assert_eq!(tutor.session_count().await, 1);
}

#[tokio::test]
async fn test_deleted_session_is_not_recoverable() {
    let client = ScriptedClient::with_replies(&[]);
    let (tutor, addr) = start(&client).await;
    let mut socket = connect(addr, "ws-gone").await;
    next_frame(&mut socket).await;

    tutor.delete(&SessionId::from("ws-gone")).await.unwrap();
    say(&mut socket, "hello").await;

    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["recoverable"], false);
    assert_closed(&mut socket).await;
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_frame_keeps_socket_open() {
    let client = ScriptedClient::with_replies(&[NO_TOPIC]);
    let (tutor, addr) = start(&client).await;
    let mut socket = connect(addr, "ws-garbled").await;
    next_frame(&mut socket).await;

    socket.send(Message::text("{not json".to_string())).await.unwrap();
    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["recoverable"], true);
    assert!(frame["message"].as_str().unwrap().starts_with("invalid message"));

    say(&mut socket, "not sure").await;
    assert_eq!(next_frame(&mut socket).await["response"], NO_TOPIC);
    assert_eq!(tutor.session_count().await, 1);
}
