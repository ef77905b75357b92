mod support;

use futures_util::SinkExt;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use support::{next_event, spawn_server, WsStream};

async fn emit(ws: &mut WsStream, event: &str, data: Value) {
    let frame = json!({"event": event, "data": data}).to_string();
    ws.send(Message::text(frame)).await.expect("send frame");
}

#[tokio::test]
async fn approval_join_and_message_relay_flow() {
    let server = spawn_server().await;
    let client = Client::new();

    let login = client
        .post(server.http("/login"))
        .json(&json!({"username": "Alice", "userid": "alice", "userrole": "user"}))
        .send()
        .await
        .expect("login");
    assert_eq!(login.status(), StatusCode::OK);

    let (mut user_ws, _) = connect_async(server.ws_url()).await.expect("user ws connect");
    let (mut agent_ws, _) = connect_async(server.ws_url()).await.expect("agent ws connect");

    // 用户订阅以自身标识命名的通知通道
    emit(&mut user_ws, "join", json!({"room_name": "alice", "username": "alice"})).await;
    let joined = next_event(&mut user_ws).await;
    assert_eq!(joined["event"], "notification_join");
    assert_eq!(joined["data"]["username"], "System");
    assert_eq!(joined["data"]["text"], "alice has joined the room.");

    // 客服批准后用户收到通知
    let approve = client
        .post(server.http("/approve_request/alice"))
        .send()
        .await
        .expect("approve");
    assert_eq!(approve.status(), StatusCode::OK);
    let approved = next_event(&mut user_ws).await;
    assert_eq!(approved["event"], "request_approved");
    assert_eq!(approved["data"]["username"], "alice");

    // 双方进入同一房间
    emit(
        &mut agent_ws,
        "join",
        json!({"room_name": "liveagent-alice", "username": "liveagent", "userrole": "liveagent"}),
    )
    .await;
    let agent_joined = next_event(&mut agent_ws).await;
    assert_eq!(agent_joined["data"]["text"], "liveagent has joined the room.");

    emit(
        &mut user_ws,
        "join",
        json!({"room_name": "liveagent-alice", "username": "alice", "userrole": "user"}),
    )
    .await;
    assert_eq!(next_event(&mut user_ws).await["event"], "notification_join");
    assert_eq!(
        next_event(&mut agent_ws).await["data"]["text"],
        "alice has joined the room."
    );

    let active: Value = client
        .get(server.http("/active_users"))
        .send()
        .await
        .expect("active users")
        .json()
        .await
        .expect("json");
    assert_eq!(active["active_users"], json!(["alice"]));

    // 发送消息，双方都收到
    emit(
        &mut user_ws,
        "send_message",
        json!({"room_name": "liveagent-alice", "userid": "alice", "username": "Alice", "message": "hello"}),
    )
    .await;
    for ws in [&mut user_ws, &mut agent_ws] {
        let message = next_event(ws).await;
        assert_eq!(message["event"], "message");
        assert_eq!(message["data"]["username"], "Alice");
        assert_eq!(message["data"]["text"], "hello");
    }

    let history: Value = client
        .get(server.http("/rooms/liveagent-alice/history"))
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("json");
    let lines = history["chat_history"].as_array().expect("array");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].as_str().unwrap().starts_with("Alice: hello ("));

    let chat: Value = client
        .get(server.http("/chat?username=alice&chat_with=liveagent&userrole=user"))
        .send()
        .await
        .expect("chat")
        .json()
        .await
        .expect("json");
    assert_eq!(chat["chat_history"], history["chat_history"]);

    // 用户离开，客服收到离开通知
    emit(
        &mut user_ws,
        "leave",
        json!({"room_name": "liveagent-alice", "username": "alice", "userrole": "user"}),
    )
    .await;
    let left = next_event(&mut agent_ws).await;
    assert_eq!(left["event"], "notification_leave");
    assert_eq!(left["data"]["text"], "alice has left the room.");

    let active: Value = client
        .get(server.http("/active_users"))
        .send()
        .await
        .expect("active users")
        .json()
        .await
        .expect("json");
    assert_eq!(active["active_users"], json!([]));
}

#[tokio::test]
async fn malformed_frames_do_not_close_the_connection() {
    let server = spawn_server().await;
    let (mut ws, _) = connect_async(server.ws_url()).await.expect("ws connect");

    ws.send(Message::text("not json".to_string())).await.expect("send");
    emit(&mut ws, "leave", json!({})).await;
    emit(&mut ws, "send_message", json!({"username": "Alice", "message": "hi"})).await;

    let error = next_event(&mut ws).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["code"], "MISSING_FIELD");

    // 连接仍然可用
    emit(&mut ws, "join", json!({"room_name": "liveagent-bob", "username": "bob"})).await;
    let joined = next_event(&mut ws).await;
    assert_eq!(joined["event"], "notification_join");
}
