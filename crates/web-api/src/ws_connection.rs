use application::services::{JoinRequest, LeaveRequest, SendMessageRequest};
use application::{ApplicationError, RoomSet, RoomSubscription};
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{DomainError, RoomName};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::state::AppState;

/// 客户端发来的事件，格式为 `{"event": "...", "data": {...}}`
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum ClientEvent {
    Join(JoinPayload),
    Leave(LeavePayload),
    SendMessage(SendMessagePayload),
}

#[derive(Debug, Deserialize)]
struct JoinPayload {
    #[serde(default)]
    room_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    userrole: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeavePayload {
    #[serde(default)]
    room_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    userrole: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    #[serde(default)]
    room_name: Option<String>,
    #[serde(default)]
    userid: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

enum WsCommand {
    SendText(String),
}

/// WebSocket 连接
///
/// 一个连接可以加入多个房间（包括以自身标识命名的一对一通知通道），
/// 收到的是所有已加入房间的事件。连接断开只取消订阅，不修改在线集合。
pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    subscription: RoomSubscription,
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, state: AppState) -> Self {
        let subscription = state.broadcaster.subscribe();
        tracing::info!("WebSocket 连接已建立");
        Self {
            socket,
            state,
            subscription,
        }
    }

    pub async fn run(self) {
        let Self {
            socket,
            state,
            mut subscription,
        } = self;
        let rooms = subscription.rooms();
        let (mut sender, mut incoming) = socket.split();

        // 创建 mpsc channel 来解耦对 sender 的访问
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

        // 发送任务：统一处理所有对 WebSocket sender 的写操作
        let mut send_task = tokio::spawn(async move {
            loop {
                let text = tokio::select! {
                    Some(cmd) = cmd_rx.recv() => match cmd {
                        WsCommand::SendText(text) => text,
                    },
                    Some(broadcast) = subscription.recv() => {
                        match serde_json::to_string(&broadcast.event) {
                            Ok(json) => json,
                            Err(err) => {
                                tracing::warn!(error = %err, "failed to serialize websocket payload");
                                continue;
                            }
                        }
                    }
                    else => break,
                };
                if sender.send(WsMessage::Text(text.into())).await.is_err() {
                    tracing::warn!("Failed to send text message");
                    break;
                }
            }
            tracing::info!("WebSocket发送任务结束");
        });

        // 接收任务：处理来自WebSocket客户端的消息
        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(message)) = incoming.next().await {
                match message {
                    WsMessage::Text(text) => {
                        handle_text(&state, &rooms, &cmd_tx, text.as_str()).await;
                    }
                    WsMessage::Close(_) => break,
                    _ => {}
                }
            }
            tracing::info!("WebSocket接收任务结束");
        });

        // 等待任意一个任务完成（连接断开）
        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }

        tracing::info!("WebSocket 连接已关闭");
    }
}

async fn handle_text(
    state: &AppState,
    rooms: &RoomSet,
    cmd_tx: &mpsc::Sender<WsCommand>,
    text: &str,
) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "无法解析的客户端事件，已忽略");
            return;
        }
    };

    let result = match event {
        ClientEvent::Join(payload) => handle_join(state, rooms, payload).await,
        ClientEvent::Leave(payload) => {
            handle_leave(state, rooms, payload).await;
            Ok(())
        }
        ClientEvent::SendMessage(payload) => state
            .relay
            .send(SendMessageRequest {
                room_name: payload.room_name.unwrap_or_default(),
                sender_identifier: payload.userid,
                sender_display_name: payload.username.unwrap_or_default(),
                text: payload.message.unwrap_or_default(),
            })
            .await
            .map(|_| ()),
    };

    if let Err(err) = result {
        tracing::warn!(error = %err, "客户端事件处理失败");
        let frame = error_frame(&err);
        if cmd_tx.send(WsCommand::SendText(frame)).await.is_err() {
            tracing::warn!("Failed to queue error frame");
        }
    }
}

/// 先订阅房间再发布加入通知，加入者自己也能收到
async fn handle_join(
    state: &AppState,
    rooms: &RoomSet,
    payload: JoinPayload,
) -> Result<(), ApplicationError> {
    let room = payload
        .room_name
        .and_then(RoomName::from_raw)
        .ok_or_else(|| DomainError::missing_field("room_name"))?;

    let newly_joined = rooms.insert(room.clone()).await;
    let result = state
        .relay
        .join(JoinRequest {
            room_name: room.to_string(),
            identifier: payload.username.unwrap_or_default(),
            role: payload.userrole,
        })
        .await;

    if result.is_err() && newly_joined {
        rooms.remove(&room).await;
    }
    result.map(|_| ())
}

/// 先取消订阅再发布离开通知
async fn handle_leave(state: &AppState, rooms: &RoomSet, payload: LeavePayload) {
    if let Some(room) = payload.room_name.clone().and_then(RoomName::from_raw) {
        rooms.remove(&room).await;
    }
    state
        .relay
        .leave(LeaveRequest {
            room_name: payload.room_name,
            identifier: payload.username,
            role: payload.userrole,
        })
        .await;
}

fn error_frame(err: &ApplicationError) -> String {
    let code = match err.as_domain() {
        DomainError::InvalidRole { .. } => "INVALID_ROLE",
        DomainError::MissingField { .. } => "MISSING_FIELD",
        DomainError::NotFound { .. } => "NOT_FOUND",
    };
    serde_json::json!({
        "event": "error",
        "data": { "code": code, "message": err.to_string() },
    })
    .to_string()
}
