use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::{HeaderValue, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use application::services::{ChatViewRequest, SubmitOutcome, SubmitRequest};
use domain::{ParticipantRecord, Role, Timestamp};

use crate::{error::ApiError, state::AppState, ws_connection::WebSocketConnection};

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    userid: Option<String>,
    #[serde(default)]
    userrole: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    redirect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    userrole: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    userid: Option<String>,
}

#[derive(Debug, Serialize)]
struct PendingDetails {
    username: String,
    userrole: Role,
    timestamp: Timestamp,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    user_requests: BTreeMap<String, PendingDetails>,
}

#[derive(Debug, Serialize)]
struct PendingRequestDto {
    userid: String,
    username: String,
    userrole: Role,
    timestamp: Timestamp,
    url: String,
}

impl From<ParticipantRecord> for PendingRequestDto {
    fn from(record: ParticipantRecord) -> Self {
        Self {
            url: format!("/approve_request/{}", record.identifier),
            userid: record.identifier.to_string(),
            username: record.display_name.to_string(),
            userrole: record.role,
            timestamp: record.requested_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct PendingListResponse {
    user_requests: Vec<PendingRequestDto>,
}

#[derive(Debug, Serialize)]
struct ApprovalResponse {
    message: &'static str,
    userid: String,
    username: String,
    timestamp: Timestamp,
}

#[derive(Debug, Serialize)]
struct ApprovedUserDto {
    userid: String,
    username: String,
    timestamp: Timestamp,
}

#[derive(Debug, Serialize)]
struct ApprovedListResponse {
    approved_users: Vec<ApprovedUserDto>,
}

#[derive(Debug, Serialize)]
struct ActiveUsersResponse {
    active_users: Vec<String>,
    timestamp: Timestamp,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChatQuery {
    username: Option<String>,
    chat_with: Option<String>,
    userrole: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    username: String,
    chat_with: String,
    room_name: String,
    chat_history: Vec<String>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    room_name: String,
    chat_history: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/liveagent", get(liveagent_dashboard))
        .route("/get_user_requests", get(get_user_requests))
        .route("/approve_request/{userid}", post(approve_request))
        .route("/approved_request/{userid}", get(approved_request))
        .route("/approved_users", get(approved_users))
        .route("/active_users", get(active_users))
        .route("/waiting/{username}", get(waiting))
        .route("/chat", get(chat))
        .route("/rooms/{room_name}/history", get(room_history))
        .route("/ws", get(websocket_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "忽略无效的 CORS 来源");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = state
        .admission
        .submit(SubmitRequest {
            identifier: payload.userid.unwrap_or_default(),
            display_name: payload.username.unwrap_or_default(),
            role: payload.userrole.unwrap_or_default(),
        })
        .await?;

    let response = match outcome {
        SubmitOutcome::AgentDashboard {
            identifier,
            display_name,
        } => LoginResponse {
            redirect: "/liveagent".to_string(),
            username: Some(display_name.to_string()),
            userrole: Some(Role::LiveAgent.to_string()),
            userid: Some(identifier.to_string()),
        },
        SubmitOutcome::Waiting { display_name, .. } => LoginResponse {
            redirect: format!("/waiting/{}", display_name),
            username: None,
            userrole: None,
            userid: None,
        },
        SubmitOutcome::AlreadyApproved { identifier, .. } => LoginResponse {
            redirect: format!("/approved_request/{}", identifier),
            username: None,
            userrole: None,
            userid: None,
        },
    };

    Ok(Json(response))
}

async fn liveagent_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let user_requests = state
        .admission
        .list_pending()
        .await
        .into_iter()
        .map(|record| {
            (
                record.identifier.to_string(),
                PendingDetails {
                    username: record.display_name.to_string(),
                    userrole: record.role,
                    timestamp: record.requested_at,
                },
            )
        })
        .collect();
    tracing::info!("客服控制台被访问");
    Json(DashboardResponse { user_requests })
}

async fn get_user_requests(State(state): State<AppState>) -> Json<PendingListResponse> {
    let user_requests = state
        .admission
        .list_pending()
        .await
        .into_iter()
        .map(PendingRequestDto::from)
        .collect();
    Json(PendingListResponse { user_requests })
}

async fn approve_request(
    State(state): State<AppState>,
    Path(userid): Path<String>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let receipt = state.admission.approve(&userid).await?;
    Ok(Json(ApprovalResponse {
        message: "User approved successfully",
        userid: receipt.identifier.to_string(),
        username: receipt.display_name.to_string(),
        timestamp: receipt.approved_at,
    }))
}

async fn approved_request(
    State(state): State<AppState>,
    Path(userid): Path<String>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let status = state.admission.lookup_approved(&userid).await?;
    Ok(Json(ApprovalResponse {
        message: "User approved successfully",
        userid: status.record.identifier.to_string(),
        username: status.record.display_name.to_string(),
        timestamp: status.checked_at,
    }))
}

async fn approved_users(State(state): State<AppState>) -> Json<ApprovedListResponse> {
    let approved_users = state
        .admission
        .list_approved()
        .await
        .into_iter()
        .map(|record| ApprovedUserDto {
            userid: record.identifier.to_string(),
            username: record.display_name.to_string(),
            timestamp: record.requested_at,
        })
        .collect();
    Json(ApprovedListResponse { approved_users })
}

async fn active_users(State(state): State<AppState>) -> Json<ActiveUsersResponse> {
    let active = state.admission.active_users().await;
    Json(ActiveUsersResponse {
        active_users: active.users.iter().map(ToString::to_string).collect(),
        timestamp: active.timestamp,
    })
}

async fn waiting(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.admission.is_waiting(&username).await {
        Ok(Json(MessageResponse {
            message: format!("User {} is waiting for approval", username),
        }))
    } else {
        tracing::info!(username = %username, "等待查询未命中");
        Err(ApiError::not_found("Username is invalid"))
    }
}

async fn chat(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
) -> Result<Json<ChatResponse>, ApiError> {
    let view = state
        .relay
        .chat_view(ChatViewRequest {
            caller: query.username.unwrap_or_default(),
            counterpart: query.chat_with.unwrap_or_default(),
            caller_role: query.userrole,
        })
        .await?;

    Ok(Json(ChatResponse {
        username: view.caller.to_string(),
        chat_with: view.counterpart.to_string(),
        room_name: view.room_name.to_string(),
        chat_history: view.chat_history,
    }))
}

async fn room_history(
    State(state): State<AppState>,
    Path(room_name): Path<String>,
) -> Json<HistoryResponse> {
    let chat_history = state.relay.history(&room_name).await;
    Json(HistoryResponse {
        room_name,
        chat_history,
    })
}

async fn websocket_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        WebSocketConnection::new(socket, state).run().await;
    })
}
