//! 房间消息中转
//!
//! 加入/离开/发送三类事件：先在房间排序器内修改状态，再发布事件，
//! 状态锁在发布前已经释放。

use std::sync::Arc;

use domain::{
    DisplayName, DomainError, FormattedMessage, ParticipantId, RelayEvent, Role, RoomName,
};

use crate::{
    broadcaster::{RoomBroadcast, RoomBroadcaster},
    clock::Clock,
    error::ApplicationError,
    message_log::MessageLog,
    presence::ActivePresenceSet,
    sequencer::RoomSequencer,
};

#[derive(Debug, Clone, Default)]
pub struct JoinRequest {
    pub room_name: String,
    pub identifier: String,
    /// 缺省按普通用户处理
    pub role: Option<String>,
}

/// 离开事件的字段全部可缺省，缺字段时只记录日志
#[derive(Debug, Clone, Default)]
pub struct LeaveRequest {
    pub room_name: Option<String>,
    pub identifier: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SendMessageRequest {
    pub room_name: String,
    pub sender_identifier: Option<String>,
    pub sender_display_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChatViewRequest {
    pub caller: String,
    pub counterpart: String,
    pub caller_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub caller: ParticipantId,
    pub counterpart: ParticipantId,
    pub room_name: RoomName,
    pub chat_history: Vec<String>,
}

pub struct RelayServiceDependencies {
    pub message_log: Arc<MessageLog>,
    pub sequencer: Arc<RoomSequencer>,
    pub presence: Arc<ActivePresenceSet>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn RoomBroadcaster>,
    /// 系统通知的发送者名称
    pub system_label: String,
    /// 未给出角色时用于判断调用方是否为客服
    pub agent_identifier: ParticipantId,
}

pub struct RelayService {
    deps: RelayServiceDependencies,
}

fn parse_role(role: Option<&str>) -> Result<Role, DomainError> {
    match role {
        Some(role) if !role.trim().is_empty() => role.parse(),
        _ => Ok(Role::User),
    }
}

fn parse_room(room_name: impl Into<String>) -> Result<RoomName, DomainError> {
    RoomName::from_raw(room_name).ok_or_else(|| DomainError::missing_field("room_name"))
}

impl RelayService {
    pub fn new(deps: RelayServiceDependencies) -> Self {
        Self { deps }
    }

    async fn publish(&self, room: &RoomName, event: RelayEvent) {
        let name = event.name();
        if let Err(err) = self
            .deps
            .broadcaster
            .publish(RoomBroadcast::new(room.clone(), event))
            .await
        {
            tracing::error!(room = %room, event = name, error = %err, "房间事件广播失败");
        }
    }

    /// 加入房间：用户记入在线集合，并向房间（包括加入者）发送加入通知。
    pub async fn join(&self, request: JoinRequest) -> Result<RelayEvent, ApplicationError> {
        let room = parse_room(request.room_name)?;
        let identifier = ParticipantId::parse(request.identifier)?;
        let role = parse_role(request.role.as_deref())?;

        let _turn = self.deps.sequencer.enter(&room).await;
        if role == Role::User {
            self.deps.presence.user_connected(identifier.clone()).await;
        }

        let event =
            RelayEvent::joined(&self.deps.system_label, &identifier, self.deps.clock.now());
        tracing::info!(room = %room, identifier = %identifier, role = %role, "加入房间");
        self.publish(&room, event.clone()).await;
        Ok(event)
    }

    /// 离开房间，任何输入问题都只记录日志，不向调用方报错。
    pub async fn leave(&self, request: LeaveRequest) -> Option<RelayEvent> {
        let room = match request.room_name.map(parse_room) {
            Some(Ok(room)) => room,
            _ => {
                tracing::warn!("离开事件缺少 room_name，已忽略");
                return None;
            }
        };
        let identifier = match request.identifier.map(ParticipantId::parse) {
            Some(Ok(identifier)) => identifier,
            _ => {
                tracing::warn!(room = %room, "离开事件缺少 username，已忽略");
                return None;
            }
        };
        let role = match parse_role(request.role.as_deref()) {
            Ok(role) => Some(role),
            Err(err) => {
                tracing::warn!(
                    room = %room,
                    identifier = %identifier,
                    error = %err,
                    "离开事件角色无法识别"
                );
                None
            }
        };

        let _turn = self.deps.sequencer.enter(&room).await;
        if role == Some(Role::User) {
            self.deps.presence.user_disconnected(&identifier).await;
        }

        let event = RelayEvent::left(&self.deps.system_label, &identifier, self.deps.clock.now());
        tracing::info!(room = %room, identifier = %identifier, "离开房间");
        self.publish(&room, event.clone()).await;
        Some(event)
    }

    /// 发送消息：追加到房间聊天记录并广播。
    pub async fn send(
        &self,
        request: SendMessageRequest,
    ) -> Result<FormattedMessage, ApplicationError> {
        let room = parse_room(request.room_name)?;
        let sender = DisplayName::parse(request.sender_display_name)?;
        if request.text.trim().is_empty() {
            return Err(DomainError::missing_field("message").into());
        }

        let _turn = self.deps.sequencer.enter(&room).await;
        let message = FormattedMessage::new(sender.as_str(), request.text, self.deps.clock.now());
        let length = self
            .deps
            .message_log
            .append(&room, message.transcript_line())
            .await;

        tracing::debug!(
            room = %room,
            sender = %sender,
            sender_identifier = request.sender_identifier.as_deref().unwrap_or("-"),
            length,
            "消息已写入聊天记录"
        );
        self.publish(&room, RelayEvent::message(message.clone())).await;
        Ok(message)
    }

    pub async fn history(&self, room_name: &str) -> Vec<String> {
        match RoomName::from_raw(room_name) {
            Some(room) => self.deps.message_log.history(&room).await,
            None => Vec::new(),
        }
    }

    /// 解析双方共享的房间并返回其聊天记录。
    ///
    /// 未给出角色时，调用方标识等于配置的客服标识即视为客服。
    pub async fn chat_view(&self, request: ChatViewRequest) -> Result<ChatView, ApplicationError> {
        let caller = ParticipantId::parse(request.caller)
            .map_err(|_| DomainError::missing_field("username"))?;
        let counterpart = ParticipantId::parse(request.counterpart)
            .map_err(|_| DomainError::missing_field("chat_with"))?;
        let caller_role = match request.caller_role.as_deref() {
            Some(role) if !role.trim().is_empty() => role.parse()?,
            _ if caller == self.deps.agent_identifier => Role::LiveAgent,
            _ => Role::User,
        };

        let room_name = RoomName::resolve(&caller, caller_role, &counterpart);
        let chat_history = self.deps.message_log.history(&room_name).await;
        tracing::debug!(room = %room_name, caller = %caller, "读取聊天记录");

        Ok(ChatView {
            caller,
            counterpart,
            room_name,
            chat_history,
        })
    }
}
