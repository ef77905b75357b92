//! 推送给房间订阅者的事件
//!
//! 事件只是值，真正的投递交给传输层。序列化格式为
//! `{"event": "<名称>", "data": {...}}`。

use serde::{Deserialize, Serialize};

use crate::{message::FormattedMessage, value_objects::{ParticipantId, Timestamp}};

/// 系统通知（加入/离开）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemNotice {
    /// 系统标签，通常是 "System"
    pub username: String,
    pub text: String,
    pub timestamp: Timestamp,
}

/// 聊天消息负载
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub username: String,
    pub text: String,
    pub timestamp: Timestamp,
}

impl From<FormattedMessage> for ChatPayload {
    fn from(message: FormattedMessage) -> Self {
        Self {
            username: message.sender_display_name,
            text: message.text,
            timestamp: message.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RelayEvent {
    /// 请求已被客服批准，发往以用户标识命名的一对一通道
    RequestApproved {
        username: ParticipantId,
        timestamp: Timestamp,
    },
    NotificationJoin(SystemNotice),
    NotificationLeave(SystemNotice),
    Message(ChatPayload),
}

impl RelayEvent {
    pub fn request_approved(identifier: ParticipantId, timestamp: Timestamp) -> Self {
        RelayEvent::RequestApproved {
            username: identifier,
            timestamp,
        }
    }

    pub fn joined(system_label: &str, who: &ParticipantId, timestamp: Timestamp) -> Self {
        RelayEvent::NotificationJoin(SystemNotice {
            username: system_label.to_string(),
            text: format!("{} has joined the room.", who),
            timestamp,
        })
    }

    pub fn left(system_label: &str, who: &ParticipantId, timestamp: Timestamp) -> Self {
        RelayEvent::NotificationLeave(SystemNotice {
            username: system_label.to_string(),
            text: format!("{} has left the room.", who),
            timestamp,
        })
    }

    pub fn message(message: FormattedMessage) -> Self {
        RelayEvent::Message(message.into())
    }

    /// 事件名称，和序列化时的 `event` 字段一致
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::RequestApproved { .. } => "request_approved",
            RelayEvent::NotificationJoin(_) => "notification_join",
            RelayEvent::NotificationLeave(_) => "notification_leave",
            RelayEvent::Message(_) => "message",
        }
    }
}
