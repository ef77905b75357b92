use serde::{Deserialize, Serialize};

use crate::value_objects::Timestamp;

/// 一条聊天消息，聊天记录里以格式化后的文本行保存。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedMessage {
    pub sender_display_name: String,
    pub text: String,
    pub timestamp: Timestamp,
}

impl FormattedMessage {
    pub fn new(
        sender_display_name: impl Into<String>,
        text: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            sender_display_name: sender_display_name.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// `发送者: 内容 (时间)`
    pub fn transcript_line(&self) -> String {
        format!(
            "{}: {} ({})",
            self.sender_display_name, self.text, self.timestamp
        )
    }
}
