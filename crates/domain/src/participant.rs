//! 参与者与角色

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    errors::DomainError,
    value_objects::{DisplayName, ParticipantId, Timestamp},
};

/// 参与者角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(rename = "liveagent")]
    LiveAgent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::LiveAgent => "liveagent",
        }
    }

    pub fn is_agent(&self) -> bool {
        matches!(self, Role::LiveAgent)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    /// 不区分大小写；空字符串视为缺少字段。
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::missing_field("userrole"));
        }
        if trimmed.eq_ignore_ascii_case("user") {
            Ok(Role::User)
        } else if trimmed.eq_ignore_ascii_case("liveagent") {
            Ok(Role::LiveAgent)
        } else {
            Err(DomainError::invalid_role(trimmed))
        }
    }
}

/// 登录时创建的参与者记录，任一时刻只属于等待队列或已批准名单之一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub identifier: ParticipantId,
    pub display_name: DisplayName,
    pub role: Role,
    pub requested_at: Timestamp,
}

impl ParticipantRecord {
    pub fn new(
        identifier: ParticipantId,
        display_name: DisplayName,
        role: Role,
        requested_at: Timestamp,
    ) -> Self {
        Self {
            identifier,
            display_name,
            role,
            requested_at,
        }
    }
}
