//! 房间命名规则
//!
//! 一个用户与客服共享一个房间，房间名固定为 `客服标识-用户标识`，
//! 双方各自计算都能得到同一个名字。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{participant::Role, value_objects::ParticipantId};

const SEPARATOR: char = '-';

/// 房间名，只由参与者标识推导得到。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// 客服标识在前，用户标识在后。
    pub fn for_pair(agent: &ParticipantId, user: &ParticipantId) -> Self {
        Self(format!("{}{}{}", agent, SEPARATOR, user))
    }

    /// 从调用方视角解析房间名，调用方的角色决定谁排在前面。
    pub fn resolve(caller: &ParticipantId, caller_role: Role, counterpart: &ParticipantId) -> Self {
        match caller_role {
            Role::LiveAgent => Self::for_pair(caller, counterpart),
            Role::User => Self::for_pair(counterpart, caller),
        }
    }

    /// 一对一通知通道，房间名就是参与者标识本身。
    pub fn direct(identifier: &ParticipantId) -> Self {
        Self(identifier.as_str().to_string())
    }

    /// 客户端直接给出的房间名，原样使用。
    pub fn from_raw(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ParticipantId {
        ParticipantId::parse(value).unwrap()
    }

    #[test]
    fn both_sides_resolve_the_same_room() {
        let agent = id("agent1");
        let user = id("alice");

        let from_agent = RoomName::resolve(&agent, Role::LiveAgent, &user);
        let from_user = RoomName::resolve(&user, Role::User, &agent);

        assert_eq!(from_agent, from_user);
        assert_eq!(from_agent.as_str(), "agent1-alice");
    }

    #[test]
    fn argument_order_matters_for_the_literal_key() {
        let agent = id("agent1");
        let user = id("alice");
        assert_ne!(
            RoomName::for_pair(&agent, &user),
            RoomName::for_pair(&user, &agent)
        );
    }

    #[test]
    fn user_sharing_the_agent_marker_is_still_placed_by_role() {
        // 用户标识恰好等于 "liveagent" 时也按角色排序
        let agent = id("desk");
        let user = id("liveagent");
        assert_eq!(
            RoomName::resolve(&user, Role::User, &agent).as_str(),
            "desk-liveagent"
        );
    }

    #[test]
    fn blank_raw_room_is_rejected() {
        assert!(RoomName::from_raw("  ").is_none());
        assert_eq!(RoomName::from_raw("a-b").unwrap().as_str(), "a-b");
    }
}
