use std::collections::HashSet;

use domain::ParticipantId;
use tokio::sync::RwLock;

/// 当前已加入房间的用户集合
///
/// 与已批准名单相互独立：某个标识可以在线却没有批准记录。
/// 客服不计入在线集合。
#[derive(Default)]
pub struct ActivePresenceSet {
    members: RwLock<HashSet<ParticipantId>>,
}

impl ActivePresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回是否为新加入
    pub async fn user_connected(&self, identifier: ParticipantId) -> bool {
        let inserted = self.members.write().await.insert(identifier.clone());
        tracing::info!(identifier = %identifier, inserted, "用户进入房间");
        inserted
    }

    /// 不存在时什么也不做
    pub async fn user_disconnected(&self, identifier: &ParticipantId) -> bool {
        let removed = self.members.write().await.remove(identifier);
        tracing::info!(identifier = %identifier, removed, "用户离开房间");
        removed
    }

    pub async fn is_active(&self, identifier: &ParticipantId) -> bool {
        self.members.read().await.contains(identifier)
    }

    /// 排序后的快照
    pub async fn snapshot(&self) -> Vec<ParticipantId> {
        let mut members: Vec<ParticipantId> = self.members.read().await.iter().cloned().collect();
        members.sort();
        members
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }
}
