//! 已批准名单
//!
//! 只追加不删除；断线后也不会清理（见 DESIGN.md 的开放问题）。

use std::collections::HashMap;

use domain::{DomainError, DomainResult, ParticipantId, ParticipantRecord};
use tokio::sync::RwLock;

#[derive(Default)]
struct RegistryState {
    entries: HashMap<ParticipantId, ParticipantRecord>,
    order: Vec<ParticipantId>,
}

#[derive(Default)]
pub struct ApprovedRegistry {
    state: RwLock<RegistryState>,
}

impl ApprovedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只应由等待队列在持有自身写锁时调用，保证一个标识不会同时出现在两处。
    pub(crate) async fn insert(&self, record: ParticipantRecord) {
        let mut state = self.state.write().await;
        let identifier = record.identifier.clone();
        if state.entries.insert(identifier.clone(), record).is_none() {
            state.order.push(identifier);
        }
    }

    pub async fn lookup(&self, identifier: &ParticipantId) -> DomainResult<ParticipantRecord> {
        self.state
            .read()
            .await
            .entries
            .get(identifier)
            .cloned()
            .ok_or_else(|| DomainError::not_found("approved_user", identifier.as_str()))
    }

    pub async fn contains(&self, identifier: &ParticipantId) -> bool {
        self.state.read().await.entries.contains_key(identifier)
    }

    /// 按批准顺序返回快照
    pub async fn list(&self) -> Vec<ParticipantRecord> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|identifier| state.entries.get(identifier).cloned())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
