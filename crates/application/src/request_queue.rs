//! 等待队列
//!
//! 以参与者标识为主键，另外维护一份按展示名称的二级索引供 `is_waiting` 使用。
//! 加锁顺序固定为先队列后已批准名单，名单一侧从不反向获取队列锁。

use std::collections::{HashMap, HashSet};

use domain::{DisplayName, DomainError, DomainResult, ParticipantId, ParticipantRecord};
use tokio::sync::RwLock;

use crate::approved_registry::ApprovedRegistry;

struct PendingEntry {
    position: u64,
    record: ParticipantRecord,
}

#[derive(Default)]
struct QueueState {
    entries: HashMap<ParticipantId, PendingEntry>,
    by_display_name: HashMap<DisplayName, HashSet<ParticipantId>>,
    next_position: u64,
}

impl QueueState {
    fn unindex(&mut self, display_name: &DisplayName, identifier: &ParticipantId) {
        if let Some(ids) = self.by_display_name.get_mut(display_name) {
            ids.remove(identifier);
            if ids.is_empty() {
                self.by_display_name.remove(display_name);
            }
        }
    }
}

/// 入队结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// 新加入或覆盖了已有的等待记录
    Queued(ParticipantRecord),
    /// 已经批准过，不再重新排队
    AlreadyApproved(ParticipantRecord),
}

#[derive(Default)]
pub struct RequestQueue {
    state: RwLock<QueueState>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖等待记录；覆盖时保留原来的排队位置。
    pub async fn enqueue(
        &self,
        record: ParticipantRecord,
        registry: &ApprovedRegistry,
    ) -> EnqueueOutcome {
        let mut state = self.state.write().await;

        if let Ok(approved) = registry.lookup(&record.identifier).await {
            return EnqueueOutcome::AlreadyApproved(approved);
        }

        let identifier = record.identifier.clone();
        let position = match state.entries.remove(&identifier) {
            Some(previous) => {
                state.unindex(&previous.record.display_name, &identifier);
                previous.position
            }
            None => {
                let position = state.next_position;
                state.next_position += 1;
                position
            }
        };

        state
            .by_display_name
            .entry(record.display_name.clone())
            .or_default()
            .insert(identifier.clone());
        state.entries.insert(
            identifier,
            PendingEntry {
                position,
                record: record.clone(),
            },
        );

        EnqueueOutcome::Queued(record)
    }

    /// 把记录从队列移入已批准名单。
    ///
    /// 整个过程持有队列写锁，同一标识的并发批准只有一个能成功，
    /// 其余都会得到 `NotFound`。
    pub async fn approve_into(
        &self,
        identifier: &ParticipantId,
        registry: &ApprovedRegistry,
    ) -> DomainResult<ParticipantRecord> {
        let mut state = self.state.write().await;

        let entry = state
            .entries
            .remove(identifier)
            .ok_or_else(|| DomainError::not_found("pending_request", identifier.as_str()))?;
        state.unindex(&entry.record.display_name, identifier);

        registry.insert(entry.record.clone()).await;
        Ok(entry.record)
    }

    pub async fn contains(&self, identifier: &ParticipantId) -> bool {
        self.state.read().await.entries.contains_key(identifier)
    }

    pub async fn is_waiting(&self, display_name: &str) -> bool {
        let Ok(display_name) = DisplayName::parse(display_name) else {
            return false;
        };
        self.state
            .read()
            .await
            .by_display_name
            .contains_key(&display_name)
    }

    /// 按首次入队顺序返回快照
    pub async fn list(&self) -> Vec<ParticipantRecord> {
        let state = self.state.read().await;
        let mut entries: Vec<&PendingEntry> = state.entries.values().collect();
        entries.sort_by_key(|entry| entry.position);
        entries.into_iter().map(|entry| entry.record.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Role, Timestamp};

    fn record(id: &str, name: &str) -> ParticipantRecord {
        ParticipantRecord::new(
            ParticipantId::parse(id).unwrap(),
            DisplayName::parse(name).unwrap(),
            Role::User,
            Timestamp::parse("2024-01-01 09:00:00").unwrap(),
        )
    }

    #[tokio::test]
    async fn overwrite_keeps_position_and_reindexes_name() {
        let queue = RequestQueue::new();
        let registry = ApprovedRegistry::new();

        queue.enqueue(record("alice", "Alice"), &registry).await;
        queue.enqueue(record("bob", "Bob"), &registry).await;
        queue.enqueue(record("alice", "Alicia"), &registry).await;

        let listed: Vec<String> = queue
            .list()
            .await
            .into_iter()
            .map(|r| r.display_name.to_string())
            .collect();
        assert_eq!(listed, vec!["Alicia", "Bob"]);
        assert!(!queue.is_waiting("Alice").await);
        assert!(queue.is_waiting("Alicia").await);
    }

    #[tokio::test]
    async fn shared_display_name_stays_waiting_until_last_is_approved() {
        let queue = RequestQueue::new();
        let registry = ApprovedRegistry::new();
        queue.enqueue(record("u1", "Sam"), &registry).await;
        queue.enqueue(record("u2", "Sam"), &registry).await;

        queue
            .approve_into(&ParticipantId::parse("u1").unwrap(), &registry)
            .await
            .unwrap();
        assert!(queue.is_waiting("Sam").await);

        queue
            .approve_into(&ParticipantId::parse("u2").unwrap(), &registry)
            .await
            .unwrap();
        assert!(!queue.is_waiting("Sam").await);
    }

    #[tokio::test]
    async fn approve_moves_record_exactly_once() {
        let queue = RequestQueue::new();
        let registry = ApprovedRegistry::new();
        let alice = ParticipantId::parse("alice").unwrap();
        queue.enqueue(record("alice", "Alice"), &registry).await;

        let moved = queue.approve_into(&alice, &registry).await.unwrap();
        assert_eq!(moved.display_name.as_str(), "Alice");
        assert!(!queue.contains(&alice).await);
        assert!(registry.contains(&alice).await);

        let second = queue.approve_into(&alice, &registry).await;
        assert!(matches!(second, Err(DomainError::NotFound { .. })));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn approved_identifier_is_not_requeued() {
        let queue = RequestQueue::new();
        let registry = ApprovedRegistry::new();
        let alice = ParticipantId::parse("alice").unwrap();
        queue.enqueue(record("alice", "Alice"), &registry).await;
        queue.approve_into(&alice, &registry).await.unwrap();

        let outcome = queue.enqueue(record("alice", "Alice"), &registry).await;
        assert!(matches!(outcome, EnqueueOutcome::AlreadyApproved(_)));
        assert!(queue.is_empty().await);
    }
}
